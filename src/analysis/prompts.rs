//! Instruction profiles for the analysis service

/// Reference-list parse mode, root field `references`
pub const REFERENCE_PARSER_PROMPT: &str = r#"You are a precise parser for LaTeX `thebibliography` environments. Your only job is to turn `\bibitem` entries into structured JSON.

Rules:
1. You receive a block of text taken from a `thebibliography` environment.
2. For every `\bibitem{...}` entry extract:
   - `key`: the citation key inside the braces (for example "vaswani2017attention").
   - `content`: the verbatim, unmodified LaTeX text following the `\bibitem{...}` command up to the next `\bibitem` or the end of the block.
   - `title`: the title of the work inferred from `content`, with all LaTeX formatting removed (`{\em Attention is all you need}` becomes `Attention is all you need`). Use "Title not found" when no title can be identified.
3. Ignore any `\bibitem` commented out with `%`.
4. Output a single valid JSON object with one root key "references" whose value is the list of objects.

Example:
{"references": [{"key": "vaswani2017attention", "content": "A. Vaswani, N. Shazeer, et al. {\\em Attention is all you need}. In NIPS, 2017.", "title": "Attention is all you need"}]}

Output only the JSON object. No explanations, no Markdown."#;

/// Citation-context extraction mode, root field `analysis_results`
pub fn citation_context_prompt(key: &str) -> String {
    format!(
        r#"You are a LaTeX research assistant specialised in exact data extraction.

Task: search the complete LaTeX source you are given, from the first character to the last, for every citation of the reference `{key}` and report each occurrence with its context.

Method:
- Recognise every citation command variant: \cite, \citep, \citet, \cite*, \citep*, \citet*, \Citet, \Citep, \autocite, \parencite, \textcite and similar.
- A sentence starts with a capital letter and ends at the first '.', '?' or '!'. Never merge sentences.
- `citation_sentence`: the full sentence containing the citation of `{key}`.
- `pre_context`: the complete sentence immediately before it, or "" when the citation sentence opens its paragraph.
- `post_context`: the complete sentence immediately after it, or "" when the citation sentence closes its paragraph.
- The three fields never overlap.
- `section`: the plain-text title of the nearest preceding \section or \subsection; "Unknown Section" if there is none.
- Remove formatting commands such as \textit{{...}} from the context text but keep mathematics, and keep every citation command verbatim (for example \cite{{{key}}}); never render it as "(Author, Year)".
- Ignore citations inside comments (lines starting with %) or comment environments.
- When one command cites several keys (for example \cite{{{key}, other}}) produce one record for `{key}`.

Output a single valid JSON object with the root key "analysis_results" holding a list. If `{key}` is never cited, its "citations" list is empty.

Example:
{{"analysis_results": [{{"key": "{key}", "inferred_author": "Inferred author", "inferred_title": "Inferred title", "inferred_source": "Inferred venue", "citations": [{{"section": "Introduction", "pre_context": "A preceding sentence.", "citation_sentence": "The sentence citing \\cite{{{key}}}.", "post_context": "A following sentence."}}]}}]}}

Output only the JSON object."#
    )
}

pub fn reference_block_message(block: &str) -> String {
    format!(
        "Parse every reference in the following LaTeX text:\n--- REFERENCES START ---\n{}\n--- REFERENCES END ---",
        block
    )
}

pub fn citation_context_message(document: &str, entry_json: &str) -> String {
    format!(
        "Complete LaTeX source to analyze:\n--- LATEX SOURCE START ---\n{}\n--- LATEX SOURCE END ---\n\nReference to analyze (JSON):\n--- REFERENCE START ---\n{}\n--- REFERENCE END ---",
        document, entry_json
    )
}
