//! Minimal LaTeX tokenizer
//!
//! Understands just enough syntax to find macro invocations reliably: comments,
//! escaped characters, optional `[...]` arguments and balanced `{...}` groups.

use std::iter::Peekable;
use std::str::CharIndices;

/// A macro invocation with its first mandatory argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroCall {
    /// Macro name without the backslash or a trailing `*`
    pub name: String,
    /// Raw text between the braces of the first mandatory argument
    pub argument: String,
}

/// Removes `%` comments, leaving escaped `\%` intact
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let mut escaped = false;
        let mut cut = None;
        for (i, c) in line.char_indices() {
            match c {
                '\\' => escaped = !escaped,
                '%' if !escaped => {
                    cut = Some(i);
                    break;
                }
                _ => escaped = false,
            }
        }
        match cut {
            Some(i) => {
                out.push_str(&line[..i]);
                if line.ends_with('\n') {
                    out.push('\n');
                }
            }
            None => out.push_str(line),
        }
    }
    out
}

/// Finds every invocation of the named macros that has a well-formed argument
///
/// Starred forms match their base name. An argument whose braces never close is
/// dropped rather than guessed at.
pub fn scan_macros(text: &str, names: &[&str]) -> Vec<MacroCall> {
    let cleaned = strip_comments(text);
    let mut calls = Vec::new();
    let mut chars = cleaned.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '\\' {
            continue;
        }

        let name = read_command_name(&mut chars);
        if name.is_empty() {
            // Escaped character such as `\{` or `\\`
            chars.next();
            continue;
        }

        let base = name.trim_end_matches('*');
        if !names.contains(&base) {
            continue;
        }

        skip_whitespace(&mut chars);
        while chars.peek().is_some_and(|(_, c)| *c == '[') {
            if !skip_group(&mut chars, '[', ']') {
                break;
            }
            skip_whitespace(&mut chars);
        }

        if chars.peek().is_some_and(|(_, c)| *c == '{') {
            if let Some(argument) = read_group(&cleaned, &mut chars) {
                calls.push(MacroCall {
                    name: base.to_string(),
                    argument,
                });
            }
        }
    }

    calls
}

fn read_command_name(chars: &mut Peekable<CharIndices<'_>>) -> String {
    let mut name = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if c.is_ascii_alphabetic() || (c == '@' && !name.is_empty()) {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if !name.is_empty() && chars.peek().is_some_and(|(_, c)| *c == '*') {
        name.push('*');
        chars.next();
    }
    name
}

fn skip_whitespace(chars: &mut Peekable<CharIndices<'_>>) {
    while chars.peek().is_some_and(|(_, c)| c.is_whitespace()) {
        chars.next();
    }
}

/// Skips a bracketed group starting at the next character; false when unbalanced
fn skip_group(chars: &mut Peekable<CharIndices<'_>>, open: char, close: char) -> bool {
    let mut depth = 0usize;
    while let Some((_, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            c if c == open => depth += 1,
            c if c == close => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// Reads a balanced `{...}` group and returns its inner text
fn read_group(text: &str, chars: &mut Peekable<CharIndices<'_>>) -> Option<String> {
    let (open_idx, _) = chars.next()?;
    let mut depth = 1usize;
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[open_idx + 1..i].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

const DROPPED_COMMANDS: [&str; 4] = ["thanks", "footnote", "label", "protect"];
const ACCENTS: [char; 7] = ['\'', '"', '^', '`', '~', '=', '.'];

/// Accent, then pairs of base letter and composed letter
const ACCENT_TABLE: [(char, &str); 13] = [
    ('\'', "aáeéiíoóuúyýAÁEÉIÍOÓUÚYÝcćCĆnńNŃsśSŚzźZŹlĺLĹrŕRŔ"),
    ('`', "aàeèiìoòuùAÀEÈIÌOÒUÙ"),
    ('^', "aâeêiîoôuûAÂEÊIÎOÔUÛcĉCĈgĝGĜhĥHĤjĵJĴsŝSŜwŵWŴyŷYŶ"),
    ('"', "aäeëiïoöuüyÿAÄEËIÏOÖUÜYŸ"),
    ('~', "aãoõnñiĩuũAÃOÕNÑIĨUŨ"),
    ('=', "aāeēiīoōuūAĀEĒIĪOŌUŪ"),
    ('.', "zżZŻeėEĖIİgġGĠcċCĊ"),
    ('c', "cçCÇsşSŞtţTŢgģGĢkķKĶlļLĻnņNŅrŗRŖ"),
    ('v', "cčCČsšSŠzžZŽrřRŘeěEĚnňNŇdďDĎtťTŤ"),
    ('u', "aăAĂgğGĞuŭUŬ"),
    ('H', "oőOŐuűUŰ"),
    ('r', "aåAÅuůUŮ"),
    ('k', "aąAĄeęEĘ"),
];

/// Letter commands that stand for a single character
const LETTER_COMMANDS: [(&str, &str); 13] = [
    ("ss", "ß"),
    ("o", "ø"),
    ("O", "Ø"),
    ("ae", "æ"),
    ("AE", "Æ"),
    ("oe", "œ"),
    ("OE", "Œ"),
    ("aa", "å"),
    ("AA", "Å"),
    ("l", "ł"),
    ("L", "Ł"),
    ("i", "ı"),
    ("j", "ȷ"),
];

fn compose(accent: char, base: char) -> char {
    ACCENT_TABLE
        .iter()
        .find(|(a, _)| *a == accent)
        .and_then(|(_, pairs)| {
            let pairs: Vec<char> = pairs.chars().collect();
            pairs.chunks(2).find(|p| p[0] == base).map(|p| p[1])
        })
        .unwrap_or(base)
}

fn letter_accent(name: &str) -> Option<char> {
    match name {
        "c" | "v" | "u" | "H" | "r" | "k" => name.chars().next(),
        _ => None,
    }
}

/// Reads the accented letter: `e`, `{e}` or `{\i}`
fn read_accent_base(chars: &mut Peekable<CharIndices<'_>>) -> Option<char> {
    let braced = chars.peek().is_some_and(|(_, c)| *c == '{');
    if braced {
        chars.next();
        skip_whitespace(chars);
    }

    let base = match chars.next() {
        Some((_, '}')) if braced => return None,
        Some((_, '\\')) => {
            let name = read_command_name(chars);
            match name.as_str() {
                "i" => Some('i'),
                "j" => Some('j'),
                _ => name.chars().next(),
            }
        }
        Some((_, c)) => Some(c),
        None => None,
    };

    if braced {
        skip_whitespace(chars);
        if chars.peek().is_some_and(|(_, c)| *c == '}') {
            chars.next();
        }
    }
    base
}

/// Converts a LaTeX fragment to plain text
///
/// Formatting commands are unwrapped, `\thanks` and `\footnote` are dropped with
/// their argument, `\\` and `~` become spaces, accent commands are composed into
/// the accented letter and whitespace is collapsed.
pub fn latex_to_text(fragment: &str) -> String {
    let cleaned = strip_comments(fragment);
    let mut out = String::with_capacity(cleaned.len());
    let mut chars = cleaned.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        match c {
            '\\' => {
                let name = read_command_name(&mut chars);
                if name.is_empty() {
                    match chars.next() {
                        Some((_, '\\')) => {
                            out.push(' ');
                            skip_whitespace(&mut chars);
                            if chars.peek().is_some_and(|(_, c)| *c == '[') {
                                skip_group(&mut chars, '[', ']');
                            }
                        }
                        Some((_, a)) if ACCENTS.contains(&a) => {
                            if let Some(base) = read_accent_base(&mut chars) {
                                out.push(compose(a, base));
                            }
                        }
                        Some((_, ',')) => out.push(' '),
                        Some((_, other)) => out.push(other),
                        None => {}
                    }
                } else if let Some(accent) = letter_accent(&name) {
                    skip_whitespace(&mut chars);
                    if let Some(base) = read_accent_base(&mut chars) {
                        out.push(compose(accent, base));
                    }
                } else if let Some((_, letter)) = LETTER_COMMANDS.iter().find(|(n, _)| *n == name) {
                    out.push_str(letter);
                    skip_whitespace(&mut chars);
                } else if DROPPED_COMMANDS.contains(&name.trim_end_matches('*')) {
                    skip_whitespace(&mut chars);
                    if chars.peek().is_some_and(|(_, c)| *c == '[') {
                        skip_group(&mut chars, '[', ']');
                    }
                    if chars.peek().is_some_and(|(_, c)| *c == '{') {
                        skip_group(&mut chars, '{', '}');
                    }
                } else if chars.peek().is_some_and(|(_, c)| c.is_whitespace()) {
                    // `\LaTeX rules` keeps its word gap
                    out.push(' ');
                }
            }
            '{' | '}' | '$' => {}
            '~' => out.push(' '),
            c => out.push(c),
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_comments() {
        assert_eq!(
            strip_comments("a % note\n50\\% off\n%full\n"),
            "a \n50\\% off\n\n"
        );
    }

    #[test]
    fn test_scan_finds_macro_arguments() {
        let text = "\\title[Short]{A {Nested} Title}\n\\bibliography{refs, more}";
        let calls = scan_macros(text, &["title", "bibliography"]);

        assert_eq!(
            calls,
            vec![
                MacroCall {
                    name: "title".into(),
                    argument: "A {Nested} Title".into()
                },
                MacroCall {
                    name: "bibliography".into(),
                    argument: "refs, more".into()
                },
            ]
        );
    }

    #[test]
    fn test_scan_ignores_comments_and_lookalikes() {
        let text = "% \\title{Old}\n\\titlepage\n\\bibliographystyle{plain}\n\\title*{New}";
        let calls = scan_macros(text, &["title", "bibliography"]);

        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].argument, "New");
    }

    #[test]
    fn test_scan_skips_escaped_braces() {
        let calls = scan_macros("\\title{Sets \\{a\\} and b}", &["title"]);
        assert_eq!(calls[0].argument, "Sets \\{a\\} and b");
    }

    #[test]
    fn test_scan_drops_unbalanced_argument() {
        assert!(scan_macros("\\title{Never closed", &["title"]).is_empty());
    }

    #[test]
    fn test_comment_inside_argument() {
        let calls = scan_macros("\\title{Deep % draft name\n Learning}", &["title"]);
        assert_eq!(latex_to_text(&calls[0].argument), "Deep Learning");
    }

    #[test]
    fn test_latex_to_text() {
        assert_eq!(
            latex_to_text("Attention Is\\\\ \\textbf{All} You~Need\\thanks{Funded by X}"),
            "Attention Is All You Need"
        );
        assert_eq!(latex_to_text("Caf\\'e \\& Bar"), "Café & Bar");
        assert_eq!(latex_to_text("{\\em The {BERT} Model}"), "The BERT Model");
    }

    #[test]
    fn test_accents_are_composed() {
        assert_eq!(latex_to_text("M{\\\"u}ller"), "Müller");
        assert_eq!(latex_to_text("G\\\"{o}del and Erd\\H{o}s"), "Gödel and Erdős");
        assert_eq!(latex_to_text("\\v{S}koda, Fran\\c cois"), "Škoda, François");
        assert_eq!(latex_to_text("Mart\\'{\\i}nez"), "Martínez");
        assert_eq!(latex_to_text("Stra\\ss e, Bj\\o rn, \\AA{}ngstr\\\"om"), "Straße, Bjørn, Ångström");
    }

    #[test]
    fn test_unknown_accent_keeps_base_letter() {
        assert_eq!(latex_to_text("\\\"x \\'{}"), "x");
        assert_eq!(latex_to_text("a\\,b"), "a b");
    }
}
