//! BibTeX reader
//!
//! Handles `@type{key, field = value, ...}` with brace or parenthesis delimiters,
//! `{...}`/`"..."`/number/macro values joined by `#`, `@string` definitions and the
//! standard month abbreviations. `@comment` and `@preamble` are skipped. A malformed
//! entry is reported and skipped without affecting its neighbours.

use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibtexEntry {
    pub entry_type: String,
    pub key: String,
    /// Field names are lowercased; values keep their inner markup
    pub fields: Vec<(String, String)>,
    /// The entry exactly as written in the source
    pub raw: String,
}

impl BibtexEntry {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

const MONTHS: [(&str, &str); 12] = [
    ("jan", "January"),
    ("feb", "February"),
    ("mar", "March"),
    ("apr", "April"),
    ("may", "May"),
    ("jun", "June"),
    ("jul", "July"),
    ("aug", "August"),
    ("sep", "September"),
    ("oct", "October"),
    ("nov", "November"),
    ("dec", "December"),
];

type ParseResult<T> = Result<T, &'static str>;

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8, what: &'static str) -> ParseResult<()> {
        self.skip_ws();
        if self.bump() == Some(byte) {
            Ok(())
        } else {
            Err(what)
        }
    }

    fn read_ident(&mut self) -> &'a str {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b"_-:.+/'".contains(&b))
        {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    /// Reads `{...}` starting at the opening brace and returns the inner text
    fn read_braced(&mut self) -> ParseResult<&'a str> {
        self.expect(b'{', "expected '{'")?;
        let start = self.pos;
        let mut depth = 1usize;
        while let Some(b) = self.bump() {
            match b {
                b'\\' => {
                    self.bump();
                }
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(&self.src[start..self.pos - 1]);
                    }
                }
                _ => {}
            }
        }
        Err("unbalanced braces")
    }

    /// Reads `"..."`; quotes nested in braces do not terminate the value
    fn read_quoted(&mut self) -> ParseResult<&'a str> {
        self.expect(b'"', "expected '\"'")?;
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(b) = self.bump() {
            match b {
                b'\\' => {
                    self.bump();
                }
                b'{' => depth += 1,
                b'}' => depth = depth.saturating_sub(1),
                b'"' if depth == 0 => return Ok(&self.src[start..self.pos - 1]),
                _ => {}
            }
        }
        Err("unterminated quoted value")
    }

    /// Skips a balanced group opened by `open`, used for @comment and @preamble
    fn skip_group(&mut self, open: u8, close: u8) -> ParseResult<()> {
        let mut depth = 0usize;
        while let Some(b) = self.bump() {
            if b == open {
                depth += 1;
            } else if b == close {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(());
                }
            }
        }
        Err("unbalanced group")
    }
}

struct Parser<'a> {
    cursor: Cursor<'a>,
    macros: HashMap<String, String>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        let macros = MONTHS
            .iter()
            .map(|(abbr, name)| (abbr.to_string(), name.to_string()))
            .collect();
        Self {
            cursor: Cursor { src, pos: 0 },
            macros,
        }
    }

    fn value(&mut self) -> ParseResult<String> {
        let mut value = String::new();
        loop {
            self.cursor.skip_ws();
            match self.cursor.peek() {
                Some(b'{') => value.push_str(self.cursor.read_braced()?),
                Some(b'"') => value.push_str(self.cursor.read_quoted()?),
                Some(b) if b.is_ascii_alphanumeric() => {
                    let ident = self.cursor.read_ident();
                    match self.macros.get(&ident.to_lowercase()) {
                        Some(expanded) => value.push_str(expanded),
                        None => value.push_str(ident),
                    }
                }
                _ => return Err("expected field value"),
            }

            self.cursor.skip_ws();
            if self.cursor.peek() == Some(b'#') {
                self.cursor.bump();
            } else {
                return Ok(value);
            }
        }
    }

    fn string_definition(&mut self, close: u8) -> ParseResult<()> {
        self.cursor.skip_ws();
        let name = self.cursor.read_ident().to_lowercase();
        if name.is_empty() {
            return Err("missing @string name");
        }
        self.cursor.expect(b'=', "expected '=' in @string")?;
        let value = self.value()?;
        self.cursor.expect(close, "unterminated @string")?;
        self.macros.insert(name, value);
        Ok(())
    }

    fn entry(&mut self, entry_type: &str, start: usize, close: u8) -> ParseResult<BibtexEntry> {
        self.cursor.skip_ws();
        let key_start = self.cursor.pos;
        while self
            .cursor
            .peek()
            .is_some_and(|b| b != b',' && b != close && !b.is_ascii_whitespace())
        {
            self.cursor.pos += 1;
        }
        let key = self.cursor.src[key_start..self.cursor.pos].to_string();
        if key.is_empty() {
            return Err("missing citation key");
        }

        let mut fields = Vec::new();
        loop {
            self.cursor.skip_ws();
            match self.cursor.peek() {
                Some(b',') => {
                    self.cursor.bump();
                }
                Some(b) if b == close => {
                    self.cursor.bump();
                    break;
                }
                Some(_) => {
                    let name = self.cursor.read_ident().to_lowercase();
                    if name.is_empty() {
                        return Err("expected field name");
                    }
                    self.cursor.expect(b'=', "expected '=' after field name")?;
                    let value = self.value()?;
                    fields.push((name, value));
                }
                None => return Err("unexpected end of input"),
            }
        }

        Ok(BibtexEntry {
            entry_type: entry_type.to_lowercase(),
            key,
            fields,
            raw: self.cursor.src[start..self.cursor.pos].to_string(),
        })
    }

    fn parse(mut self) -> Vec<BibtexEntry> {
        let mut entries = Vec::new();

        while let Some(offset) = self.cursor.src[self.cursor.pos..].find('@') {
            let start = self.cursor.pos + offset;
            self.cursor.pos = start + 1;

            self.cursor.skip_ws();
            let entry_type = self.cursor.read_ident().to_lowercase();
            if entry_type.is_empty() {
                continue;
            }

            self.cursor.skip_ws();
            let close = match self.cursor.peek() {
                Some(b'{') => b'}',
                Some(b'(') => b')',
                _ => continue,
            };

            let result = match entry_type.as_str() {
                "comment" | "preamble" => {
                    let open = if close == b'}' { b'{' } else { b'(' };
                    self.cursor.skip_group(open, close).map(|_| None)
                }
                "string" => {
                    self.cursor.bump();
                    self.string_definition(close).map(|_| None)
                }
                _ => {
                    self.cursor.bump();
                    self.entry(&entry_type, start, close).map(Some)
                }
            };

            match result {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                Err(reason) => {
                    let line = self.cursor.src[..start].matches('\n').count() + 1;
                    warn!(line, reason, "Skipping malformed BibTeX entry");
                    self.cursor.pos = start + 1;
                }
            }
        }

        entries
    }
}

pub fn parse_bibtex(input: &str) -> Vec<BibtexEntry> {
    Parser::new(input).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_entries() {
        let input = r#"
@article{a2020,
  title = {Foo},
  author = "Doe, Jane and Roe, Rick",
  year = 2020,
}

@inproceedings{b2021, title={Bar {BAZ}}, booktitle={Proc.}}
"#;
        let entries = parse_bibtex(input);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key, "a2020");
        assert_eq!(entries[0].entry_type, "article");
        assert_eq!(entries[0].field("title"), Some("Foo"));
        assert_eq!(entries[0].field("author"), Some("Doe, Jane and Roe, Rick"));
        assert_eq!(entries[0].field("year"), Some("2020"));
        assert!(entries[0].raw.starts_with("@article{a2020,"));
        assert!(entries[0].raw.ends_with('}'));
        assert_eq!(entries[1].field("title"), Some("Bar {BAZ}"));
    }

    #[test]
    fn test_string_macros_and_concatenation() {
        let input = r#"
@string{ieee = "IEEE Transactions on"}
@STRING(pami = ieee # " Pattern Analysis")
@article{k, journal = pami, month = jan, note = "Vol. " # "3"}
"#;
        let entries = parse_bibtex(input);

        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].field("journal"),
            Some("IEEE Transactions on Pattern Analysis")
        );
        assert_eq!(entries[0].field("month"), Some("January"));
        assert_eq!(entries[0].field("note"), Some("Vol. 3"));
    }

    #[test]
    fn test_comments_and_preamble_are_skipped() {
        let input = r#"
@comment{ @article{hidden, title={No}} }
@preamble{"\newcommand{\noop}[1]{}"}
Some free text with an email@example.com inside.
@misc(paren, title = {Parenthesized})
"#;
        let entries = parse_bibtex(input);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "paren");
        assert_eq!(entries[0].field("title"), Some("Parenthesized"));
    }

    #[test]
    fn test_malformed_entry_does_not_poison_neighbours() {
        let input = r#"
@article{broken, title = {Unclosed, year = 2020
@article{ok, title = {Fine}}
"#;
        let entries = parse_bibtex(input);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "ok");
    }

    #[test]
    fn test_quoted_value_with_braced_quote() {
        let entries = parse_bibtex(r#"@misc{q, title = "The {"}Best{"} Paper"}"#);
        assert_eq!(entries[0].field("title"), Some(r#"The {"}Best{"} Paper"#));
    }

    #[test]
    fn test_field_names_are_case_insensitive() {
        let entries = parse_bibtex("@Book{K1, TITLE = {Upper}}");
        assert_eq!(entries[0].entry_type, "book");
        assert_eq!(entries[0].field("title"), Some("Upper"));
    }
}
