//! Best-effort repair of malformed JSON returned by the analysis service
//!
//! Models routinely wrap JSON in Markdown fences, leave LaTeX commands unescaped
//! inside strings (`\cite{x}`), emit trailing commas, or stop mid-document when they
//! hit the token limit. [`repair_json`] fixes those cases in one linear pass and
//! never fails; the caller decodes the result again.

/// Returns the body of the first Markdown code fence, or the trimmed input
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();

    if let Some(start_idx) = trimmed.find("```json") {
        let after_fence = &trimmed[start_idx + 7..];
        if let Some(end_idx) = after_fence.find("```") {
            return after_fence[..end_idx].trim();
        }
        return after_fence.trim();
    }

    if let Some(start_idx) = trimmed.find("```") {
        let after_fence = &trimmed[start_idx + 3..];
        if let Some(end_idx) = after_fence.find("```") {
            return after_fence[..end_idx].trim();
        }
        return after_fence.trim();
    }

    trimmed
}

pub fn repair_json(input: &str) -> String {
    let body = strip_code_fence(input);
    let Some(start) = body.find(['{', '[']) else {
        return body.to_string();
    };

    let mut repairer = Repairer::default();
    let mut chars = body[start..].chars().peekable();

    while let Some(c) = chars.next() {
        if repairer.in_string {
            repairer.string_char(c, &mut chars);
        } else if repairer.structural_char(c) {
            break;
        }
    }

    repairer.finish()
}

#[derive(Default)]
struct Repairer {
    out: String,
    stack: Vec<char>,
    in_string: bool,
    string_is_key: bool,
    pending_key: bool,
    last_structural: Option<char>,
}

impl Repairer {
    fn string_char(&mut self, c: char, chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
        match c {
            '\\' => self.escape(chars),
            '"' => {
                if closes_string(chars.clone()) {
                    self.out.push('"');
                    self.in_string = false;
                    self.pending_key = self.string_is_key;
                    self.last_structural = Some('"');
                } else {
                    self.out.push_str("\\\"");
                }
            }
            '\n' => self.out.push_str("\\n"),
            '\r' => self.out.push_str("\\r"),
            '\t' => self.out.push_str("\\t"),
            c if (c as u32) < 0x20 => self.out.push_str(&format!("\\u{:04x}", c as u32)),
            c => self.out.push(c),
        }
    }

    fn escape(&mut self, chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
        let Some(&next) = chars.peek() else {
            self.out.push_str("\\\\");
            return;
        };

        let valid = match next {
            '"' | '\\' | '/' => true,
            // `\textbf`, `\newblock`, `\ref`: a letter after the escape means a LaTeX command
            'b' | 'f' | 'n' | 'r' | 't' => {
                let mut lookahead = chars.clone();
                lookahead.next();
                !lookahead.peek().is_some_and(|c| c.is_ascii_alphabetic())
            }
            'u' => {
                let mut lookahead = chars.clone();
                lookahead.next();
                (0..4).all(|_| lookahead.next().is_some_and(|c| c.is_ascii_hexdigit()))
            }
            _ => false,
        };

        if valid {
            self.out.push('\\');
            self.out.push(next);
            chars.next();
        } else {
            self.out.push_str("\\\\");
        }
    }

    /// Handles one character outside a string; returns true once the top-level value closed
    fn structural_char(&mut self, c: char) -> bool {
        match c {
            '"' => {
                self.string_is_key = self.stack.last() == Some(&'}')
                    && matches!(self.last_structural, Some('{') | Some(','));
                self.in_string = true;
                self.out.push('"');
            }
            '{' | '[' => {
                self.stack.push(if c == '{' { '}' } else { ']' });
                self.out.push(c);
                self.last_structural = Some(c);
            }
            '}' | ']' => {
                if self.stack.is_empty() {
                    return false;
                }
                self.close_one();
                return self.stack.is_empty();
            }
            ':' => {
                self.pending_key = false;
                self.out.push(c);
                self.last_structural = Some(c);
            }
            c if c.is_whitespace() => self.out.push(c),
            c => {
                self.out.push(c);
                self.last_structural = Some(c);
            }
        }
        false
    }

    fn close_one(&mut self) {
        if let Some(close) = self.stack.pop() {
            drop_trailing_comma(&mut self.out);
            self.out.push(close);
            self.last_structural = Some(close);
            self.pending_key = false;
        }
    }

    fn finish(mut self) -> String {
        if self.in_string {
            self.out.push('"');
            self.pending_key = self.string_is_key;
        }

        if self.pending_key {
            self.out.push_str(": null");
        } else if self.out.trim_end().ends_with(':') {
            self.out.push_str(" null");
        }

        while !self.stack.is_empty() {
            self.close_one();
        }

        self.out
    }
}

/// An unescaped quote ends the string only when structure follows it
fn closes_string(mut rest: std::iter::Peekable<std::str::Chars<'_>>) -> bool {
    while let Some(&c) = rest.peek() {
        if c.is_whitespace() {
            rest.next();
            continue;
        }
        return matches!(c, ',' | '}' | ']' | ':');
    }
    true
}

fn drop_trailing_comma(out: &mut String) {
    let trimmed_len = out.trim_end().len();
    if out[..trimmed_len].ends_with(',') {
        out.truncate(trimmed_len - 1);
    }
}
