//! Lenient JSON pre-pass
//!
//! The config file is hand-edited, and humans leave `//` comments and
//! trailing commas behind. Rather than adopt a full relaxed-JSON grammar,
//! this module rewrites the input into strict JSON: comments are dropped
//! (keeping their newlines so line numbers in error messages stay usable)
//! and trailing commas before `]` or `}` are removed. String literals and
//! their escape sequences are respected throughout, so `"http://x"` and
//! `"\",//"` survive untouched.

/// Strip `//` line comments and `/* */` block comments outside strings.
pub fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' => match chars.peek() {
                Some('/') => {
                    // Line comment: consume to end of line, keep the newline.
                    for next in chars.by_ref() {
                        if next == '\n' {
                            out.push('\n');
                            break;
                        }
                    }
                }
                Some('*') => {
                    chars.next();
                    let mut prev = ' ';
                    for next in chars.by_ref() {
                        if prev == '*' && next == '/' {
                            break;
                        }
                        if next == '\n' {
                            out.push('\n');
                        }
                        prev = next;
                    }
                }
                _ => out.push(c),
            },
            _ => out.push(c),
        }
    }

    out
}

/// Remove commas that directly precede a closing `]` or `}` (whitespace
/// allowed in between), outside strings.
pub fn strip_trailing_commas(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                // Look ahead past whitespace for a closer.
                let mut j = i + 1;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                let trailing = matches!(chars.get(j), Some(']') | Some('}'));
                if !trailing {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Apply both lenient passes in order.
pub fn relax(input: &str) -> String {
    strip_trailing_commas(&strip_comments(input))
}
