//! Best-effort repair of almost-JSON emitted by text-generation models.
//!
//! Only three defects are fixed: trailing commas, unquoted object keys, and
//! unquoted scalar values. Anything else is left for the parser to reject.

/// Apply every repair step in order.
pub(crate) fn repair(text: &str) -> String {
    quote_bare_tokens(&strip_trailing_commas(text))
}

/// Drop commas that directly precede a closing `}` or `]`.
pub(crate) fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '"' {
            let end = string_end(&chars, i);
            out.extend(&chars[i..end]);
            i = end;
            continue;
        }
        if c == ',' {
            let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                i += 1;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }
    out
}

#[derive(Clone, Copy, PartialEq)]
enum Expect {
    Key,
    Value,
    Nothing,
}

/// Wrap bare object keys and bare scalar values in double quotes.
///
/// Numbers and `true`/`false`/`null` are left as they are. A bare value runs
/// up to the next `,`, `}`, `]` or line break.
pub(crate) fn quote_bare_tokens(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 32);
    let mut containers: Vec<char> = Vec::new();
    let mut expect = Expect::Nothing;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' => {
                let end = string_end(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
                expect = Expect::Nothing;
                continue;
            }
            '{' => {
                containers.push(c);
                expect = Expect::Key;
            }
            '[' => {
                containers.push(c);
                expect = Expect::Value;
            }
            '}' | ']' => {
                containers.pop();
                expect = Expect::Nothing;
            }
            ',' => {
                expect = match containers.last() {
                    Some('{') => Expect::Key,
                    Some('[') => Expect::Value,
                    _ => Expect::Nothing,
                };
            }
            ':' => expect = Expect::Value,
            c if c.is_whitespace() => {}
            _ => match expect {
                Expect::Key => {
                    if let Some(colon) = bare_key_end(&chars, i) {
                        let key: String = chars[i..colon].iter().collect();
                        push_quoted(&mut out, key.trim_end());
                        i = colon;
                        expect = Expect::Nothing;
                        continue;
                    }
                    expect = Expect::Nothing;
                }
                Expect::Value => {
                    let end = bare_value_end(&chars, i);
                    let raw: String = chars[i..end].iter().collect();
                    let token = raw.trim_end();
                    if is_json_scalar(token) {
                        out.push_str(token);
                    } else {
                        push_quoted(&mut out, token);
                    }
                    out.push_str(&raw[token.len()..]);
                    i = end;
                    expect = Expect::Nothing;
                    continue;
                }
                Expect::Nothing => {}
            },
        }
        out.push(c);
        i += 1;
    }
    out
}

/// Index just past the string literal opening at `start`.
fn string_end(chars: &[char], start: usize) -> usize {
    let mut escaped = false;
    for (offset, &c) in chars[start + 1..].iter().enumerate() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return start + 1 + offset + 1;
        }
    }
    chars.len()
}

fn bare_key_end(chars: &[char], start: usize) -> Option<usize> {
    for (j, &c) in chars.iter().enumerate().skip(start) {
        match c {
            ':' => return Some(j),
            '{' | '}' | '[' | ']' | ',' | '"' | '\n' => return None,
            _ => {}
        }
    }
    None
}

fn bare_value_end(chars: &[char], start: usize) -> usize {
    chars
        .iter()
        .skip(start)
        .position(|c| matches!(c, ',' | '}' | ']' | '\n'))
        .map_or(chars.len(), |p| start + p)
}

fn is_json_scalar(token: &str) -> bool {
    matches!(token, "true" | "false" | "null")
        || serde_json::from_str::<serde_json::Number>(token).is_ok()
}

fn push_quoted(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_commas_removed() {
        assert_eq!(
            strip_trailing_commas("{\"a\": [1, 2, ], \"b\": 3 ,\n}"),
            "{\"a\": [1, 2 ], \"b\": 3 \n}"
        );
    }

    #[test]
    fn commas_inside_strings_kept() {
        let text = r#"{"a": "x,}"}"#;
        assert_eq!(strip_trailing_commas(text), text);
    }

    #[test]
    fn bare_keys_quoted() {
        assert_eq!(
            quote_bare_tokens("{nom: \"Colle\", prixTotal: 45}"),
            "{\"nom\": \"Colle\", \"prixTotal\": 45}"
        );
    }

    #[test]
    fn bare_values_quoted() {
        assert_eq!(
            quote_bare_tokens("{\"unite\": sac, \"quantite\": 12 m², \"ok\": true}"),
            "{\"unite\": \"sac\", \"quantite\": \"12 m²\", \"ok\": true}"
        );
    }

    #[test]
    fn bare_array_items_quoted() {
        assert_eq!(
            quote_bare_tokens("[Prévoir des cales, 3]"),
            "[\"Prévoir des cales\", 3]"
        );
    }

    #[test]
    fn valid_json_unchanged() {
        let text = r#"{"a": {"b": [1, -2.5e3, null]}, "c": "d:e"}"#;
        assert_eq!(repair(text), text);
    }

    #[test]
    fn embedded_quotes_escaped() {
        assert_eq!(
            quote_bare_tokens("{\"nom\": Plaque 13\"}"),
            "{\"nom\": \"Plaque 13\\\"\"}"
        );
    }
}
