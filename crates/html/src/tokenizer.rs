//! Simplified HTML tokenizer for server-rendered form fragments.
//!
//! Supported tag-name characters (ASCII only): `[A-Za-z0-9:_-]`.
//! Attribute names additionally accept `[` `]` `.` so that widget field names used as
//! bare attributes survive.
//!
//! Known limitations (intentional):
//! - Not a full HTML tokenizer state machine: malformed input is recovered leniently.
//! - Raw/escapable-raw close-tag scanning accepts only ASCII whitespace before `>`.
use crate::entities::decode_entities;
use crate::types::Token;
use memchr::memchr;

const HTML_COMMENT_START: &str = "<!--";
const HTML_COMMENT_END: &str = "-->";

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.len() >= start + needle.len()
        && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle)
}

/// Elements whose content is not tokenized as markup.
///
/// `script`/`style` content is kept verbatim; `textarea`/`title` content has entities decoded.
fn raw_content_kind(name: &str) -> Option<(&'static [u8], bool)> {
    match name {
        "script" => Some((b"</script", false)),
        "style" => Some((b"</style", false)),
        "textarea" => Some((b"</textarea", true)),
        "title" => Some((b"</title", true)),
        _ => None,
    }
}

// it only attempts matches starting at ASCII <
// < cannot appear in UTF-8 continuation bytes
fn find_raw_close_tag(haystack: &str, close_tag: &[u8]) -> Option<(usize, usize)> {
    let hay = haystack.as_bytes();
    let len = hay.len();
    let n = close_tag.len();
    debug_assert!(close_tag.starts_with(b"</"));
    let mut i = 0;
    while i + n <= len {
        let rel = memchr(b'<', &hay[i..])?;
        i += rel;
        if i + n > len {
            return None;
        }
        if starts_with_ignore_ascii_case_at(hay, i, close_tag) {
            let mut k = i + n;
            while k < len && hay[k].is_ascii_whitespace() {
                k += 1;
            }
            if k < len && hay[k] == b'>' {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

pub(crate) fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_tag_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'_' || c == b':'
}

fn is_attr_name_char(c: u8) -> bool {
    is_tag_name_char(c) || c == b'[' || c == b']' || c == b'.'
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut i = 0;
    // Invariant: slice endpoints are only cut at ASCII structural bytes, so they stay
    // on UTF-8 char boundaries.
    while i < len {
        if bytes[i] != b'<' {
            let start = i;
            i = memchr(b'<', &bytes[i..]).map_or(len, |rel| i + rel);
            let decoded = decode_entities(&input[start..i]);
            if !decoded.is_empty() {
                out.push(Token::Text(decoded));
            }
            continue;
        }
        if input[i..].starts_with(HTML_COMMENT_START) {
            let body_start = i + HTML_COMMENT_START.len();
            match input[body_start..].find(HTML_COMMENT_END) {
                Some(end) => {
                    out.push(Token::Comment(input[body_start..body_start + end].to_string()));
                    i = body_start + end + HTML_COMMENT_END.len();
                    continue;
                }
                None => {
                    out.push(Token::Comment(input[body_start..].to_string()));
                    break;
                }
            }
        }
        if starts_with_ignore_ascii_case_at(bytes, i, b"<!doctype") {
            let rest = &input[i + 2..];
            let Some(end) = rest.find('>') else {
                break;
            };
            out.push(Token::Doctype(rest[..end].trim().to_string()));
            i += 2 + end + 1;
            continue;
        }
        // end tag?
        if i + 1 < len && bytes[i + 1] == b'/' {
            let start = i + 2;
            let mut j = start;
            while j < len && is_tag_name_char(bytes[j]) {
                j += 1;
            }
            let name = input[start..j].to_ascii_lowercase();
            while j < len && bytes[j] != b'>' {
                j += 1;
            }
            if j < len {
                j += 1;
            }
            if !name.is_empty() {
                out.push(Token::EndTag(name));
            }
            i = j;
            continue;
        }
        // start tag
        let start = i + 1;
        let mut j = start;
        while j < len && is_tag_name_char(bytes[j]) {
            j += 1;
        }
        if j == start {
            // A lone '<' is text.
            out.push(Token::Text("<".to_string()));
            i += 1;
            continue;
        }
        let name = input[start..j].to_ascii_lowercase();
        let mut k = j;
        let mut attributes: Vec<(String, Option<String>)> = Vec::new();
        let mut self_closing = false;

        let skip_whitespace = |k: &mut usize| {
            while *k < len && bytes[*k].is_ascii_whitespace() {
                *k += 1;
            }
        };

        loop {
            skip_whitespace(&mut k);
            if k >= len {
                break;
            }
            if bytes[k] == b'>' {
                k += 1;
                break;
            }
            if bytes[k] == b'/' {
                if k + 1 < len && bytes[k + 1] == b'>' {
                    self_closing = true;
                    k += 2;
                    break;
                }
                k += 1;
                continue;
            }
            let name_start = k;
            while k < len && is_attr_name_char(bytes[k]) {
                k += 1;
            }
            if name_start == k {
                k += 1;
                continue;
            }
            let attribute_name = input[name_start..k].to_ascii_lowercase();

            skip_whitespace(&mut k);
            let value = if k < len && bytes[k] == b'=' {
                k += 1;
                skip_whitespace(&mut k);
                if k < len && (bytes[k] == b'"' || bytes[k] == b'\'') {
                    let quote = bytes[k];
                    k += 1;
                    let vstart = k;
                    k = memchr(quote, &bytes[k..]).map_or(len, |rel| k + rel);
                    let raw = &input[vstart..k];
                    if k < len {
                        k += 1;
                    }
                    Some(decode_entities(raw))
                } else {
                    let vstart = k;
                    while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                        if bytes[k] == b'/' && k + 1 < len && bytes[k + 1] == b'>' {
                            break;
                        }
                        k += 1;
                    }
                    Some(decode_entities(&input[vstart..k]))
                }
            } else {
                None
            };
            attributes.push((attribute_name, value));
        }
        if is_void_element(&name) {
            self_closing = true;
        }

        let raw = if self_closing {
            None
        } else {
            raw_content_kind(&name)
        };
        out.push(Token::StartTag {
            name: name.clone(),
            attributes,
            self_closing,
        });

        if let Some((close_tag, decode)) = raw {
            let (body, next) = match find_raw_close_tag(&input[k..], close_tag) {
                Some((rel_start, rel_end)) => (&input[k..k + rel_start], Some(k + rel_end)),
                // Missing close tag: the remainder is raw content with an implicit end tag.
                None => (&input[k..], None),
            };
            if !body.is_empty() {
                let text = if decode {
                    decode_entities(body)
                } else {
                    body.to_string()
                };
                out.push(Token::Text(text));
            }
            out.push(Token::EndTag(name));
            match next {
                Some(next) => {
                    i = next;
                    continue;
                }
                None => break,
            }
        }

        i = k;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_preserves_utf8_text_nodes() {
        let tokens = tokenize("<p>120×32</p>");
        assert!(
            tokens
                .iter()
                .any(|t| matches!(t, Token::Text(s) if s == "120×32")),
            "expected UTF-8 text token, got: {tokens:?}"
        );
    }

    #[test]
    fn tokenize_reads_bracketed_field_names_and_quoted_values() {
        let tokens = tokenize(r#"<input name="widget-search[-1][title]" value='Find &amp; go' disabled>"#);
        let [Token::StartTag { name, attributes, self_closing }] = tokens.as_slice() else {
            panic!("expected a single start tag, got: {tokens:?}");
        };
        assert_eq!(name, "input");
        assert!(*self_closing, "input is a void element");
        assert_eq!(
            attributes,
            &vec![
                ("name".to_string(), Some("widget-search[-1][title]".to_string())),
                ("value".to_string(), Some("Find & go".to_string())),
                ("disabled".to_string(), None),
            ]
        );
    }

    #[test]
    fn tokenize_keeps_textarea_markup_as_text() {
        let tokens = tokenize("<textarea name=t><b>bold</b> &lt;ok&gt;</TEXTAREA>");
        assert_eq!(
            tokens[1..],
            [
                Token::Text("<b>bold</b> <ok>".to_string()),
                Token::EndTag("textarea".to_string()),
            ]
        );
    }

    #[test]
    fn tokenize_finds_script_end_tag_case_insensitive() {
        let tokens = tokenize("<script>let x = 1 < 2;</ScRiPt><p>");
        assert_eq!(
            tokens,
            vec![
                Token::StartTag {
                    name: "script".to_string(),
                    attributes: Vec::new(),
                    self_closing: false,
                },
                Token::Text("let x = 1 < 2;".to_string()),
                Token::EndTag("script".to_string()),
                Token::StartTag {
                    name: "p".to_string(),
                    attributes: Vec::new(),
                    self_closing: false,
                },
            ]
        );
    }

    #[test]
    fn tokenize_handles_unterminated_comment_and_lone_angle() {
        let tokens = tokenize("a < b<!-- open");
        assert_eq!(
            tokens,
            vec![
                Token::Text("a ".to_string()),
                Token::Text("<".to_string()),
                Token::Text(" b".to_string()),
                Token::Comment(" open".to_string()),
            ]
        );
    }
}
