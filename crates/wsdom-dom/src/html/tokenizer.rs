//! Simplified HTML tokenizer.
//!
//! Tag and attribute names are ASCII `[A-Za-z0-9:_-]` (attribute names also
//! allow other non-structural characters). Raw-text elements (`script`,
//! `style`) and escapable raw-text elements (`textarea`, `title`) are scanned
//! up to their matching close tag. This is not a full HTML5 state machine: no
//! parse-error recovery beyond what the tree builder does.

use super::entities::decode_entities;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Doctype(String),
    StartTag {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    EndTag(String),
    Text(String),
    Comment(String),
}

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

pub(crate) fn is_raw_text(name: &str) -> bool {
    matches!(name, "script" | "style" | "xmp" | "iframe" | "noembed" | "noframes")
}

pub(crate) fn is_escapable_raw_text(name: &str) -> bool {
    matches!(name, "textarea" | "title")
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b':' | b'_' | b'-')
}

fn starts_with_ignore_ascii_case(haystack: &str, at: usize, needle: &str) -> bool {
    haystack
        .as_bytes()
        .get(at..at + needle.len())
        .is_some_and(|s| s.eq_ignore_ascii_case(needle.as_bytes()))
}

/// Byte offset of `</name` (case-insensitive) at or after `from`.
fn find_close_tag(input: &str, from: usize, name: &str) -> Option<usize> {
    let needle = format!("</{}", name);
    let lower = input[from..].to_ascii_lowercase();
    let mut offset = 0;
    while let Some(found) = lower[offset..].find(&needle) {
        let at = offset + found;
        let after = lower.as_bytes().get(at + needle.len()).copied();
        if after.is_none_or(|b| b == b'>' || b == b'/' || b.is_ascii_whitespace()) {
            return Some(from + at);
        }
        offset = at + needle.len();
    }
    None
}

pub(crate) fn tokenize(input: &str) -> Vec<Token> {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut out = Vec::new();
    let mut i = 0;

    // Slice endpoints are always at ASCII structural bytes, so they are
    // UTF-8 boundaries.
    while i < len {
        if bytes[i] != b'<' {
            let start = i;
            while i < len && bytes[i] != b'<' {
                i += 1;
            }
            out.push(Token::Text(decode_entities(&input[start..i])));
            continue;
        }

        if input[i..].starts_with(COMMENT_START) {
            let body_start = i + COMMENT_START.len();
            match input[body_start..].find(COMMENT_END) {
                Some(rel) => {
                    out.push(Token::Comment(input[body_start..body_start + rel].to_string()));
                    i = body_start + rel + COMMENT_END.len();
                }
                None => {
                    out.push(Token::Comment(input[body_start..].to_string()));
                    i = len;
                }
            }
            continue;
        }

        if starts_with_ignore_ascii_case(input, i, "<!doctype") {
            let end = input[i..].find('>').map_or(len, |rel| i + rel);
            let name = input[i + "<!doctype".len()..end].trim().to_string();
            out.push(Token::Doctype(name));
            i = (end + 1).min(len);
            continue;
        }

        if bytes.get(i + 1) == Some(&b'!') || bytes.get(i + 1) == Some(&b'?') {
            // Bogus comment.
            let end = input[i..].find('>').map_or(len, |rel| i + rel);
            out.push(Token::Comment(input[i + 2..end].to_string()));
            i = (end + 1).min(len);
            continue;
        }

        if bytes.get(i + 1) == Some(&b'/') {
            let name_start = i + 2;
            let mut j = name_start;
            while j < len && is_name_byte(bytes[j]) {
                j += 1;
            }
            let end = input[i..].find('>').map_or(len, |rel| i + rel);
            if j > name_start {
                out.push(Token::EndTag(input[name_start..j].to_ascii_lowercase()));
            }
            i = (end + 1).min(len);
            continue;
        }

        if bytes.get(i + 1).is_some_and(u8::is_ascii_alphabetic) {
            let (token, next) = start_tag(input, i);
            i = next;
            if let Token::StartTag {
                name, self_closing, ..
            } = &token
            {
                let raw = is_raw_text(name);
                let escapable = is_escapable_raw_text(name);
                if (raw || escapable) && !*self_closing {
                    let name = name.clone();
                    out.push(token);
                    let close = find_close_tag(input, i, &name).unwrap_or(len);
                    let content = &input[i..close];
                    if !content.is_empty() {
                        out.push(Token::Text(if raw {
                            content.to_string()
                        } else {
                            decode_entities(content)
                        }));
                    }
                    i = close;
                    continue;
                }
            }
            out.push(token);
            continue;
        }

        out.push(Token::Text("<".to_string()));
        i += 1;
    }
    out
}

/// Parse a start tag beginning at `at` (`<` followed by a letter).
fn start_tag(input: &str, at: usize) -> (Token, usize) {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut i = at + 1;
    let name_start = i;
    while i < len && is_name_byte(bytes[i]) {
        i += 1;
    }
    let name = input[name_start..i].to_ascii_lowercase();
    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut self_closing = false;

    loop {
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= len {
            break;
        }
        match bytes[i] {
            b'>' => {
                i += 1;
                break;
            }
            b'/' => {
                if bytes.get(i + 1) == Some(&b'>') {
                    self_closing = true;
                    i += 2;
                    break;
                }
                i += 1;
                continue;
            }
            _ => {}
        }

        let attr_start = i;
        while i < len
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        if i == attr_start {
            // Stray '=' without a name.
            i += 1;
            continue;
        }
        let attr_name = input[attr_start..i].to_ascii_lowercase();

        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let mut value = String::new();
        if i < len && bytes[i] == b'=' {
            i += 1;
            while i < len && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i < len && (bytes[i] == b'"' || bytes[i] == b'\'') {
                let quote = bytes[i] as char;
                let value_start = i + 1;
                let value_end = input[value_start..]
                    .find(quote)
                    .map_or(len, |rel| value_start + rel);
                value = decode_entities(&input[value_start..value_end]);
                i = (value_end + 1).min(len);
            } else {
                let value_start = i;
                while i < len && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                value = decode_entities(&input[value_start..i]);
            }
        }
        if !attrs.iter().any(|(n, _)| *n == attr_name) {
            attrs.push((attr_name, value));
        }
    }

    (
        Token::StartTag {
            name,
            attrs,
            self_closing,
        },
        i,
    )
}
