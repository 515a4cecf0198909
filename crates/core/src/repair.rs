//! Best-effort recovery of JSON emitted by a language model.
//!
//! Model output is untrusted: it may arrive wrapped in prose or a fenced code block, and
//! it may be syntactically broken (bare keys, single quotes, trailing or missing commas,
//! truncation). [`repair`] first narrows the text to a JSON candidate, returns it untouched
//! when it already parses, and otherwise rewrites it in a single pass before parsing again.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::errors::RepairError;

const FENCE: &str = "```";

static FENCED_BLOCK: OnceLock<Regex> = OnceLock::new();

fn fenced_block() -> &'static Regex {
    FENCED_BLOCK.get_or_init(|| {
        Regex::new(r"(?s)```[\w+.-]*[ \t]*\n?(.*?)```").expect("fenced block pattern compiles")
    })
}

/// Parses `text` into a JSON value, repairing it when necessary.
///
/// When the text contains a fenced block only the first block is considered, and an empty
/// block is an error rather than an empty object. Otherwise every place a container could
/// start is tried in turn and the first one that repairs into a value wins.
pub fn repair(text: &str) -> Result<Value, RepairError> {
    let candidate = extract_candidate(text)?;
    if let Ok(value) = serde_json::from_str::<Value>(candidate) {
        return Ok(value);
    }

    let mut first_error = None;
    for start in container_starts(candidate) {
        match parse_rewritten(&candidate[start..]) {
            Ok(value) => return Ok(value),
            Err(error) => {
                first_error.get_or_insert(error);
            }
        }
    }

    match first_error {
        Some(error) => Err(error),
        None => parse_rewritten(candidate),
    }
}

/// Returns the content of the first fenced block, if the text has one.
///
/// The info string after the opening marker (`json`, `javascript`, ...) is not part of the
/// content. An unterminated fence yields everything after the opening marker.
pub fn extract_fenced(text: &str) -> Option<&str> {
    let start = text.find(FENCE)?;
    let content = match fenced_block().captures(text).and_then(|captures| captures.get(1)) {
        Some(block) => block.as_str(),
        None => {
            let rest = &text[start + FENCE.len()..];
            let info_len = rest
                .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '+' | '.' | '-')))
                .unwrap_or(rest.len());
            &rest[info_len..]
        }
    };
    Some(content.trim())
}

fn extract_candidate(text: &str) -> Result<&str, RepairError> {
    if let Some(content) = extract_fenced(text) {
        if content.is_empty() {
            return Err(RepairError::EmptyFence);
        }
        return Ok(content);
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(RepairError::EmptyInput);
    }
    Ok(trimmed)
}

fn parse_rewritten(candidate: &str) -> Result<Value, RepairError> {
    serde_json::from_str(&rewrite(candidate))
        .map_err(|error| RepairError::Malformed { reason: error.to_string() })
}

/// Byte offsets where a JSON container may begin, in the order they should be tried.
///
/// An array that closes before a later object opens reads as an aside in prose (`Found [2]
/// matches: {...}`) and is only tried after every other start.
fn container_starts(candidate: &str) -> Vec<usize> {
    let bytes = candidate.as_bytes();
    let opens = candidate.match_indices(['{', '[']).map(|(offset, _)| offset).collect::<Vec<_>>();
    let object_after =
        |end: usize| opens.iter().any(|&offset| offset > end && bytes[offset] == b'{');

    let (asides, preferred): (Vec<usize>, Vec<usize>) = opens.iter().partition(|&&start| {
        bytes[start] == b'[' && closing_offset(bytes, start).is_some_and(&object_after)
    });
    preferred.into_iter().chain(asides).collect()
}

/// Offset of the delimiter that closes the container opened at `start`, skipping quoted text.
fn closing_offset(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (offset, &byte) in bytes.iter().enumerate().skip(start) {
        if let Some(open) = quote {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                _ if byte == open => quote = None,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' | b'\'' => quote = Some(byte),
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(offset);
                }
            }
            _ => {}
        }
    }
    None
}

struct Frame {
    closer: char,
    awaiting_key: bool,
}

impl Frame {
    fn open(ch: char) -> Self {
        match ch {
            '{' => Self { closer: '}', awaiting_key: true },
            _ => Self { closer: ']', awaiting_key: false },
        }
    }

    fn is_object(&self) -> bool {
        self.closer == '}'
    }
}

fn rewrite(input: &str) -> String {
    let chars = input.chars().collect::<Vec<_>>();
    let mut out = String::with_capacity(input.len() + 8);
    let mut frames: Vec<Frame> = Vec::new();
    // Start of a key in `out` that has not yet been followed by a colon.
    let mut pending_key: Option<usize> = None;
    let mut index = 0;

    while index < chars.len() {
        let ch = chars[index];
        match ch {
            '"' | '\'' => {
                if begin_token(&mut out, &mut frames) {
                    pending_key = Some(out.len());
                }
                index = copy_string(&chars, index, &mut out);
            }
            '{' | '[' => {
                begin_token(&mut out, &mut frames);
                pending_key = None;
                frames.push(Frame::open(ch));
                out.push(ch);
                index += 1;
            }
            '}' | ']' => {
                index += 1;
                if frames.last().map(|frame| frame.closer) != Some(ch) {
                    continue;
                }
                drop_pending_key(&mut out, &mut pending_key);
                strip_trailing_comma(&mut out);
                out.push(ch);
                frames.pop();
                if frames.is_empty() {
                    break;
                }
            }
            ':' => {
                pending_key = None;
                if let Some(frame) = frames.last_mut() {
                    frame.awaiting_key = false;
                }
                out.push(ch);
                index += 1;
            }
            ',' => {
                if let Some(frame) = frames.last_mut() {
                    frame.awaiting_key = frame.is_object();
                }
                out.push(ch);
                index += 1;
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                begin_token(&mut out, &mut frames);
                let end = scan_while(&chars, index, |c| {
                    c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')
                });
                let literal = chars[index..end].iter().collect::<String>();
                out.push_str(literal.strip_prefix('+').unwrap_or(&literal));
                index = end;
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let in_key_position = begin_token(&mut out, &mut frames);
                let end = scan_while(&chars, index, |c| {
                    c.is_alphanumeric() || matches!(c, '_' | '$' | '-')
                });
                let word = chars[index..end].iter().collect::<String>();
                let is_key = in_key_position || next_significant(&chars, end) == Some(':');
                if is_key {
                    pending_key = Some(out.len());
                }
                push_word(&mut out, &word, is_key);
                index = end;
            }
            _ => {
                out.push(ch);
                index += 1;
            }
        }
    }

    drop_pending_key(&mut out, &mut pending_key);
    strip_trailing_comma(&mut out);
    if out.trim_end().ends_with(':') {
        out.push_str("null");
    }
    while let Some(frame) = frames.pop() {
        strip_trailing_comma(&mut out);
        out.push(frame.closer);
    }
    out
}

/// Separates the next token from a preceding value with a comma when the model left one out,
/// and reports whether the token sits in key position of the innermost object.
fn begin_token(out: &mut String, frames: &mut [Frame]) -> bool {
    let Some(frame) = frames.last_mut() else {
        return false;
    };
    let follows_value = out
        .trim_end()
        .chars()
        .last()
        .is_some_and(|c| c.is_alphanumeric() || matches!(c, '"' | '}' | ']' | '.'));
    if follows_value {
        out.push(',');
        frame.awaiting_key = frame.is_object();
    }
    frame.awaiting_key
}

/// A key cut off before its colon has no value to pair with, so it is removed.
fn drop_pending_key(out: &mut String, pending_key: &mut Option<usize>) {
    if let Some(start) = pending_key.take() {
        out.truncate(start);
    }
}

/// Copies a quoted string starting at `start` as a double-quoted JSON string and returns
/// the index just past its closing quote. Unterminated strings are closed.
fn copy_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    out.push('"');
    let mut index = start + 1;

    while index < chars.len() {
        let ch = chars[index];
        match ch {
            '\\' => {
                match chars.get(index + 1) {
                    Some('\'') => out.push('\''),
                    Some(&next) if is_json_escape(next) => {
                        out.push('\\');
                        out.push(next);
                    }
                    Some(&next) => out.push(next),
                    None => {}
                }
                index += 2;
            }
            c if c == quote => {
                out.push('"');
                return index + 1;
            }
            '"' => {
                out.push_str("\\\"");
                index += 1;
            }
            '\n' => {
                out.push_str("\\n");
                index += 1;
            }
            '\r' => {
                index += 1;
            }
            '\t' => {
                out.push_str("\\t");
                index += 1;
            }
            c => {
                out.push(c);
                index += 1;
            }
        }
    }

    out.push('"');
    chars.len()
}

fn is_json_escape(ch: char) -> bool {
    matches!(ch, '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u')
}

fn push_word(out: &mut String, word: &str, is_key: bool) {
    if is_key {
        out.push('"');
        out.push_str(word);
        out.push('"');
        return;
    }

    match word {
        "true" | "True" | "TRUE" => out.push_str("true"),
        "false" | "False" | "FALSE" => out.push_str("false"),
        "null" | "None" | "undefined" | "NULL" => out.push_str("null"),
        other => {
            out.push('"');
            out.push_str(other);
            out.push('"');
        }
    }
}

fn scan_while(chars: &[char], start: usize, accept: impl Fn(char) -> bool) -> usize {
    let mut end = start + 1;
    while end < chars.len() && accept(chars[end]) {
        end += 1;
    }
    end
}

fn next_significant(chars: &[char], start: usize) -> Option<char> {
    chars[start..].iter().copied().find(|c| !c.is_whitespace())
}

fn strip_trailing_comma(out: &mut String) {
    let trimmed_len = out.trim_end().len();
    if out[..trimmed_len].ends_with(',') {
        out.truncate(trimmed_len - 1);
    }
}
