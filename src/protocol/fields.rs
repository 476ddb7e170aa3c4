//! # Field Extraction
//!
//! Pulls flat scalar and integer-array fields out of one protocol line by
//! searching for literal anchors such as `"volume":` or `"audio_data":[`.
//!
//! ## Why not serde_json here:
//! Inbound lines come from a cooperating host that emits a fixed schema of
//! flat fields. Anchor search needs no allocation for scalars, tolerates
//! partially garbled lines, and never fails: every lookup answers either
//! [`Field::Present`] or [`Field::Absent`]. A missing field and a malformed
//! field are the same thing to every caller. This is NOT a validator and
//! must not be pointed at adversarial input.
//!
//! ## Anchor rules:
//! - strings: `"key":"` up to the next `"` (no escape handling)
//! - numbers: `"key":` up to the first `,` or `}`; surrounding whitespace is ignored
//! - integer arrays: `"key":[` up to the next `]`, split on `,`; tokens that
//!   are not entirely an integer are skipped

/// Result of looking up one field.
///
/// ## Rust Concepts:
/// - **enum with data**: `Present` carries the value, `Absent` carries nothing
/// - **Generic type**: `T` is `&str`, `f64`, `i64` or `Vec<i64>` depending on the lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    Present(T),
    Absent,
}

impl<T> Field<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Field::Present(value) => Some(value),
            Field::Absent => None,
        }
    }

    /// The value, or `default` when the field is absent.
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Field::Present(value) => value,
            Field::Absent => default,
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Field::Present(value),
            None => Field::Absent,
        }
    }
}

/// Borrowed view over one completed line.
///
/// Nothing is parsed up front; each accessor searches the raw text.
#[derive(Debug, Clone, Copy)]
pub struct Message<'a> {
    line: &'a str,
}

impl<'a> Message<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { line }
    }

    /// True if the literal `"key":` appears anywhere in the line.
    pub fn has_key(&self, key: &str) -> bool {
        self.line.contains(&format!("\"{}\":", key))
    }

    /// True if the line contains `"key":true` exactly.
    pub fn flag(&self, key: &str) -> bool {
        self.line.contains(&format!("\"{}\":true", key))
    }

    pub fn string(&self, key: &str) -> Field<&'a str> {
        extract_string(self.line, key)
    }

    pub fn float(&self, key: &str) -> Field<f64> {
        extract_f64(self.line, key)
    }

    pub fn integer(&self, key: &str) -> Field<i64> {
        extract_i64(self.line, key)
    }

    pub fn int_array(&self, key: &str) -> Field<Vec<i64>> {
        extract_int_array(self.line, key)
    }
}

/// Everything after the first occurrence of `anchor`.
fn after_anchor<'a>(line: &'a str, anchor: &str) -> Option<&'a str> {
    line.find(anchor).map(|pos| &line[pos + anchor.len()..])
}

/// Value of `"key":"..."`, without the quotes.
pub fn extract_string<'a>(line: &'a str, key: &str) -> Field<&'a str> {
    let rest = match after_anchor(line, &format!("\"{}\":\"", key)) {
        Some(rest) => rest,
        None => return Field::Absent,
    };
    rest.find('"').map(|end| &rest[..end]).into()
}

/// Raw text of a numeric field, up to the first `,` or `}`.
fn number_text<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = after_anchor(line, &format!("\"{}\":", key))?;
    let end = rest.find(|c| c == ',' || c == '}')?;
    Some(rest[..end].trim())
}

pub fn extract_f64(line: &str, key: &str) -> Field<f64> {
    number_text(line, key)
        .and_then(|text| text.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .into()
}

pub fn extract_i64(line: &str, key: &str) -> Field<i64> {
    number_text(line, key)
        .and_then(|text| text.parse::<i64>().ok())
        .into()
}

/// Elements of `"key":[...]` that parse completely as integers.
///
/// `"key":[]` is present-and-empty, which callers distinguish from absent.
pub fn extract_int_array(line: &str, key: &str) -> Field<Vec<i64>> {
    let rest = match after_anchor(line, &format!("\"{}\":[", key)) {
        Some(rest) => rest,
        None => return Field::Absent,
    };
    let interior = match rest.find(']') {
        Some(end) => &rest[..end],
        None => return Field::Absent,
    };

    let values = interior
        .split(',')
        .filter_map(|token| token.trim().parse::<i64>().ok())
        .collect();
    Field::Present(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_string() {
        let line = r#"{"type":"config","wake_word":"Hey Jarvis","sensitivity":"Slightly sensitive"}"#;
        assert_eq!(extract_string(line, "type"), Field::Present("config"));
        assert_eq!(extract_string(line, "wake_word"), Field::Present("Hey Jarvis"));
        assert_eq!(extract_string(line, "volume"), Field::Absent);
        // opening anchor without a closing quote
        assert_eq!(extract_string(r#"{"wake_word":"Hey"#, "wake_word"), Field::Absent);
    }

    #[test]
    fn test_extract_numbers() {
        let line = r#"{"type":"config","volume":0.5,"batch":2}"#;
        assert_eq!(extract_f64(line, "volume"), Field::Present(0.5));
        assert_eq!(extract_i64(line, "batch"), Field::Present(2));
        assert_eq!(extract_i64(r#"{"chunk_index": 7 }"#, "chunk_index"), Field::Present(7));
        // malformed and unterminated values resolve to absent
        assert_eq!(extract_f64(r#"{"volume":loud}"#, "volume"), Field::Absent);
        assert_eq!(extract_i64(r#"{"batch":1.5}"#, "batch"), Field::Absent);
        assert_eq!(extract_i64(r#"{"batch":3"#, "batch"), Field::Absent);
        assert_eq!(extract_f64(r#"{"volume":NaN}"#, "volume"), Field::Absent);
    }

    #[test]
    fn test_extract_int_array() {
        let line = r#"{"audio_data":[1, -2,abc,3x,,40000],"x":1}"#;
        assert_eq!(extract_int_array(line, "audio_data"), Field::Present(vec![1, -2, 40000]));
        assert_eq!(extract_int_array(r#"{"audio_data":[]}"#, "audio_data"), Field::Present(vec![]));
        assert_eq!(extract_int_array(r#"{"audio_data":[1,2"#, "audio_data"), Field::Absent);
        assert_eq!(extract_int_array(r#"{"data":[1]}"#, "audio_data"), Field::Absent);
    }

    #[test]
    fn test_extractors_are_total() {
        let garbage = [
            "",
            "\"",
            "\":[",
            "{\"a\":",
            "{\"a\":\"",
            "{\"a\":[",
            "{\"a\":]",
            "ünïcödé \"a\":ü,",
            "{\"a\":[\u{1F600},1]}",
        ];
        for line in garbage {
            let _ = extract_string(line, "a");
            let _ = extract_f64(line, "a");
            let _ = extract_i64(line, "a");
            let _ = extract_int_array(line, "a");
        }
        assert_eq!(extract_int_array("{\"a\":[\u{1F600},1]}", "a"), Field::Present(vec![1]));
    }

    #[test]
    fn test_message_flags() {
        let msg = Message::new(r#"{"type":"play_audio_chunk","is_start":true,"total_chunks":3}"#);
        assert!(msg.flag("is_start"));
        assert!(!msg.flag("unmute"));
        assert!(msg.has_key("total_chunks"));
        assert_eq!(msg.integer("total_chunks").unwrap_or(0), 3);
        assert_eq!(msg.integer("chunk_index").into_option(), None);
    }
}
