//! Half-open key ranges and the URL-escaped argument form.

use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::KeyError;

/// Characters escaped when a key is rendered back into argument form.
const KEY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// An immutable half-open interval `[start_key, end_key)` over raw keys.
///
/// An empty `start_key` means "from the first key" and an empty `end_key`
/// means "to the last key", so `KeyRange::whole()` covers the keyspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct KeyRange {
    #[serde(with = "utf8_key")]
    start_key: Vec<u8>,
    #[serde(with = "utf8_key")]
    end_key: Vec<u8>,
}

impl KeyRange {
    /// Creates a range from raw bounds.
    pub fn new(start_key: impl Into<Vec<u8>>, end_key: impl Into<Vec<u8>>) -> Self {
        Self {
            start_key: start_key.into(),
            end_key: end_key.into(),
        }
    }

    /// The whole-keyspace range `("", "")`.
    #[must_use]
    pub fn whole() -> Self {
        Self::default()
    }

    /// Returns true if both bounds are open.
    pub fn is_whole(&self) -> bool {
        self.start_key.is_empty() && self.end_key.is_empty()
    }

    pub fn start_key(&self) -> &[u8] {
        &self.start_key
    }

    pub fn end_key(&self) -> &[u8] {
        &self.end_key
    }

    /// Returns true if `key` falls inside the range.
    pub fn contains(&self, key: &[u8]) -> bool {
        key >= self.start_key.as_slice() && (self.end_key.is_empty() || key < self.end_key.as_slice())
    }

    /// Returns true if the interval `[start, end)` lies entirely inside this
    /// range. An empty `end` is unbounded and only fits an unbounded range.
    pub fn involves(&self, start: &[u8], end: &[u8]) -> bool {
        start >= self.start_key.as_slice()
            && (self.end_key.is_empty() || (!end.is_empty() && end <= self.end_key.as_slice()))
    }

    /// Decodes URL-escaped `(start, end)` argument pairs.
    ///
    /// Arguments are consumed two at a time; an odd trailing argument is
    /// ignored. When no pair is supplied the result is a single whole-keyspace
    /// range.
    pub fn from_escaped_pairs<S: AsRef<str>>(args: &[S]) -> Result<Vec<Self>, KeyError> {
        let mut ranges = Vec::with_capacity(args.len() / 2);
        for pair in args.chunks_exact(2) {
            let start_key = unescape_key(pair[0].as_ref())?;
            let end_key = unescape_key(pair[1].as_ref())?;
            ranges.push(Self::new(start_key, end_key));
        }
        if ranges.is_empty() {
            ranges.push(Self::whole());
        }
        Ok(ranges)
    }

    /// Renders the range back into an escaped `[start, end]` argument pair
    /// that [`KeyRange::from_escaped_pairs`] decodes to the same range.
    pub fn to_escaped_pair(&self) -> [String; 2] {
        [escape_key(&self.start_key), escape_key(&self.end_key)]
    }
}

impl fmt::Display for KeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?}, {:?})",
            String::from_utf8_lossy(&self.start_key),
            String::from_utf8_lossy(&self.end_key)
        )
    }
}

/// Decodes one query-escaped key: `+` is a space and every `%` must be
/// followed by two hex digits.
fn unescape_key(input: &str) -> Result<Vec<u8>, KeyError> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        let well_formed = bytes
            .get(i + 1..i + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !well_formed {
            let end = (i + 3).min(bytes.len());
            return Err(KeyError::InvalidEscape {
                input: input.to_string(),
                escape: String::from_utf8_lossy(&bytes[i..end]).into_owned(),
            });
        }
        i += 3;
    }

    let spaced = input.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned().into_bytes())
        .map_err(|_| KeyError::InvalidUtf8 {
            input: input.to_string(),
        })
}

fn escape_key(key: &[u8]) -> String {
    match std::str::from_utf8(key) {
        Ok(s) => utf8_percent_encode(s, KEY_ESCAPE).to_string(),
        Err(_) => percent_encoding::percent_encode(key, KEY_ESCAPE).to_string(),
    }
}

/// Keys are stored as raw bytes but persisted as plain JSON strings.
mod utf8_key {
    use serde::{ser::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(key: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = std::str::from_utf8(key).map_err(S::Error::custom)?;
        serializer.serialize_str(s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(String::into_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_pairs_is_whole_keyspace() {
        let ranges = KeyRange::from_escaped_pairs::<String>(&[]).unwrap();
        assert_eq!(ranges, vec![KeyRange::whole()]);
        assert!(ranges[0].is_whole());
    }

    #[test]
    fn test_odd_trailing_argument_dropped() {
        let ranges = KeyRange::from_escaped_pairs(&args(&["a", "m", "z"])).unwrap();
        assert_eq!(ranges, vec![KeyRange::new("a", "m")]);
    }

    #[test]
    fn test_single_argument_is_whole_keyspace() {
        let ranges = KeyRange::from_escaped_pairs(&args(&["a"])).unwrap();
        assert_eq!(ranges, vec![KeyRange::whole()]);
    }

    #[test]
    fn test_query_unescape_semantics() {
        let ranges = KeyRange::from_escaped_pairs(&args(&["t%5Fa+b", "%2B"])).unwrap();
        assert_eq!(ranges[0].start_key(), b"t_a b");
        assert_eq!(ranges[0].end_key(), b"+");
    }

    #[test]
    fn test_bad_escape_rejected() {
        for bad in ["%zz", "abc%", "%4"] {
            let err = KeyRange::from_escaped_pairs(&args(&[bad, ""])).unwrap_err();
            assert!(matches!(err, KeyError::InvalidEscape { .. }), "{bad}: {err:?}");
        }
    }

    #[test]
    fn test_non_utf8_rejected() {
        let err = KeyRange::from_escaped_pairs(&args(&["%ff", ""])).unwrap_err();
        assert!(matches!(err, KeyError::InvalidUtf8 { .. }));
    }

    #[test]
    fn test_contains_and_involves() {
        let range = KeyRange::new("b", "m");
        assert!(range.contains(b"b"));
        assert!(range.contains(b"lzz"));
        assert!(!range.contains(b"m"));
        assert!(!range.contains(b"a"));

        assert!(range.involves(b"c", b"d"));
        assert!(range.involves(b"b", b"m"));
        assert!(!range.involves(b"a", b"c"));
        assert!(!range.involves(b"c", b""));

        let whole = KeyRange::whole();
        assert!(whole.involves(b"", b""));
        assert!(whole.involves(b"x", b""));
    }

    #[test]
    fn test_persisted_form() {
        let json = serde_json::to_string(&KeyRange::new("a", "m")).unwrap();
        assert_eq!(json, r#"{"start_key":"a","end_key":"m"}"#);
        let parsed: KeyRange = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, KeyRange::new("a", "m"));
    }

    proptest! {
        #[test]
        fn escaped_pair_decodes_to_same_range(start in "\\PC{0,12}", end in "\\PC{0,12}") {
            let range = KeyRange::new(start, end);
            let decoded = KeyRange::from_escaped_pairs(&range.to_escaped_pair()).unwrap();
            prop_assert_eq!(decoded, vec![range]);
        }
    }
}
