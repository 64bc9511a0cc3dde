//! Byte level charset helpers: byte order marks, charset labels and decoding.
use crate::errors::{FilterError, FilterResult};
use derive_more::Display;
use encoding_rs::Encoding;

/// Byte order marks that identify a charset family
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum Bom {
    #[display("UTF-8")]
    Utf8,
    #[display("UTF-16LE")]
    Utf16Le,
    #[display("UTF-16BE")]
    Utf16Be,
    #[display("UTF-32LE")]
    Utf32Le,
    #[display("UTF-32BE")]
    Utf32Be,
}

impl Bom {
    /// Length of the mark in bytes
    #[must_use]
    pub fn byte_len(&self) -> usize {
        match self {
            Bom::Utf8 => 3,
            Bom::Utf16Le | Bom::Utf16Be => 2,
            Bom::Utf32Le | Bom::Utf32Be => 4,
        }
    }

    /// The encoding used for decoding, if it is one we can decode
    #[must_use]
    pub fn encoding(&self) -> Option<&'static Encoding> {
        match self {
            Bom::Utf8 => Some(encoding_rs::UTF_8),
            Bom::Utf16Le => Some(encoding_rs::UTF_16LE),
            Bom::Utf16Be => Some(encoding_rs::UTF_16BE),
            Bom::Utf32Le | Bom::Utf32Be => None,
        }
    }
}

/// Checks the start of the buffer for a byte order mark. UTF-32 is checked before UTF-16 as
/// the UTF-32LE mark starts with the UTF-16LE one.
#[must_use]
pub fn detect_bom(buf: &[u8]) -> Option<Bom> {
    if buf.starts_with(b"\xEF\xBB\xBF") {
        Some(Bom::Utf8)
    } else if buf.starts_with(b"\x00\x00\xFE\xFF") {
        Some(Bom::Utf32Be)
    } else if buf.starts_with(b"\xFF\xFE\x00\x00") {
        Some(Bom::Utf32Le)
    } else if buf.starts_with(b"\xFF\xFE") {
        Some(Bom::Utf16Le)
    } else if buf.starts_with(b"\xFE\xFF") {
        Some(Bom::Utf16Be)
    } else {
        None
    }
}

/// Returns the encoding for a charset label (`"utf-8"`, `"latin1"`, ...) if we can decode it
#[must_use]
pub fn resolve_label(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label_no_replacement(label.trim().as_bytes())
}

/// Returns true when the charset label names an encoding we can decode
#[must_use]
pub fn is_supported(label: &str) -> bool {
    resolve_label(label).is_some()
}

/// Returns true when both labels name the same encoding. Labels that cannot be resolved are
/// compared case-insensitively.
#[must_use]
pub fn same_charset(a: &str, b: &str) -> bool {
    match (resolve_label(a), resolve_label(b)) {
        (Some(ea), Some(eb)) => ea == eb,
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}

/// Guesses the encoding of a buffer that carries no other charset information
#[must_use]
pub fn guess_encoding(buf: &[u8]) -> &'static Encoding {
    // Cap the buffer size we will check to max 64KB
    const MAX_BUF_SIZE: usize = 64 * 1024;
    let mut buf = buf;
    let mut complete = true;
    if buf.len() > MAX_BUF_SIZE {
        buf = &buf[..MAX_BUF_SIZE];
        complete = false;
    }

    let mut encoding_detector = chardetng::EncodingDetector::new();
    encoding_detector.feed(buf, complete);
    encoding_detector.guess(None, true)
}

/// Decodes the buffer with the given charset label. A byte order mark always wins over the
/// label and is stripped from the output. Malformed sequences are replaced with U+FFFD.
pub fn decode(buf: &[u8], label: &str) -> FilterResult<String> {
    let (encoding, body) = match detect_bom(buf) {
        Some(bom) => match bom.encoding() {
            Some(encoding) => (encoding, &buf[bom.byte_len()..]),
            None => return Err(FilterError::UnsupportedCharset(bom.to_string())),
        },
        None => match resolve_label(label) {
            Some(encoding) => (encoding, buf),
            None => return Err(FilterError::UnsupportedCharset(label.to_string())),
        },
    };

    let (text, had_errors) = encoding.decode_without_bom_handling(body);
    if had_errors {
        log::debug!("malformed {} sequences replaced while decoding", encoding.name());
    }
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(b"\xEF\xBB\xBFa", Some(Bom::Utf8); "utf8")]
    #[test_case(b"\xFF\xFEa\x00", Some(Bom::Utf16Le); "utf16le")]
    #[test_case(b"\xFE\xFF\x00a", Some(Bom::Utf16Be); "utf16be")]
    #[test_case(b"\xFF\xFE\x00\x00", Some(Bom::Utf32Le); "utf32le")]
    #[test_case(b"\x00\x00\xFE\xFF", Some(Bom::Utf32Be); "utf32be")]
    #[test_case(b"@charset", None; "none")]
    fn test_detect_bom(buf: &[u8], expected: Option<Bom>) {
        assert_eq!(detect_bom(buf), expected);
    }

    #[test]
    fn test_labels() {
        assert!(is_supported("UTF-8"));
        assert!(is_supported(" iso-8859-1 "));
        assert!(!is_supported("idiot"));
        assert!(same_charset("utf8", "UTF-8"));
        assert!(same_charset("latin1", "windows-1252"));
        assert!(!same_charset("UTF-16", "UTF-8"));
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode(b"h1{}", "utf-8").ok(), Some("h1{}".to_string()));
        assert_eq!(decode(b"\xEF\xBB\xBFh1", "latin1").ok(), Some("h1".to_string()));
        assert_eq!(decode(b"caf\xE9", "iso-8859-1").ok(), Some("caf\u{e9}".to_string()));
        assert!(matches!(
            decode(b"x", "idiot"),
            Err(FilterError::UnsupportedCharset(_))
        ));
        assert!(matches!(
            decode(b"\x00\x00\xFE\xFFx", "utf-8"),
            Err(FilterError::UnsupportedCharset(_))
        ));
    }

    #[test]
    fn test_guess() {
        assert_eq!(guess_encoding("h1 { content: \"é\" }".as_bytes()), encoding_rs::UTF_8);
    }
}
