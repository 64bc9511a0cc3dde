//! Finds the charset a stylesheet declares for itself, before it is decoded. A byte order mark
//! wins; otherwise the start of the buffer is decoded with a few candidate encodings and
//! searched for a leading `@charset` rule.
use encoding_rs::Encoding;
use log::debug;
use veil_shared::encoding::detect_bom;

use crate::callback::RejectAllCallback;
use crate::config::FilterConfig;
use crate::tokenizer::CssTokenizer;

/// Number of bytes searched for a `@charset` rule
const SNIFF_LEN: usize = 1024;

/// Returns the charset named by the byte order mark or the `@charset` rule of the buffer
#[must_use]
pub fn detect_charset(buf: &[u8]) -> Option<String> {
    if let Some(bom) = detect_bom(buf) {
        debug!("byte order mark found: {bom}");
        return Some(bom.to_string());
    }

    let head = &buf[..buf.len().min(SNIFF_LEN)];
    candidate_encodings(head)
        .into_iter()
        .find_map(|encoding| charset_rule(head, encoding))
}

/// Encodings worth trying on the buffer. A `@` followed or preceded by a NUL byte means the
/// sheet is probably UTF-16 without a byte order mark.
fn candidate_encodings(head: &[u8]) -> Vec<&'static Encoding> {
    let mut candidates = vec![encoding_rs::WINDOWS_1252];
    if head.windows(4).any(|w| w == b"@\0c\0") {
        candidates.push(encoding_rs::UTF_16LE);
    }
    if head.windows(4).any(|w| w == b"\0@\0c") {
        candidates.push(encoding_rs::UTF_16BE);
    }
    candidates
}

/// Decodes the buffer and runs the tokenizer up to the first construct
fn charset_rule(head: &[u8], encoding: &'static Encoding) -> Option<String> {
    let (text, _) = encoding.decode_without_bom_handling(head);
    let config = FilterConfig {
        stop_at_detected_charset: true,
        ..FilterConfig::default()
    };

    let mut sink = String::new();
    match CssTokenizer::new(&text, &mut sink, &config, &RejectAllCallback).run() {
        Ok(charset) => charset,
        Err(e) => {
            debug!("no usable @charset as {}: {e}", encoding.name());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn utf16le(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    fn utf16be(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(|u| u.to_be_bytes()).collect()
    }

    #[test_case(b"\xEF\xBB\xBFh1 {}", Some("UTF-8"))]
    #[test_case(b"\xFF\xFEh\0", Some("UTF-16LE"))]
    #[test_case(b"\xFE\xFF\0h", Some("UTF-16BE"))]
    #[test_case(b"\xFF\xFE\0\0h\0\0\0", Some("UTF-32LE"))]
    #[test_case(b"@charset \"iso-8859-2\"; h1 {}", Some("iso-8859-2"))]
    #[test_case(b"  @charset 'koi8-r';", Some("koi8-r"))]
    #[test_case(b"h1 {} @charset \"iso-8859-2\";", None)]
    #[test_case(b"@charset \"x-nonsense\";", None)]
    #[test_case(b"", None)]
    fn sniff(buf: &[u8], expected: Option<&str>) {
        assert_eq!(detect_charset(buf).as_deref(), expected);
    }

    #[test]
    fn utf16_without_bom() {
        assert_eq!(
            detect_charset(&utf16le("@charset \"utf-16le\"; h1 {}")).as_deref(),
            Some("utf-16le")
        );
        assert_eq!(
            detect_charset(&utf16be("@charset \"utf-16be\";")).as_deref(),
            Some("utf-16be")
        );
    }

    #[test]
    fn only_the_start_is_searched() {
        let mut buf = vec![b' '; SNIFF_LEN];
        buf.extend_from_slice(b"@charset \"iso-8859-2\";");
        assert_eq!(detect_charset(&buf), None);
    }
}
