//! Whitelist CSS filter
//!
//! Re-parses an untrusted stylesheet and writes out only the constructs that are known to be
//! harmless: whitelisted properties with values matching their grammar, selectors made of known
//! elements and pseudo-classes, `@media`/`@page` blocks and `@import` rules whose target the
//! caller's [`callback::UriCallback`] accepts. Everything else is dropped silently.
use std::fmt;

use log::debug;
use veil_shared::encoding::{decode, guess_encoding};

use crate::callback::UriCallback;
use crate::config::FilterConfig;
use crate::errors::FilterResult;
use crate::tokenizer::CssTokenizer;

pub mod callback;
pub mod charset;
pub mod colors;
pub mod config;
pub mod errors;
pub mod grammar;
pub mod lexer;
pub mod registry;
pub mod selector;
pub mod tokenizer;
pub mod values;
pub mod verifier;
pub mod whitelist;

pub struct CssFilter<'a> {
    /// The filter configuration as given
    config: FilterConfig,
    /// Policy for every address found in the sheet
    callback: &'a dyn UriCallback,
}

impl<'a> CssFilter<'a> {
    #[must_use]
    pub fn new(config: FilterConfig, callback: &'a dyn UriCallback) -> Self {
        Self { config, callback }
    }

    #[must_use]
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Filters a decoded stylesheet
    pub fn filter_str(&self, input: &str) -> FilterResult<String> {
        let mut out = String::with_capacity(input.len());
        self.filter_to(input, &mut out)?;
        Ok(out)
    }

    /// Filters a decoded stylesheet into the given writer
    pub fn filter_to<W: fmt::Write>(&self, input: &str, out: &mut W) -> FilterResult<()> {
        CssTokenizer::new(input, out, &self.config, self.callback).run()?;
        Ok(())
    }

    /// Filters a stylesheet that has not been decoded yet. The charset is taken from the
    /// configuration, then the byte order mark or `@charset` rule, and guessed from the
    /// content as a last resort.
    pub fn filter_bytes(&self, buf: &[u8]) -> FilterResult<String> {
        let charset = match &self.config.charset {
            Some(charset) => charset.clone(),
            None => charset::detect_charset(buf).unwrap_or_else(|| {
                let guess = guess_encoding(buf).name().to_string();
                debug!("no charset information, guessed {guess}");
                guess
            }),
        };

        let text = decode(buf, &charset)?;
        let config = self.config.clone().with_charset(&charset);
        let mut out = String::with_capacity(text.len());
        CssTokenizer::new(&text, &mut out, &config, self.callback).run()?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::RelativeUriCallback;
    use crate::errors::FilterError;

    #[test]
    fn filter_str_and_to() {
        let callback = RelativeUriCallback::new();
        let filter = CssFilter::new(FilterConfig::default(), &callback);
        assert_eq!(filter.filter_str("h1 { color: red }").unwrap(), "h1 { color: red }");

        let mut out = String::from("/* sanitized */\n");
        filter.filter_to("p { bogus: 1 }", &mut out).unwrap();
        assert_eq!(out, "/* sanitized */\np { }");
    }

    #[test]
    fn bytes_are_decoded_by_declared_charset() {
        let callback = RelativeUriCallback::new();
        let filter = CssFilter::new(FilterConfig::default(), &callback);

        let css = b"@charset \"iso-8859-1\"; p { font-family: \"Caf\xE9\" }";
        assert_eq!(
            filter.filter_bytes(css).unwrap(),
            "@charset \"iso-8859-1\"; p { font-family: \"Caf\u{e9}\" }"
        );
    }

    #[test]
    fn bytes_with_bom() {
        let callback = RelativeUriCallback::new();
        let filter = CssFilter::new(FilterConfig::default(), &callback);
        assert_eq!(
            filter.filter_bytes(b"\xEF\xBB\xBFp { color: red }").unwrap(),
            "p { color: red }"
        );
        assert!(matches!(
            filter.filter_bytes(b"\xFF\xFE\0\0p\0\0\0"),
            Err(FilterError::UnsupportedCharset(_))
        ));
    }

    #[test]
    fn configured_charset_must_match_declaration() {
        let callback = RelativeUriCallback::new();
        let filter = CssFilter::new(FilterConfig::default().with_charset("utf-8"), &callback);
        assert!(matches!(
            filter.filter_bytes(b"@charset \"iso-8859-1\"; p {}"),
            Err(FilterError::CharsetMismatch { .. })
        ));
    }
}
