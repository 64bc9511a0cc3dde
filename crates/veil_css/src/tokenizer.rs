//! The stream tokenizer. It walks a stylesheet character by character, splits it into at-rules,
//! selector groups and declarations, and writes out only what survives verification. Everything
//! it does not understand is dropped; accepted text is copied through unchanged wherever
//! possible so that filtering is idempotent.
use std::fmt::Write;
use std::mem;

use cow_utils::CowUtils;
use itertools::Itertools;
use log::{debug, trace, warn};
use veil_shared::char_stream::Character::{Ch, StreamEnd};
use veil_shared::char_stream::{is_css_newline, is_css_whitespace, CharStream, Stream, CHAR_BOM, CHAR_CR, CHAR_LF};
use veil_shared::encoding::{is_supported, same_charset};

use crate::callback::{with_charset_hint, UriCallback, STYLESHEET_MIME};
use crate::config::FilterConfig;
use crate::errors::{FilterError, FilterResult};
use crate::lexer::{self, encode_string, Token, TokenKind};
use crate::registry::{lookup, PropertyEntry};
use crate::selector::verify_selector_group;
use crate::verifier::Verifier;
use crate::whitelist::{is_media, remove_outer_quotes};

pub mod state;

use state::State;

/// Page selectors allowed after `@page`
const PAGE_SELECTORS: &[&str] = &[":left", ":right", ":first"];

/// Whether the tokenizer keeps consuming input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Continue,
    Stop,
}

pub struct CssTokenizer<'a, W: Write> {
    /// Input stream
    stream: CharStream,
    /// Sink for the filtered stylesheet
    out: &'a mut W,
    config: &'a FilterConfig,
    callback: &'a dyn UriCallback,
    verifier: Verifier<'a>,
    /// Current state of the tokenizer
    state: State,
    /// State to return to when the current comment ends
    state_before_comment: State,
    /// Quote character of the string we are in
    quote: char,
    /// Previous character. Reset after a comment so `*/*` does not reopen one.
    prev: char,
    /// The previous character was a backslash that escapes the current one
    escape_pending: bool,
    /// Text of the construct being collected
    buffer: String,
    /// Filtered text of the current rule, written once the rule is complete
    pending: String,
    open_braces: usize,
    /// Brace depth of the declaration block we are in. Deeper braces are part of a value.
    block_depth: usize,
    /// Media the current declarations apply to
    media: Vec<String>,
    /// Property name of the current declaration, once its colon is seen
    property: Option<String>,
    /// Whitespace in front of the current property name
    space_before_property: String,
    /// Whitespace between the current property name and its colon
    space_after_property: String,
    /// An `@` was seen, we are collecting an at-rule head
    at_rule_head: bool,
    /// Drop the current at-rule, including its block
    skip_at_rule: bool,
    /// Drop the current rule set
    skip_rule: bool,
    /// Drop the current declaration
    skip_declaration: bool,
    /// The block we are in belongs to `@page`
    in_page: bool,
    can_import: bool,
    charset_possible: bool,
    bom_possible: bool,
    detected_charset: Option<String>,
}

impl<'a, W: Write> CssTokenizer<'a, W> {
    pub fn new(
        input: &str,
        out: &'a mut W,
        config: &'a FilterConfig,
        callback: &'a dyn UriCallback,
    ) -> Self {
        let state = if config.inline {
            State::Declaration
        } else {
            State::TopLevel
        };

        Self {
            stream: CharStream::with_limit(input, config.max_input_len),
            out,
            config,
            callback,
            verifier: Verifier::new(callback),
            state,
            state_before_comment: state,
            quote: '"',
            prev: '\0',
            escape_pending: false,
            buffer: String::new(),
            pending: String::new(),
            open_braces: 0,
            block_depth: 0,
            media: default_media(config),
            property: None,
            space_before_property: String::new(),
            space_after_property: String::new(),
            at_rule_head: false,
            skip_at_rule: false,
            skip_rule: false,
            skip_declaration: false,
            in_page: false,
            can_import: !config.inline,
            charset_possible: !config.inline,
            bom_possible: true,
            detected_charset: None,
        }
    }

    /// Filters the input into the sink. Returns the charset named by a `@charset` rule, if
    /// there was one.
    pub fn run(mut self) -> FilterResult<Option<String>> {
        loop {
            let c = match self.stream.read_and_next() {
                Ch(c) => c,
                StreamEnd => break,
            };

            if self.consume(c)? == Step::Stop {
                trace!("{}: stopped", self.stream.location());
                return Ok(self.detected_charset);
            }
        }

        self.finish()?;
        Ok(self.detected_charset)
    }

    fn consume(&mut self, c: char) -> FilterResult<Step> {
        if c == CHAR_BOM {
            if mem::take(&mut self.bom_possible) {
                self.out.write_char(c)?;
            }
            return Ok(Step::Continue);
        }
        self.bom_possible = false;

        if c == '\0' {
            return Ok(Step::Continue);
        }

        if !matches!(self.state, State::TopLevel | State::TopLevelInQuote) {
            self.charset_possible = false;
            self.can_import = false;
            if self.config.stop_at_detected_charset {
                return Ok(Step::Stop);
            }
        }

        let prev = mem::replace(&mut self.prev, c);
        let escaped = self.escape_pending;
        self.escape_pending = c == '\\' && !escaped;

        if self.state == State::Comment {
            if prev == '*' && c == '/' {
                self.state = self.state_before_comment;
                self.prev = '\0';
            }
            return Ok(Step::Continue);
        }

        if prev == '/' && c == '*' && !self.state.is_quoted() {
            if self.buffer.ends_with('/') {
                self.buffer.pop();
            }
            self.state_before_comment = self.state;
            self.state = State::Comment;
            self.prev = '\0';
            return Ok(Step::Continue);
        }

        match self.state {
            State::TopLevel => self.top_level(c, escaped),
            State::Selector => {
                self.selector(c, escaped)?;
                Ok(Step::Continue)
            }
            State::Declaration => self.declaration(c, escaped),
            State::TopLevelInQuote | State::SelectorInQuote | State::DeclarationInQuote => {
                self.in_quote(c, prev, escaped);
                Ok(Step::Continue)
            }
            State::Comment => Ok(Step::Continue),
        }
    }

    fn top_level(&mut self, c: char, escaped: bool) -> FilterResult<Step> {
        match c {
            '{' if !escaped => {
                self.charset_possible = false;
                if self.config.stop_at_detected_charset {
                    return Ok(Step::Stop);
                }
                self.open_braces += 1;
                self.at_rule_block()?;
            }
            ';' if !escaped => return self.statement(),
            '}' if !escaped => {
                debug!("{}: unbalanced '}}' dropped", self.stream.location());
                self.buffer.clear();
                self.at_rule_head = false;
                self.skip_at_rule = false;
                self.skip_rule = false;
            }
            '"' | '\'' if !escaped => self.open_quote(c),
            '@' => {
                if !escaped {
                    self.at_rule_head = true;
                }
                self.buffer.push(c);
            }
            c if is_css_whitespace(c) => self.buffer.push(c),
            c => {
                self.buffer.push(c);
                if !self.at_rule_head && !is_comment_opener_prefix(self.buffer.trim()) {
                    self.state = State::Selector;
                    self.can_import = false;
                    self.charset_possible = false;
                }
            }
        }

        Ok(Step::Continue)
    }

    /// An at-rule head followed by `{`: `@media` and `@page` are kept, anything else is
    /// dropped together with its block.
    fn at_rule_block(&mut self) -> FilterResult<()> {
        let buffer = mem::take(&mut self.buffer);
        let (lead, head, trail) = split_padding(&buffer);
        self.at_rule_head = false;

        let tokens = lexer::split(head, false).unwrap_or_default();
        let keyword = tokens
            .first()
            .filter(|t| t.is_simple())
            .map(|t| t.original.cow_to_ascii_lowercase());

        match keyword.as_deref() {
            Some("@media") => {
                let media: Vec<String> = media_list(&tokens[1..])
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|m| is_media(m))
                    .collect();
                if media.is_empty() {
                    debug!("{}: no known media in '{}'", self.stream.location(), head);
                    self.skip_block();
                } else {
                    write!(self.out, "{lead}@media {}{trail}{{", media.join(", "))?;
                    trace!("{}: media {:?}", self.stream.location(), media);
                    self.media = media;
                    self.state = State::Selector;
                }
            }
            Some("@page") if tokens[1..].iter().all(is_page_selector) => {
                write!(self.out, "{lead}{head}{trail}{{")?;
                self.in_page = true;
                self.block_depth = self.open_braces;
                self.state = State::Declaration;
            }
            _ => {
                debug!("{}: at-rule '{}' dropped", self.stream.location(), head);
                self.skip_block();
            }
        }

        Ok(())
    }

    fn skip_block(&mut self) {
        self.skip_at_rule = true;
        self.state = State::Selector;
    }

    /// A top level statement ending in `;`
    fn statement(&mut self) -> FilterResult<Step> {
        let buffer = mem::take(&mut self.buffer);
        let (lead, body, _) = split_padding(&buffer);
        self.out.write_str(lead)?;

        let charset_possible = mem::replace(&mut self.charset_possible, false);
        let skip = mem::take(&mut self.skip_at_rule) | mem::take(&mut self.skip_rule);
        self.at_rule_head = false;

        if charset_possible {
            if let Some(name) = strip_prefix_ignore_case(body, "@charset ") {
                return self.charset_rule(name);
            }
        }
        if self.config.stop_at_detected_charset {
            return Ok(Step::Stop);
        }
        if skip {
            debug!("{}: statement '{}' dropped", self.stream.location(), body);
            return Ok(Step::Continue);
        }

        match strip_prefix_ignore_case(body, "@import") {
            Some(rest) if self.can_import => self.import_rule(rest)?,
            _ => debug!("{}: statement '{}' dropped", self.stream.location(), body),
        }

        Ok(Step::Continue)
    }

    fn import_rule(&mut self, rest: &str) -> FilterResult<()> {
        let location = self.stream.location();
        let tokens = match lexer::split(rest, false) {
            Ok(tokens) => tokens,
            Err(e) => {
                debug!("{location}: @import dropped: {e}");
                return Ok(());
            }
        };

        let Some((target, media_tokens)) = tokens.split_first() else {
            debug!("{location}: @import without target dropped");
            return Ok(());
        };
        if !matches!(target.kind, TokenKind::StringLit { .. } | TokenKind::Url { .. }) {
            debug!("{location}: @import target '{}' dropped", target.original);
            return Ok(());
        }

        let Some(media) = media_list(media_tokens) else {
            debug!("{location}: @import with malformed media list dropped");
            return Ok(());
        };
        let valid: Vec<&String> = media.iter().filter(|m| is_media(m)).collect();
        if !media.is_empty() && valid.is_empty() {
            debug!("{location}: @import for unknown media dropped");
            return Ok(());
        }

        let uri = match self.callback.process_uri(&target.decoded, Some(STYLESHEET_MIME)) {
            Ok(uri) => with_charset_hint(&uri, self.config.charset.as_deref()),
            Err(e) => {
                debug!("{location}: @import dropped: {e}");
                return Ok(());
            }
        };

        write!(self.out, "@import url({})", encode_string(&uri, '"'))?;
        if !valid.is_empty() {
            write!(self.out, " {}", valid.iter().join(", "))?;
        }
        self.out.write_char(';')?;
        Ok(())
    }

    fn charset_rule(&mut self, name: &str) -> FilterResult<Step> {
        let name = remove_outer_quotes(name).to_string();
        debug!("{}: @charset \"{name}\"", self.stream.location());
        self.detected_charset = Some(name.clone());

        if !is_supported(&name) {
            warn!("stylesheet declares unsupported charset \"{name}\"");
            return Err(FilterError::UnsupportedCharset(name));
        }
        if self.config.stop_at_detected_charset {
            return Ok(Step::Stop);
        }

        if let Some(decoding) = &self.config.charset {
            if !same_charset(&name, decoding) {
                warn!("stylesheet declares charset \"{name}\" but was decoded as \"{decoding}\"");
                return Err(FilterError::CharsetMismatch {
                    declared: name,
                    decoding: decoding.clone(),
                });
            }
        }

        write!(self.out, "@charset \"{name}\";")?;
        Ok(Step::Continue)
    }

    fn selector(&mut self, c: char, escaped: bool) -> FilterResult<()> {
        match c {
            '{' if !escaped => {
                self.open_braces += 1;
                self.rule_block();
            }
            '}' if !escaped => self.close_at_rule_block()?,
            '"' | '\'' if !escaped => self.open_quote(c),
            c => self.buffer.push(c),
        }
        Ok(())
    }

    /// A selector group followed by `{`
    fn rule_block(&mut self) {
        let buffer = mem::take(&mut self.buffer);
        let (lead, group, trail) = split_padding(&buffer);

        self.pending.clear();
        match verify_selector_group(group) {
            Some(selectors) if !self.skip_rule => {
                self.pending.push_str(lead);
                self.pending.push_str(&selectors);
                self.pending.push_str(trail);
                self.pending.push('{');
            }
            _ => {
                debug!("{}: rule for '{}' dropped", self.stream.location(), group);
                self.skip_rule = true;
            }
        }

        self.block_depth = self.open_braces;
        self.state = State::Declaration;
    }

    /// `}` between rules closes the enclosing at-rule block
    fn close_at_rule_block(&mut self) -> FilterResult<()> {
        let buffer = mem::take(&mut self.buffer);
        if self.open_braces > 0 && !self.skip_at_rule {
            self.open_braces -= 1;
            let kept = buffer.trim_end_matches(is_css_whitespace).len();
            write!(self.out, "{}}}", &buffer[kept..])?;
        } else {
            self.open_braces = self.open_braces.saturating_sub(1);
            self.skip_at_rule = false;
        }

        self.pending.clear();
        self.skip_rule = false;
        self.media = default_media(self.config);
        self.at_rule_head = false;
        self.state = State::TopLevel;
        Ok(())
    }

    fn declaration(&mut self, c: char, escaped: bool) -> FilterResult<Step> {
        let at_block_depth = self.open_braces == self.block_depth;
        match c {
            ':' if !escaped && at_block_depth && self.property.is_none() => {
                let buffer = mem::take(&mut self.buffer);
                let name = buffer.trim_start_matches(is_css_whitespace);
                let trimmed = name.trim_end_matches(is_css_whitespace);
                self.space_before_property = buffer[..buffer.len() - name.len()].to_string();
                self.space_after_property = name[trimmed.len()..].to_string();
                self.property = Some(trimmed.to_string());
            }
            ';' if !escaped && at_block_depth => self.end_declaration(";")?,
            '{' if !escaped => {
                self.open_braces += 1;
                self.buffer.push(c);
            }
            '}' if !escaped => {
                if self.open_braces > self.block_depth {
                    self.open_braces -= 1;
                    self.buffer.push(c);
                } else {
                    return self.close_rule_block();
                }
            }
            '"' | '\'' if !escaped => self.open_quote(c),
            c => self.buffer.push(c),
        }

        Ok(Step::Continue)
    }

    fn close_rule_block(&mut self) -> FilterResult<Step> {
        self.open_braces = self.open_braces.saturating_sub(1);

        let kept = self.buffer.trim_end_matches(is_css_whitespace).len();
        let trail = self.buffer.split_off(kept);
        if self.property.is_some() {
            self.end_declaration("")?;
        } else if !self.buffer.trim().is_empty() {
            debug!("{}: '{}' is not a declaration", self.stream.location(), self.buffer.trim());
        }
        self.buffer.clear();
        self.skip_declaration = false;

        if !mem::take(&mut self.skip_rule) && !self.config.inline {
            self.pending.push_str(&trail);
            self.pending.push('}');
        }
        if !self.skip_at_rule {
            self.out.write_str(&self.pending)?;
        }
        self.pending.clear();
        if self.open_braces == 0 {
            self.skip_at_rule = false;
        }

        if self.config.inline {
            debug!("{}: '}}' ends inline style", self.stream.location());
            return Ok(Step::Stop);
        }

        self.state = if mem::take(&mut self.in_page) || self.open_braces == 0 {
            State::TopLevel
        } else {
            State::Selector
        };
        Ok(Step::Continue)
    }

    /// Ends the current declaration. A declaration that passes verification is appended to
    /// the pending rule, followed by `terminator`.
    fn end_declaration(&mut self, terminator: &str) -> FilterResult<()> {
        let buffer = mem::take(&mut self.buffer);
        let skip = mem::take(&mut self.skip_declaration);
        let Some(name) = self.property.take() else {
            if !buffer.trim().is_empty() {
                debug!("{}: '{}' is not a declaration", self.stream.location(), buffer.trim());
            }
            return Ok(());
        };

        let value = buffer.trim_start_matches(is_css_whitespace);
        let space_after_colon = &buffer[..buffer.len() - value.len()];
        let value = value.trim_end_matches(is_css_whitespace);

        if skip || self.skip_rule {
            return Ok(());
        }
        let Some(entry) = lookup(&name) else {
            debug!("{}: unknown property '{name}'", self.stream.location());
            return Ok(());
        };
        let Some(value) = self.check_declaration(entry, value) else {
            return Ok(());
        };

        self.pending.push_str(&self.space_before_property);
        self.pending.push_str(&name);
        self.pending.push_str(&self.space_after_property);
        self.pending.push(':');
        self.pending.push_str(space_after_colon);
        self.pending.push_str(&value);
        self.pending.push_str(terminator);
        Ok(())
    }

    /// Verifies a declaration value and returns the text to write for it
    fn check_declaration(&self, entry: &PropertyEntry, value: &str) -> Option<String> {
        let tokens = match lexer::split(value, entry.allow_commas) {
            Ok(tokens) => tokens,
            Err(e) => {
                debug!("{}: {}: {e}", self.stream.location(), entry.name);
                return None;
            }
        };

        let (tokens, important) = tokens.split_at(tokens.len() - important_suffix(&tokens));
        let accepted = self.verifier.check_validity(entry, self.media.as_slice(), tokens)?;

        if accepted.iter().any(|t| t.changed) {
            let mut all = accepted;
            all.extend_from_slice(important);
            Some(lexer::reconstruct(&all))
        } else {
            Some(value.to_string())
        }
    }

    fn open_quote(&mut self, quote: char) {
        self.buffer.push(quote);
        self.quote = quote;
        self.state = self.state.quoted();
    }

    fn in_quote(&mut self, c: char, prev: char, escaped: bool) {
        let region = self.state.unquoted();
        match c {
            // second half of an escaped CRLF
            CHAR_LF if prev == CHAR_CR => {}
            c if is_css_newline(c) => {
                if escaped {
                    // line continuation
                    self.buffer.pop();
                } else {
                    debug!("{}: unterminated string", self.stream.location());
                    match region {
                        State::TopLevel if self.at_rule_head => self.skip_at_rule = true,
                        State::TopLevel | State::Selector => self.skip_rule = true,
                        _ => self.skip_declaration = true,
                    }
                    self.buffer.push(c);
                    self.state = region;
                }
            }
            c if c == self.quote && !escaped => {
                self.buffer.push(c);
                self.state = region;
            }
            c => self.buffer.push(c),
        }
    }

    fn finish(&mut self) -> FilterResult<()> {
        if self.state == State::Declaration && self.property.is_some() {
            self.end_declaration("")?;
        }
        if !self.skip_at_rule && !self.skip_rule {
            self.out.write_str(&self.pending)?;
        }

        let rest = self.buffer.trim_matches(is_css_whitespace);
        if rest.is_empty() || rest == "-->" {
            self.out.write_str(&self.buffer)?;
        } else {
            debug!("{}: unfinished '{rest}' dropped", self.stream.location());
        }
        Ok(())
    }
}

fn default_media(config: &FilterConfig) -> Vec<String> {
    config
        .default_media
        .iter()
        .map(|m| m.cow_to_ascii_lowercase().into_owned())
        .collect()
}

/// Text that may still grow into `<!--` or `/*` without starting a selector
fn is_comment_opener_prefix(text: &str) -> bool {
    matches!(text, "" | "/" | "<" | "<!" | "<!-" | "<!--")
}

/// Splits a construct into its leading padding, its content and its trailing whitespace.
/// The padding is whitespace, plus a `<!--` that is followed by whitespace.
fn split_padding(text: &str) -> (&str, &str, &str) {
    let mut rest = text.trim_start_matches(is_css_whitespace);
    if let Some(after) = rest.strip_prefix("<!--") {
        if after.is_empty() || after.starts_with(is_css_whitespace) {
            rest = after.trim_start_matches(is_css_whitespace);
        }
    }

    let lead = &text[..text.len() - rest.len()];
    let content = rest.trim_end_matches(is_css_whitespace);
    (lead, content, &rest[content.len()..])
}

fn strip_prefix_ignore_case<'t>(text: &'t str, prefix: &str) -> Option<&'t str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        text.get(prefix.len()..)
    } else {
        None
    }
}

/// Media names in a media list, lowercased. `None` when the list holds anything but names
/// and commas.
fn media_list(tokens: &[Token]) -> Option<Vec<String>> {
    let mut media = Vec::new();
    for token in tokens {
        match token.kind {
            TokenKind::Identifier => {
                media.push(token.decoded.cow_to_ascii_lowercase().into_owned());
            }
            TokenKind::Simple => media.extend(
                token
                    .original
                    .split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(|m| m.cow_to_ascii_lowercase().into_owned()),
            ),
            _ => return None,
        }
    }
    Some(media)
}

fn is_page_selector(token: &Token) -> bool {
    token.is_simple()
        && PAGE_SELECTORS
            .iter()
            .any(|s| token.original.eq_ignore_ascii_case(s))
}

/// Number of trailing tokens that make up an `!important` marker
fn important_suffix(tokens: &[Token]) -> usize {
    match tokens {
        [.., last] if last.is_simple() && last.original.eq_ignore_ascii_case("!important") => 1,
        [.., bang, last]
            if bang.is_simple()
                && bang.original == "!"
                && last.is_identifier()
                && last.original.eq_ignore_ascii_case("important") =>
        {
            2
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::RelativeUriCallback;
    use test_case::test_case;

    fn run_with(input: &str, config: &FilterConfig) -> FilterResult<String> {
        let mut out = String::new();
        let callback = RelativeUriCallback::new();
        CssTokenizer::new(input, &mut out, config, &callback).run()?;
        Ok(out)
    }

    fn filter(input: &str) -> String {
        run_with(input, &FilterConfig::default()).unwrap()
    }

    #[test_case("  h1 ", ("  ", "h1", " "))]
    #[test_case("<!-- h1", ("<!-- ", "h1", ""))]
    #[test_case("<!--h1", ("", "<!--h1", ""))]
    #[test_case("\n", ("\n", "", ""))]
    fn padding(text: &str, expected: (&str, &str, &str)) {
        assert_eq!(split_padding(text), expected);
    }

    #[test]
    fn media_lists() {
        let tokens = lexer::split("Screen,print , tv", false).unwrap();
        assert_eq!(
            media_list(&tokens),
            Some(vec!["screen".to_string(), "print".into(), "tv".into()])
        );
        let tokens = lexer::split("screen \"print\"", false).unwrap();
        assert_eq!(media_list(&tokens), None);
    }

    #[test_case("red !important", 1)]
    #[test_case("red ! important", 2)]
    #[test_case("red !IMPORTANT", 1)]
    #[test_case("red", 0)]
    #[test_case("important", 0)]
    fn important_marker(value: &str, len: usize) {
        let tokens = lexer::split(value, false).unwrap();
        assert_eq!(important_suffix(&tokens), len);
    }

    #[test]
    fn comments_are_removed() {
        assert_eq!(filter("/* x */h1 { color: red }"), "h1 { color: red }");
        assert_eq!(filter("h1 { color: /* x */red }"), "h1 { color: red }");
        assert_eq!(filter("h1 { color: \"/* x */\" }"), "h1 { }");
    }

    #[test]
    fn braces_inside_values_are_skipped() {
        assert_eq!(
            filter("h1 { foo: { bar; } ; color: red }"),
            "h1 { color: red }"
        );
    }

    #[test]
    fn escaped_delimiters_do_not_split() {
        assert_eq!(filter("h1 { color\\: red; color: blue }"), "h1 { color: blue }");
    }

    #[test]
    fn unterminated_string_drops_declaration() {
        assert_eq!(
            filter("h1 { font-family: \"Arial\n; color: red }"),
            "h1 { color: red }"
        );
    }

    #[test]
    fn unterminated_string_between_rules() {
        assert_eq!(
            filter("\"oops\nh1 { color: red }\nh2 { color: blue }"),
            "\nh2 { color: blue }"
        );
        assert_eq!(filter("'oops\n; h1 { color: red }"), " h1 { color: red }");
        assert_eq!(
            filter("@media screen { 'oops\n} h1 { color: red }"),
            "@media screen {\n} h1 { color: red }"
        );
        assert_eq!(filter("@import 'a.css\n{ x } h1 {}"), " h1 {}");
    }

    #[test]
    fn whitespace_around_colon_is_kept() {
        assert_eq!(filter("h1 { padding : 1em }"), "h1 { padding : 1em }");
        assert_eq!(filter("h1{color\t:\tred;}"), "h1{color\t:\tred;}");
        assert_eq!(
            filter("p { font-family :Arial,,serif }"),
            "p { font-family :Arial, serif }"
        );
    }

    #[test]
    fn nul_and_bom() {
        assert_eq!(filter("\u{feff}h1\0 { color: red }"), "\u{feff}h1 { color: red }");
        assert_eq!(filter("h1 {\u{feff} color: red }"), "h1 { color: red }");
    }

    #[test]
    fn unknown_at_rules_are_dropped() {
        assert_eq!(filter("@font-face { src: url(a.ttf) } h1 {}"), " h1 {}");
        assert_eq!(filter("@namespace foo; h1 {}"), " h1 {}");
    }

    #[test]
    fn page_rule() {
        assert_eq!(filter("@page :first { margin: 1in }"), "@page :first { margin: 1in }");
        assert_eq!(filter("@page :bogus { margin: 1in }"), "");
    }

    #[test]
    fn inline_style() {
        let config = FilterConfig {
            inline: true,
            ..FilterConfig::default()
        };
        assert_eq!(
            run_with("color: red; behavior: url(x.htc); margin: 0", &config).unwrap(),
            "color: red; margin: 0"
        );
        assert_eq!(run_with("color: red } h1 { color: blue }", &config).unwrap(), "color: red");
    }

    #[test]
    fn stop_at_charset() {
        let config = FilterConfig {
            stop_at_detected_charset: true,
            ..FilterConfig::default()
        };
        let mut out = String::new();
        let callback = RelativeUriCallback::new();
        let charset = CssTokenizer::new("@charset \"iso-8859-1\"; h1 {}", &mut out, &config, &callback)
            .run()
            .unwrap();
        assert_eq!(charset.as_deref(), Some("iso-8859-1"));

        let mut out = String::new();
        let charset = CssTokenizer::new("h1 {} @charset \"utf-8\";", &mut out, &config, &callback)
            .run()
            .unwrap();
        assert_eq!(charset, None);
    }

    #[test]
    fn charset_rule() {
        assert_eq!(filter("@charset \"utf-8\"; h1 {}"), "@charset \"utf-8\"; h1 {}");
        assert!(matches!(
            run_with("@charset \"x-bogus\";", &FilterConfig::default()),
            Err(FilterError::UnsupportedCharset(_))
        ));
        let config = FilterConfig::default().with_charset("UTF-8");
        assert!(matches!(
            run_with("@charset \"iso-8859-1\";", &config),
            Err(FilterError::CharsetMismatch { .. })
        ));
        // not the first construct
        assert_eq!(filter("h1 {} @charset \"utf-8\";"), "h1 {} ");
    }

    #[test]
    fn input_limit() {
        let config = FilterConfig {
            max_input_len: Some(8),
            ..FilterConfig::default()
        };
        assert_eq!(run_with("h1 {} h2 { color: red }", &config).unwrap(), "h1 {}");
    }
}
