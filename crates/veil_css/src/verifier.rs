//! Grammar verifier: checks a lexed declaration value against the grammar of its property.
//!
//! Matching is a backtracking search over token ranges: a node either consumes exactly the
//! range it is given or fails. A successful match yields the tokens that must be replaced
//! (addresses rewritten by the uri callback); the tokens passed in are never modified.
use std::cell::Cell;
use std::ops::Range;

use cow_utils::CowUtils;
use log::{debug, error, trace};

use crate::callback::UriCallback;
use crate::colors::is_color;
use crate::grammar::{GrammarNode, ScalarKind, Special};
use crate::lexer::{self, Token, TokenKind};
use crate::registry::{registry, PropertyEntry, Registry};
use crate::values;
use crate::whitelist::{is_specific_family, is_valid_name, GENERIC_FONTS, GENERIC_VOICES, LIST_STYLE_TYPES};

/// Keywords every property accepts as its complete value
const CSS_WIDE_KEYWORDS: &[&str] = &["initial", "inherit", "unset"];

/// Words that may not appear in an unquoted family name
const RESERVED_FAMILY_WORDS: &[&str] = &["initial", "inherit", "unset", "default"];

const CONTENT_KEYWORDS: &[&str] = &["open-quote", "close-quote", "no-open-quote", "no-close-quote"];

/// Replacement tokens, by index into the matched token list
pub type Rewrites = Vec<(usize, Token)>;

pub struct Verifier<'a> {
    registry: &'a Registry,
    callback: &'a dyn UriCallback,
    /// Index of the last token of the comma separated group currently being matched. Only that
    /// token may carry a delimiting comma.
    group_end: Cell<Option<usize>>,
}

impl<'a> Verifier<'a> {
    /// Creates a verifier over the process wide registry
    #[must_use]
    pub fn new(callback: &'a dyn UriCallback) -> Self {
        Self::with_registry(registry(), callback)
    }

    #[must_use]
    pub fn with_registry(registry: &'a Registry, callback: &'a dyn UriCallback) -> Self {
        Self {
            registry,
            callback,
            group_end: Cell::new(None),
        }
    }

    /// Checks the value of a declaration. Returns the tokens to write when the value is
    /// acceptable for the property under any of the given media, `None` when the declaration
    /// must be dropped.
    pub fn check_validity<S: AsRef<str>>(
        &self,
        entry: &PropertyEntry,
        media: &[S],
        tokens: &[Token],
    ) -> Option<Vec<Token>> {
        if let Some(group) = entry.media {
            if !group.allows_any(media) {
                debug!("{}: not applicable to the current media", entry.name);
                return None;
            }
        }

        let Some(last) = tokens.last() else {
            debug!("{}: empty value", entry.name);
            return None;
        };
        if last.post_comma {
            debug!("{}: value ends with a comma", entry.name);
            return None;
        }

        if let [token] = tokens {
            if token.is_identifier()
                && CSS_WIDE_KEYWORDS
                    .iter()
                    .any(|k| token.decoded.eq_ignore_ascii_case(k))
            {
                return Some(tokens.to_vec());
            }
        }

        let Some(rewrites) = self.matches(&entry.grammar, tokens) else {
            debug!(
                "{}: '{}' does not match {}",
                entry.name,
                lexer::reconstruct(tokens),
                entry.grammar
            );
            return None;
        };
        trace!("{}: matched with {} rewrite(s)", entry.name, rewrites.len());

        let mut accepted = tokens.to_vec();
        for (idx, token) in rewrites {
            if let Some(slot) = accepted.get_mut(idx) {
                *slot = token;
            }
        }
        Some(accepted)
    }

    /// Matches the complete token list against a grammar
    pub fn matches(&self, grammar: &GrammarNode, tokens: &[Token]) -> Option<Rewrites> {
        self.group_end.set(None);
        self.match_node(grammar, tokens, 0..tokens.len())
    }

    fn match_node(&self, node: &GrammarNode, tokens: &[Token], range: Range<usize>) -> Option<Rewrites> {
        match node {
            GrammarNode::Literal(words) => {
                let token = self.single(tokens, range)?;
                let text = match token.kind {
                    TokenKind::Identifier => &token.decoded,
                    TokenKind::Simple => &token.original,
                    _ => return None,
                };
                words
                    .iter()
                    .any(|word| word.eq_ignore_ascii_case(text))
                    .then(Vec::new)
            }
            GrammarNode::Scalar(kind) => {
                let idx = range.start;
                let token = self.single(tokens, range)?;
                self.match_scalar(*kind, idx, token)
            }
            GrammarNode::Special(special) => self.match_special(*special, tokens, range),
            GrammarNode::Ref(name) => match self.registry.rule(name) {
                Some(rule) => self.match_node(rule, tokens, range),
                None => {
                    error!("grammar refers to unknown rule '{name}'");
                    None
                }
            },
            GrammarNode::Sequence(nodes) => self.match_sequence(nodes, tokens, range),
            GrammarNode::DoubleBar(nodes) => self.match_any_order(nodes, tokens, range, 0, false),
            GrammarNode::AllOf(nodes) => self.match_any_order(nodes, tokens, range, 0, true),
            GrammarNode::Alternatives(nodes) => nodes
                .iter()
                .find_map(|node| self.match_node(node, tokens, range.clone())),
            GrammarNode::Optional(node) => {
                if range.is_empty() {
                    Some(Vec::new())
                } else {
                    self.match_node(node, tokens, range)
                }
            }
            GrammarNode::Repeat {
                node,
                lo,
                hi,
                slot_lo,
                slot_hi,
            } => self.match_repeat(node, (*lo, *hi), (*slot_lo, *slot_hi), tokens, range, 0),
            GrammarNode::CommaList { node, lo, hi } => {
                self.match_comma_list(node, (*lo, *hi), tokens, range)
            }
        }
    }

    /// The only token of a one token range. A delimiting comma after it is allowed only when it
    /// closes the current comma group.
    fn single<'t>(&self, tokens: &'t [Token], range: Range<usize>) -> Option<&'t Token> {
        if range.len() != 1 {
            return None;
        }
        let token = tokens.get(range.start)?;
        if token.post_comma && self.group_end.get() != Some(range.start) {
            return None;
        }
        Some(token)
    }

    fn match_sequence(&self, nodes: &[GrammarNode], tokens: &[Token], range: Range<usize>) -> Option<Rewrites> {
        let Some((first, rest)) = nodes.split_first() else {
            return range.is_empty().then(Vec::new);
        };
        if rest.is_empty() {
            return self.match_node(first, tokens, range);
        }

        for split in range.start..=range.end {
            let Some(mut rewrites) = self.match_node(first, tokens, range.start..split) else {
                continue;
            };
            if let Some(tail) = self.match_sequence(rest, tokens, split..range.end) {
                rewrites.extend(tail);
                return Some(rewrites);
            }
        }
        None
    }

    /// `||` and `&&`: every component at most once, in any order. `used` is the bitmask of the
    /// components already placed.
    fn match_any_order(
        &self,
        nodes: &[GrammarNode],
        tokens: &[Token],
        range: Range<usize>,
        used: u64,
        require_all: bool,
    ) -> Option<Rewrites> {
        if nodes.len() > u64::BITS as usize {
            return None;
        }

        if range.is_empty() {
            if !require_all {
                return (used != 0).then(Vec::new);
            }
            // components left over must be satisfied by nothing
            let mut rewrites = Vec::new();
            for (idx, node) in nodes.iter().enumerate() {
                if used & (1 << idx) == 0 {
                    rewrites.extend(self.match_node(node, tokens, range.clone())?);
                }
            }
            return Some(rewrites);
        }

        for (idx, node) in nodes.iter().enumerate() {
            if used & (1 << idx) != 0 {
                continue;
            }
            for split in range.start + 1..=range.end {
                let Some(mut rewrites) = self.match_node(node, tokens, range.start..split) else {
                    continue;
                };
                if let Some(tail) =
                    self.match_any_order(nodes, tokens, split..range.end, used | (1 << idx), require_all)
                {
                    rewrites.extend(tail);
                    return Some(rewrites);
                }
            }
        }
        None
    }

    fn match_repeat(
        &self,
        node: &GrammarNode,
        (lo, hi): (usize, usize),
        (slot_lo, slot_hi): (usize, usize),
        tokens: &[Token],
        range: Range<usize>,
        count: usize,
    ) -> Option<Rewrites> {
        if range.is_empty() {
            return (count >= lo).then(Vec::new);
        }
        if count >= hi {
            return None;
        }

        let longest = slot_hi.min(range.len());
        for claim in (slot_lo..=longest).rev() {
            let split = range.start + claim;
            let Some(mut rewrites) = self.match_node(node, tokens, range.start..split) else {
                continue;
            };
            if let Some(tail) =
                self.match_repeat(node, (lo, hi), (slot_lo, slot_hi), tokens, split..range.end, count + 1)
            {
                rewrites.extend(tail);
                return Some(rewrites);
            }
        }
        None
    }

    /// Splits the range after every token followed by a comma, and matches each group
    fn match_comma_list(
        &self,
        node: &GrammarNode,
        (lo, hi): (usize, usize),
        tokens: &[Token],
        range: Range<usize>,
    ) -> Option<Rewrites> {
        let mut groups = Vec::new();
        let mut start = range.start;
        for idx in range.clone() {
            if tokens.get(idx)?.post_comma {
                groups.push(start..idx + 1);
                start = idx + 1;
            }
        }
        if start < range.end {
            groups.push(start..range.end);
        } else if !range.is_empty() && self.group_end.get() != Some(range.end - 1) {
            return None;
        }

        if !(lo..=hi).contains(&groups.len()) {
            return None;
        }

        let outer = self.group_end.get();
        let result = groups.into_iter().try_fold(Vec::new(), |mut rewrites, group| {
            self.group_end.set(Some(group.end - 1));
            rewrites.extend(self.match_node(node, tokens, group)?);
            Some(rewrites)
        });
        self.group_end.set(outer);
        result
    }

    fn match_scalar(&self, kind: ScalarKind, idx: usize, token: &Token) -> Option<Rewrites> {
        let text = token.original.as_str();
        let simple = token.is_simple();

        let accepted = match kind {
            ScalarKind::Uri => return self.match_uri(idx, token),
            ScalarKind::Integer => simple && values::is_integer(text),
            ScalarKind::Real => simple && values::is_number(text),
            ScalarKind::Percentage => simple && values::is_percentage(text),
            ScalarKind::Length => simple && values::is_length(text),
            ScalarKind::Angle => simple && values::is_angle(text),
            ScalarKind::Time => simple && values::is_time(text),
            ScalarKind::Frequency => simple && values::is_frequency(text),
            ScalarKind::Shape => simple && values::is_shape(text),
            ScalarKind::Transform => simple && values::is_transform(text),
            ScalarKind::Color => match token.kind {
                TokenKind::Simple => is_color(text),
                TokenKind::Identifier => is_color(&token.decoded),
                _ => false,
            },
            ScalarKind::String => token.is_string(),
            ScalarKind::Identifier => token.is_identifier(),
            ScalarKind::IdSelector => simple && text.strip_prefix('#').is_some_and(is_valid_name),
        };
        accepted.then(Vec::new)
    }

    /// Hands the address of a `url()` token to the callback
    fn match_uri(&self, idx: usize, token: &Token) -> Option<Rewrites> {
        if !matches!(token.kind, TokenKind::Url { .. }) {
            return None;
        }

        match self.callback.process_uri(&token.decoded, None) {
            Ok(uri) if uri == token.decoded => Some(Vec::new()),
            Ok(uri) => Some(vec![(idx, token.with_decoded(&uri))]),
            Err(e) => {
                debug!("url dropped: {e}");
                None
            }
        }
    }

    fn match_special(&self, special: Special, tokens: &[Token], range: Range<usize>) -> Option<Rewrites> {
        match special {
            Special::ContentItem => {
                let idx = range.start;
                let token = self.single(tokens, range)?;
                self.match_content_item(idx, token)
            }
            Special::FontPart => self.match_font_part(tokens.get(range)?),
            Special::FontFamily => self.match_families(tokens, range, GENERIC_FONTS),
            Special::VoiceFamily => self.match_families(tokens, range, GENERIC_VOICES),
        }
    }

    fn match_content_item(&self, idx: usize, token: &Token) -> Option<Rewrites> {
        match &token.kind {
            TokenKind::Identifier => CONTENT_KEYWORDS
                .iter()
                .any(|k| token.decoded.eq_ignore_ascii_case(k))
                .then(Vec::new),
            TokenKind::StringLit { .. } | TokenKind::Attr => Some(Vec::new()),
            TokenKind::Counter { list_style, .. } => list_style
                .as_deref()
                .map_or(true, |style| LIST_STYLE_TYPES.contains(&style.cow_to_ascii_lowercase().as_ref()))
                .then(Vec::new),
            TokenKind::Url { .. } => self.match_uri(idx, token),
            TokenKind::Simple => None,
        }
    }

    /// The `font-size[/line-height]` part of the `font` shorthand, possibly spread over up to
    /// three tokens (`12px/2`, `12px /2`, `12px / 2`)
    fn match_font_part(&self, tokens: &[Token]) -> Option<Rewrites> {
        if tokens.is_empty()
            || tokens.len() > 3
            || tokens
                .iter()
                .any(|t| t.post_comma || !(t.is_simple() || t.is_identifier()))
        {
            return None;
        }

        let joined: String = tokens.iter().map(|t| t.original.as_str()).collect();
        let (size, line_height) = match joined.split_once('/') {
            Some((size, line_height)) => (size, Some(line_height)),
            None if tokens.len() == 1 => (joined.as_str(), None),
            None => return None,
        };

        let size_tokens = lexer::split(size, false).ok()?;
        let size_rule = self.registry.rule("font-size")?;
        let outer = self.group_end.replace(None);
        let size_matched = self
            .match_node(size_rule, &size_tokens, 0..size_tokens.len())
            .is_some();
        self.group_end.set(outer);

        (size_matched && line_height.map_or(true, is_line_height)).then(Vec::new)
    }

    /// A comma separated list of family names. Names may be quoted, or unquoted and made of
    /// several words.
    fn match_families(&self, tokens: &[Token], range: Range<usize>, generic: &[&str]) -> Option<Rewrites> {
        if range.is_empty() {
            return None;
        }
        let last = range.end - 1;
        if tokens.get(last)?.post_comma && self.group_end.get() != Some(last) {
            return None;
        }

        let mut run = Vec::new();
        for token in tokens.get(range)? {
            run.push(token);
            if token.post_comma {
                if !is_family(&run, generic) {
                    return None;
                }
                run.clear();
            }
        }
        if !run.is_empty() && !is_family(&run, generic) {
            return None;
        }
        Some(Vec::new())
    }
}

fn is_line_height(value: &str) -> bool {
    value.eq_ignore_ascii_case("normal")
        || values::is_number(value)
        || values::is_length(value)
        || values::is_percentage(value)
}

fn is_family(run: &[&Token], generic: &[&str]) -> bool {
    match run {
        [token] if token.is_string() => is_specific_family(&token.decoded),
        _ if run.iter().all(|t| t.is_identifier()) => {
            let reserved = run.iter().any(|t| {
                RESERVED_FAMILY_WORDS
                    .iter()
                    .any(|w| t.decoded.eq_ignore_ascii_case(w))
            });
            if reserved {
                return false;
            }
            if let [token] = run {
                if generic.iter().any(|g| token.decoded.eq_ignore_ascii_case(g)) {
                    return true;
                }
            }
            let name = run
                .iter()
                .map(|t| t.decoded.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            is_specific_family(&name)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::{RejectAllCallback, RelativeUriCallback};
    use crate::errors::UriError;
    use crate::grammar::compile;
    use crate::registry::lookup;
    use test_case::test_case;

    fn check_with(property: &str, value: &str, callback: &dyn UriCallback, media: &[&str]) -> Option<String> {
        let entry = lookup(property).expect("known property");
        let tokens = lexer::split(value, entry.allow_commas).ok()?;
        Verifier::new(callback)
            .check_validity(entry, media, &tokens)
            .map(|tokens| lexer::reconstruct(&tokens))
    }

    fn check(property: &str, value: &str) -> Option<String> {
        check_with(property, value, &RelativeUriCallback::new(), &["screen"])
    }

    #[test_case("color", "red", true)]
    #[test_case("color", "#ff0000", true)]
    #[test_case("color", "RED", true)]
    #[test_case("color", "rgb(255, 0, 0)", true)]
    #[test_case("color", "bogus", false)]
    #[test_case("color", "red blue", false)]
    #[test_case("width", "10px", true)]
    #[test_case("width", "0", true)]
    #[test_case("width", "auto", true)]
    #[test_case("width", "10", false)]
    #[test_case("margin", "1px 2px 3px 4px", true)]
    #[test_case("margin", "1px 2px 3px 4px 5px", false)]
    #[test_case("margin", "1px auto", true)]
    #[test_case("background-position", "left top", true)]
    #[test_case("background-position", "top left", true)]
    #[test_case("background-position", "top top", false)]
    #[test_case("background-position", "10% 20%", true)]
    #[test_case("background-position", "left top, center", true)]
    #[test_case("border", "1px solid red", true)]
    #[test_case("border", "red solid 1px", true)]
    #[test_case("border", "solid solid", false)]
    #[test_case("clip", "rect(1px, 2px, 3px, 4px)", true)]
    #[test_case("counter-reset", "chapter 1 section", true)]
    #[test_case("quotes", "'<' '>'", true)]
    #[test_case("quotes", "'<' '>' '['", false)]
    #[test_case("opacity", "0.5", true)]
    fn grammar(property: &str, value: &str, valid: bool) {
        assert_eq!(check(property, value).is_some(), valid, "{property}: {value}");
    }

    #[test_case("inherit")]
    #[test_case("initial")]
    #[test_case("UNSET")]
    fn css_wide_keywords(value: &str) {
        assert_eq!(check("margin", value).as_deref(), Some(value));
    }

    #[test]
    fn css_wide_keywords_only_alone() {
        assert_eq!(check("margin", "inherit 1px"), None);
    }

    #[test]
    fn trailing_comma_is_rejected() {
        assert_eq!(check("background-position", "left top,"), None);
        assert_eq!(check("font-family", "Arial,"), None);
    }

    #[test]
    fn comma_outside_of_a_list_is_rejected() {
        assert_eq!(check("box-shadow", "1px, 1px red"), None);
        assert!(check("box-shadow", "1px 1px red, inset 2px 2px 4px blue").is_some());
    }

    #[test]
    fn media_gate() {
        let cb = RelativeUriCallback::new();
        assert_eq!(check_with("azimuth", "left", &cb, &["screen"]), None);
        assert!(check_with("azimuth", "left", &cb, &["speech"]).is_some());
        assert!(check_with("color", "red", &cb, &["all"]).is_some());
        assert_eq!(check_with("color", "red", &cb, &["speech"]), None);
    }

    #[test]
    fn urls_go_through_the_callback() {
        assert!(check("background", "url(img/x.png) no-repeat").is_some());
        assert_eq!(check("background", "url(http://evil.example/x.png)"), None);
        assert_eq!(
            check_with("background-image", "url('a.png')", &RejectAllCallback, &["screen"]),
            None
        );
    }

    #[test]
    fn rewritten_urls_replace_the_token() {
        let proxy = |uri: &str, _: Option<&str>| -> Result<String, UriError> { Ok(format!("/p?u={uri}")) };
        assert_eq!(
            check_with("background-image", "url(\"a.png\"), none", &proxy, &["screen"]).as_deref(),
            Some("url(\"/p?u=a.png\"), none")
        );
    }

    #[test_case("12px Arial", true)]
    #[test_case("italic bold 12px/30px Georgia, serif", true)]
    #[test_case("12px / 1.5 \"Times New Roman\", serif", true)]
    #[test_case("bold 12px/normal Times New Roman", true)]
    #[test_case("caption", true)]
    #[test_case("12px", false)]
    #[test_case("Arial", false)]
    #[test_case("12px/ Arial", false)]
    #[test_case("12px inherit", false)]
    fn font_shorthand(value: &str, valid: bool) {
        assert_eq!(check("font", value).is_some(), valid, "{value}");
    }

    #[test_case("Arial", true)]
    #[test_case("Times New Roman, serif", true)]
    #[test_case("'Gill Sans', sans-serif", true)]
    #[test_case("serif, , monospace", true)]
    #[test_case("Arial, 12px", false)]
    #[test_case("default", false)]
    #[test_case("Arial 12px", false)]
    #[test_case("'evil\\3b\\7d'", false)]
    fn font_family(value: &str, valid: bool) {
        assert_eq!(check("font-family", value).is_some(), valid, "{value}");
    }

    #[test]
    fn voice_family() {
        let cb = RelativeUriCallback::new();
        assert!(check_with("voice-family", "Paul, male", &cb, &["aural"]).is_some());
        assert!(check_with("voice-family", "child", &cb, &["speech"]).is_some());
        assert_eq!(check_with("voice-family", "male, inherit", &cb, &["aural"]), None);
        assert_eq!(check_with("voice-family", "male", &cb, &["screen"]), None);
    }

    #[test_case("\"a\" counter(item) \". \"", true)]
    #[test_case("counters(item, \".\", lower-roman)", true)]
    #[test_case("counter(item, bogus)", false)]
    #[test_case("attr(title)", true)]
    #[test_case("open-quote \"x\" close-quote", true)]
    #[test_case("url(icon.png)", true)]
    #[test_case("url(http://evil.example/)", false)]
    #[test_case("none", true)]
    #[test_case("none \"x\"", false)]
    #[test_case("12px", false)]
    fn content(value: &str, valid: bool) {
        assert_eq!(check("content", value).is_some(), valid, "{value}");
    }

    #[test]
    fn any_order_requires_every_component_once() {
        let grammar = compile("a && b && c?", &|_| false).unwrap();
        let verifier = Verifier::new(&RejectAllCallback);
        let run = |value: &str| verifier.matches(&grammar, &lexer::split(value, false).unwrap());

        assert!(run("a b").is_some());
        assert!(run("b c a").is_some());
        assert!(run("a").is_none());
        assert!(run("a b a").is_none());
    }

    #[test]
    fn repeat_slots() {
        let grammar = compile("[<length> <color>?]{1,2}[1,2]", &|_| false).unwrap();
        let verifier = Verifier::new(&RejectAllCallback);
        let run = |value: &str| verifier.matches(&grammar, &lexer::split(value, false).unwrap());

        assert!(run("1px red 2px").is_some());
        assert!(run("1px 2px blue").is_some());
        assert!(run("1px 2px 3px").is_none());
        assert!(run("").is_none());
    }
}
