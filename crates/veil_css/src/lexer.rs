//! Value lexer: splits a declaration value into typed words, decoding CSS escapes on the way.
//!
//! Every source character that is not a delimiter ends up in exactly one token's `original`,
//! so a value in which nothing changed can be written back byte for byte.
use std::borrow::Cow;
use std::fmt;

use cow_utils::CowUtils;
use veil_shared::char_stream::Character::{Ch, StreamEnd};
use veil_shared::char_stream::{is_css_newline, is_css_whitespace, CharStream, Stream, CHAR_CR, CHAR_LF};

use crate::errors::LexError;

/// Code point used for escapes that do not describe a valid character
const REPLACEMENT_CHAR: char = '\u{FFFD}';

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// A keyword or name. `decoded` holds the unescaped name.
    Identifier,
    /// A quoted string. `decoded` holds the content without the quotes.
    StringLit { quote: char },
    /// `url(...)`. `decoded` holds the address, `quote` the quote used in the source (if any).
    Url { quote: Option<char> },
    /// `attr(name)`. `decoded` holds the attribute name.
    Attr,
    /// `counter(name[, style])` or `counters(name, "sep"[, style])`. `decoded` holds the name.
    Counter {
        separator: Option<String>,
        list_style: Option<String>,
    },
    /// Anything else: numbers, dimensions, colors, unmodeled functions. Never re-encoded.
    Simple,
}

/// A single word of a declaration value
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token, escapes included
    pub original: String,
    /// Decoded value (see [`TokenKind`] for what it holds per kind)
    pub decoded: String,
    /// Set when the token must be re-encoded on output instead of copied
    pub changed: bool,
    /// Set when a delimiting comma directly followed this token
    pub post_comma: bool,
}

impl Token {
    fn new(kind: TokenKind, original: &str, decoded: &str, changed: bool) -> Self {
        Self {
            kind,
            original: original.to_string(),
            decoded: decoded.to_string(),
            changed,
            post_comma: false,
        }
    }

    /// A plain unmodeled word
    #[must_use]
    pub fn simple(original: &str) -> Self {
        Self::new(TokenKind::Simple, original, original, false)
    }

    #[must_use]
    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self.kind, TokenKind::StringLit { .. })
    }

    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.kind == TokenKind::Simple
    }

    /// Returns a copy holding a new decoded value, flagged for re-encoding
    #[must_use]
    pub fn with_decoded(&self, decoded: &str) -> Self {
        let mut token = self.clone();
        token.decoded = decoded.to_string();
        token.changed = true;
        token
    }

    /// Returns the text to write for this token: the original when nothing changed, otherwise
    /// the decoded value encoded according to the token kind.
    #[must_use]
    pub fn encode(&self) -> Cow<'_, str> {
        if !self.changed {
            return Cow::Borrowed(&self.original);
        }

        let encoded = match &self.kind {
            TokenKind::Identifier => encode_identifier(&self.decoded),
            TokenKind::StringLit { quote } => encode_string(&self.decoded, *quote),
            TokenKind::Url { quote } => {
                format!("url({})", encode_string(&self.decoded, quote.unwrap_or('"')))
            }
            TokenKind::Attr => format!("attr({})", encode_identifier(&self.decoded)),
            TokenKind::Counter {
                separator,
                list_style,
            } => {
                let mut out = String::new();
                out.push_str(if separator.is_some() { "counters(" } else { "counter(" });
                out.push_str(&encode_identifier(&self.decoded));
                if let Some(separator) = separator {
                    out.push_str(", ");
                    out.push_str(&encode_string(separator, '"'));
                }
                if let Some(list_style) = list_style {
                    out.push_str(", ");
                    out.push_str(&encode_identifier(list_style));
                }
                out.push(')');
                out
            }
            TokenKind::Simple => self.original.clone(),
        };
        Cow::Owned(encoded)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:\"{}\"", self.kind, self.original)
    }
}

fn push_escape(c: char, out: &mut String) {
    out.push_str(&format!("\\{:06x}", c as u32));
}

/// Encodes an identifier, escaping everything outside `[A-Za-z0-9_-]` as well as a leading
/// digit (also after a single leading dash).
#[must_use]
pub fn encode_identifier(decoded: &str) -> String {
    let mut out = String::with_capacity(decoded.len());
    let mut prev = None;
    for (i, c) in decoded.chars().enumerate() {
        let name_char = c.is_ascii_alphanumeric() || c == '-' || c == '_';
        let leading_digit =
            c.is_ascii_digit() && (i == 0 || (i == 1 && prev == Some('-')));
        if name_char && !leading_digit {
            out.push(c);
        } else {
            push_escape(c, &mut out);
        }
        prev = Some(c);
    }
    out
}

/// Encodes a string including its quotes. Newlines, control characters, the quote, the
/// backslash and everything outside basic latin are escaped.
#[must_use]
pub fn encode_string(decoded: &str, quote: char) -> String {
    let mut out = String::with_capacity(decoded.len() + 2);
    out.push(quote);
    for c in decoded.chars() {
        if is_css_newline(c) || c == quote || c == '\\' || (c as u32) < 32 || (c as u32) >= 0x80 {
            push_escape(c, &mut out);
        } else {
            out.push(c);
        }
    }
    out.push(quote);
    out
}

/// Rebuilds a value from its tokens: words are joined by a single space, a token followed by a
/// delimiting comma gets the comma directly attached.
#[must_use]
pub fn reconstruct(tokens: &[Token]) -> String {
    let mut out = String::new();
    for (idx, token) in tokens.iter().enumerate() {
        if idx > 0 {
            if tokens[idx - 1].post_comma {
                out.push(',');
            }
            out.push(' ');
        }
        out.push_str(&token.encode());
    }
    out
}

/// Splits a declaration value into tokens. Whitespace delimits words, and so do commas when
/// `allow_commas` is set, except inside parentheses or quoted strings.
pub fn split(input: &str, allow_commas: bool) -> Result<Vec<Token>, LexError> {
    ValueLexer::new(input, allow_commas).run()
}

/// Token under construction
#[derive(Default)]
struct Pending {
    original: String,
    decoded: String,
    changed: bool,
    /// False as soon as a character is seen that cannot be part of an identifier
    could_be_identifier: bool,
    /// Source length at the point the first string of the token was closed
    first_string_end: Option<usize>,
}

impl Pending {
    fn new() -> Self {
        Self {
            could_be_identifier: true,
            ..Default::default()
        }
    }

    fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    fn push_plain(&mut self, c: char) {
        if self.could_be_identifier {
            let first = self.original.is_empty();
            let name_char = c.is_ascii_alphabetic()
                || (c.is_ascii_digit() && !first)
                || c == '-'
                || c == '_'
                || c as u32 >= 0xA1;
            let dash_digit = self.original == "-" && c.is_ascii_digit();
            if !name_char || dash_digit {
                self.could_be_identifier = false;
            }
        }
        self.original.push(c);
        self.decoded.push(c);
    }
}

struct ValueLexer {
    stream: CharStream,
    allow_commas: bool,
    tokens: Vec<Token>,
    current: Pending,
    /// Quote character of the string we are in, if any
    quote: Option<char>,
    paren_depth: usize,
}

impl ValueLexer {
    fn new(input: &str, allow_commas: bool) -> Self {
        Self {
            stream: CharStream::new(input),
            allow_commas,
            tokens: Vec::new(),
            current: Pending::new(),
            quote: None,
            paren_depth: 0,
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        loop {
            let c = match self.stream.read_and_next() {
                Ch(c) => c,
                StreamEnd => break,
            };

            if let Some(quote) = self.quote {
                self.consume_in_string(c, quote)?;
                continue;
            }

            match c {
                c if self.paren_depth == 0 && is_css_whitespace(c) => self.flush(false)?,
                ',' if self.paren_depth == 0 && self.allow_commas => self.comma()?,
                '"' | '\'' => {
                    self.quote = Some(c);
                    self.current.could_be_identifier = false;
                    self.current.original.push(c);
                    self.current.decoded.push(c);
                }
                '\\' => self.consume_escape(false)?,
                '(' => {
                    self.paren_depth += 1;
                    self.current.could_be_identifier = false;
                    self.current.original.push(c);
                    self.current.decoded.push(c);
                }
                ')' => {
                    if self.paren_depth == 0 {
                        return Err(LexError::UnbalancedParenthesis);
                    }
                    self.paren_depth -= 1;
                    self.current.could_be_identifier = false;
                    self.current.original.push(c);
                    self.current.decoded.push(c);
                }
                c => self.current.push_plain(c),
            }
        }

        if self.quote.is_some() {
            return Err(LexError::UnterminatedString);
        }
        if self.paren_depth > 0 {
            return Err(LexError::UnbalancedParenthesis);
        }
        self.flush(false)?;
        Ok(self.tokens)
    }

    fn consume_in_string(&mut self, c: char, quote: char) -> Result<(), LexError> {
        match c {
            c if c == quote => {
                self.quote = None;
                self.current.original.push(c);
                self.current.decoded.push(c);
                if self.current.first_string_end.is_none() {
                    self.current.first_string_end = Some(self.current.original.len());
                }
            }
            '\\' => self.consume_escape(true)?,
            c if is_css_newline(c) => return Err(LexError::UnterminatedString),
            c => {
                self.current.original.push(c);
                self.current.decoded.push(c);
            }
        }
        Ok(())
    }

    /// Consumes an escape, the backslash has already been read
    fn consume_escape(&mut self, in_string: bool) -> Result<(), LexError> {
        self.current.original.push('\\');

        let c = match self.stream.read() {
            Ch(c) => c,
            StreamEnd => return Err(LexError::DanglingEscape),
        };

        if is_css_newline(c) {
            if !in_string {
                return Err(LexError::EscapedNewline);
            }
            // Line continuation: kept in the source, invisible in the decoded value
            self.stream.next();
            self.current.original.push(c);
            if c == CHAR_CR && self.stream.read() == Ch(CHAR_LF) {
                self.stream.next();
                self.current.original.push(CHAR_LF);
            }
            return Ok(());
        }

        if !c.is_ascii_hexdigit() {
            self.stream.next();
            self.current.original.push(c);
            self.current.decoded.push(c);
            return Ok(());
        }

        let mut hex = String::with_capacity(6);
        while hex.len() < 6 {
            match self.stream.read() {
                Ch(c) if c.is_ascii_hexdigit() => {
                    hex.push(c);
                    self.stream.next();
                }
                _ => break,
            }
        }
        self.current.original.push_str(&hex);

        // A single whitespace terminates the escape, CRLF counts as one
        if let Ch(ws) = self.stream.read() {
            if is_css_whitespace(ws) {
                self.stream.next();
                self.current.original.push(ws);
                if ws == CHAR_CR && self.stream.read() == Ch(CHAR_LF) {
                    self.stream.next();
                    self.current.original.push(CHAR_LF);
                }
            }
        }

        let decoded = u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .filter(|c| *c != '\0')
            .unwrap_or(REPLACEMENT_CHAR);
        if decoded == REPLACEMENT_CHAR {
            self.current.changed = true;
        }
        self.current.decoded.push(decoded);
        Ok(())
    }

    fn comma(&mut self) -> Result<(), LexError> {
        if !self.current.is_empty() {
            return self.flush(true);
        }

        match self.tokens.last_mut() {
            None => Err(LexError::LeadingComma),
            Some(last) if last.post_comma => {
                // A doubled comma is dropped on output
                log::debug!("extra comma after \"{}\" removed", last.original);
                last.changed = true;
                Ok(())
            }
            Some(last) => {
                last.post_comma = true;
                Ok(())
            }
        }
    }

    fn flush(&mut self, post_comma: bool) -> Result<(), LexError> {
        if self.current.is_empty() {
            return Ok(());
        }

        let pending = std::mem::replace(&mut self.current, Pending::new());
        let mut token = classify(pending)?;
        token.post_comma = post_comma;
        self.tokens.push(token);
        Ok(())
    }
}

/// Strips spaces and tabs around the argument of a functional notation
fn function_inner<'a>(original: &'a str, prefix_len: usize) -> &'a str {
    original[prefix_len..original.len() - 1].trim_matches([' ', '\t'])
}

fn classify(pending: Pending) -> Result<Token, LexError> {
    let original = pending.original.as_str();

    if original.starts_with(['"', '\'']) {
        if pending.first_string_end == Some(original.len()) && pending.decoded.chars().count() >= 2 {
            let mut chars = pending.decoded.chars();
            let quote = chars.next().unwrap_or('"');
            chars.next_back();
            return Ok(Token::new(
                TokenKind::StringLit { quote },
                original,
                chars.as_str(),
                pending.changed,
            ));
        }
        if original.ends_with(',') {
            return Ok(Token::simple(original));
        }
        return Err(LexError::MalformedString(original.to_string()));
    }

    if pending.could_be_identifier {
        return Ok(Token::new(
            TokenKind::Identifier,
            original,
            &pending.decoded,
            pending.changed,
        ));
    }

    let lower = original.cow_to_ascii_lowercase();
    if lower.starts_with("url(") {
        return classify_url(original);
    }
    if lower.starts_with("attr(") {
        return classify_attr(original);
    }
    if lower.starts_with("counters(") {
        return classify_counter(original, "counters(".len(), true);
    }
    if lower.starts_with("counter(") {
        return classify_counter(original, "counter(".len(), false);
    }

    Ok(Token::new(
        TokenKind::Simple,
        original,
        &pending.decoded,
        false,
    ))
}

fn classify_url(original: &str) -> Result<Token, LexError> {
    if !original.ends_with(')') {
        return Err(LexError::MalformedUrl(original.to_string()));
    }
    let inner = function_inner(original, "url(".len());
    if inner.is_empty() {
        return Err(LexError::MalformedUrl(original.to_string()));
    }

    if inner.starts_with(['"', '\'']) {
        let words = split(inner, false)?;
        return match words.as_slice() {
            [word] => match word.kind {
                TokenKind::StringLit { quote } => Ok(Token::new(
                    TokenKind::Url { quote: Some(quote) },
                    original,
                    &word.decoded,
                    word.changed,
                )),
                _ => Err(LexError::MalformedUrl(original.to_string())),
            },
            _ => Err(LexError::MalformedUrl(original.to_string())),
        };
    }

    // Unquoted: escapes are decoded, but whitespace, quotes and parentheses must be escaped.
    // The address is always written back quoted.
    let decoded = unescape(inner)?;
    if has_bare_url_delimiter(inner) {
        return Err(LexError::MalformedUrl(original.to_string()));
    }
    Ok(Token::new(TokenKind::Url { quote: None }, original, &decoded, true))
}

/// Looks for unescaped whitespace, quotes or parentheses in an unquoted url
fn has_bare_url_delimiter(text: &str) -> bool {
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let mut hex_len = 0;
                while hex_len < 6 && chars.next_if(char::is_ascii_hexdigit).is_some() {
                    hex_len += 1;
                }
                if hex_len == 0 {
                    chars.next();
                } else {
                    chars.next_if(|c| is_css_whitespace(*c));
                }
            }
            c if is_css_whitespace(c) || matches!(c, '"' | '\'' | '(' | ')') => return true,
            _ => {}
        }
    }
    false
}

/// Decodes the escapes of an unquoted word
fn unescape(text: &str) -> Result<String, LexError> {
    let mut lexer = ValueLexer::new("", false);
    lexer.stream = CharStream::new(text);
    loop {
        match lexer.stream.read_and_next() {
            Ch('\\') => lexer.consume_escape(false)?,
            Ch(c) => {
                lexer.current.original.push(c);
                lexer.current.decoded.push(c);
            }
            StreamEnd => break,
        }
    }
    Ok(lexer.current.decoded)
}

fn classify_attr(original: &str) -> Result<Token, LexError> {
    if !original.ends_with(')') {
        return Err(LexError::MalformedAttr(original.to_string()));
    }
    let inner = function_inner(original, "attr(".len());
    match single_identifier(inner) {
        Some(ident) => Ok(Token::new(
            TokenKind::Attr,
            original,
            &ident.decoded,
            ident.changed,
        )),
        None => Err(LexError::MalformedAttr(original.to_string())),
    }
}

fn single_identifier(text: &str) -> Option<Token> {
    match split(text, false).ok()?.as_slice() {
        [word] if word.is_identifier() => Some(word.clone()),
        _ => None,
    }
}

fn single_string(text: &str) -> Option<Token> {
    match split(text, false).ok()?.as_slice() {
        [word] if word.is_string() => Some(word.clone()),
        _ => None,
    }
}

/// Splits on commas that are not inside a quoted string
fn split_fields(text: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    for (idx, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (c, quote) {
            ('\\', _) => escaped = true,
            (c, Some(q)) if c == q => quote = None,
            ('"' | '\'', None) => quote = Some(c),
            (',', None) => {
                fields.push(text[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    fields.push(text[start..].trim());
    fields
}

fn classify_counter(original: &str, prefix_len: usize, plural: bool) -> Result<Token, LexError> {
    let malformed = || LexError::MalformedCounter(original.to_string());
    if !original.ends_with(')') {
        return Err(malformed());
    }
    let inner = function_inner(original, prefix_len);
    if inner.is_empty() {
        return Err(malformed());
    }

    let fields = split_fields(inner);
    let (min, max) = if plural { (2, 3) } else { (1, 2) };
    if fields.len() < min || fields.len() > max {
        return Err(malformed());
    }

    let name = single_identifier(fields[0]).ok_or_else(malformed)?;
    let separator = if plural {
        Some(single_string(fields[1]).ok_or_else(malformed)?)
    } else {
        None
    };
    let list_style = if fields.len() == max {
        Some(single_identifier(fields[max - 1]).ok_or_else(malformed)?)
    } else {
        None
    };

    let changed = name.changed
        || separator.as_ref().is_some_and(|s| s.changed)
        || list_style.as_ref().is_some_and(|s| s.changed);

    Ok(Token::new(
        TokenKind::Counter {
            separator: separator.map(|s| s.decoded),
            list_style: list_style.map(|s| s.decoded),
        },
        original,
        &name.decoded,
        changed,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind.clone()).collect()
    }

    fn originals(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.original.as_str()).collect()
    }

    #[test]
    fn split_words() {
        let tokens = split("1px  solid\tred", false).unwrap();
        assert_eq!(originals(&tokens), vec!["1px", "solid", "red"]);
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Simple, TokenKind::Identifier, TokenKind::Identifier]
        );
    }

    #[test]
    fn parentheses_keep_words_together() {
        let tokens = split("rgb(1, 2, 3) translate(1px , 2px)", true).unwrap();
        assert_eq!(originals(&tokens), vec!["rgb(1, 2, 3)", "translate(1px , 2px)"]);
        assert!(tokens.iter().all(Token::is_simple));
        assert!(!tokens[0].post_comma);
    }

    #[test]
    fn commas() {
        let tokens = split("Arial, \"Times New Roman\" ,serif", true).unwrap();
        assert_eq!(originals(&tokens), vec!["Arial", "\"Times New Roman\"", "serif"]);
        assert!(tokens[0].post_comma);
        assert!(tokens[1].post_comma);
        assert!(!tokens[2].post_comma);
        assert_eq!(tokens[1].decoded, "Times New Roman");

        let tokens = split("a,b", false).unwrap();
        assert_eq!(originals(&tokens), vec!["a,b"]);
    }

    #[test]
    fn comma_bookkeeping() {
        assert_eq!(split(", a", true), Err(LexError::LeadingComma));

        let tokens = split("a,, b", true).unwrap();
        assert_eq!(tokens.len(), 2);
        assert!(tokens[0].post_comma);
        assert!(tokens[0].changed);
        assert_eq!(reconstruct(&tokens), "a, b");
    }

    #[test_case("\\66oo", "foo"; "hex escape")]
    #[test_case("\\66 oo", "foo"; "hex escape with space")]
    #[test_case("\\000066oo", "foo"; "six digit escape")]
    #[test_case("\\66\r\noo", "foo"; "crlf terminator")]
    #[test_case("a\\:b", "a:b"; "literal escape")]
    #[test_case("\\0", "\u{FFFD}"; "null escape")]
    #[test_case("\\110000", "\u{FFFD}"; "out of range")]
    fn escapes(input: &str, decoded: &str) {
        let tokens = split(input, false).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].original, input);
        assert_eq!(tokens[0].decoded, decoded);
    }

    #[test]
    fn string_line_continuation() {
        let tokens = split("\"a\\\nb\"", false).unwrap();
        assert_eq!(tokens[0].decoded, "ab");
        assert_eq!(tokens[0].original, "\"a\\\nb\"");
    }

    #[test_case("\"abc", LexError::UnterminatedString; "unterminated")]
    #[test_case("\"a\nb\"", LexError::UnterminatedString; "raw newline")]
    #[test_case("a\\\nb", LexError::EscapedNewline; "escaped newline")]
    #[test_case("abc\\", LexError::DanglingEscape; "dangling")]
    #[test_case("rgb(1,2", LexError::UnbalancedParenthesis; "open paren")]
    #[test_case("a)", LexError::UnbalancedParenthesis; "close paren")]
    #[test_case("\"a\"b", LexError::MalformedString("\"a\"b".into()); "text after string")]
    fn errors(input: &str, expected: LexError) {
        assert_eq!(split(input, false), Err(expected));
    }

    #[test_case("foo", TokenKind::Identifier)]
    #[test_case("-foo", TokenKind::Identifier)]
    #[test_case("_x9", TokenKind::Identifier)]
    #[test_case("9x", TokenKind::Simple)]
    #[test_case("-9x", TokenKind::Simple)]
    #[test_case("10px", TokenKind::Simple)]
    #[test_case("#fff", TokenKind::Simple)]
    #[test_case("50%", TokenKind::Simple)]
    #[test_case("'x'", TokenKind::StringLit { quote: '\'' })]
    fn classification(input: &str, expected: TokenKind) {
        let tokens = split(input, false).unwrap();
        assert_eq!(kinds(&tokens), vec![expected]);
    }

    #[test]
    fn urls() {
        let tokens = split("url( \"a b.png\" )", false).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Url { quote: Some('"') });
        assert_eq!(tokens[0].decoded, "a b.png");
        assert!(!tokens[0].changed);

        let tokens = split("URL(img/x\\(1\\).png)", false).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Url { quote: None });
        assert_eq!(tokens[0].decoded, "img/x(1).png");
        assert!(tokens[0].changed);
        assert_eq!(tokens[0].encode(), "url(\"img/x(1).png\")");

        assert!(split("url()", false).is_err());
        assert!(split("url('a' 'b')", false).is_err());
        assert!(split("url(a\"b)", false).is_err());
    }

    #[test]
    fn attr() {
        let tokens = split("attr(title)", false).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Attr);
        assert_eq!(tokens[0].decoded, "title");
        assert!(split("attr(\"title\")", false).is_err());
        assert!(split("attr(a b)", false).is_err());
    }

    #[test]
    fn counters() {
        let tokens = split("counter(item) counter(item, upper-roman)", false).unwrap();
        assert_eq!(
            tokens[0].kind,
            TokenKind::Counter {
                separator: None,
                list_style: None
            }
        );
        assert_eq!(tokens[0].decoded, "item");
        assert_eq!(
            tokens[1].kind,
            TokenKind::Counter {
                separator: None,
                list_style: Some("upper-roman".into())
            }
        );

        let tokens = split("counters(item, \", \", decimal)", false).unwrap();
        assert_eq!(
            tokens[0].kind,
            TokenKind::Counter {
                separator: Some(", ".into()),
                list_style: Some("decimal".into())
            }
        );

        assert!(split("counters(item)", false).is_err());
        assert!(split("counter(item, a, b)", false).is_err());
        assert!(split("counter(\"item\")", false).is_err());
        assert!(split("counters(item, decimal)", false).is_err());
    }

    #[test]
    fn encoding() {
        assert_eq!(encode_identifier("foo-bar"), "foo-bar");
        assert_eq!(encode_identifier("1a"), "\\000031a");
        assert_eq!(encode_identifier("-1a"), "-\\000031a");
        assert_eq!(encode_identifier("a:b"), "a\\00003ab");
        assert_eq!(encode_string("it's", '\''), "'it\\000027s'");
        assert_eq!(encode_string("caf\u{e9}", '"'), "\"caf\\0000e9\"");
        assert_eq!(encode_string("a\nb", '"'), "\"a\\00000ab\"");
    }

    #[test]
    fn reconstruction() {
        let mut tokens = split("url(a.png) ,  no-repeat", true).unwrap();
        assert_eq!(reconstruct(&tokens), "url(\"a.png\"), no-repeat");

        tokens[1] = tokens[1].with_decoded("repeat");
        assert_eq!(reconstruct(&tokens), "url(\"a.png\"), repeat");
    }
}
