//! Static whitelists: media types, element names, pseudo-classes and the name/string syntax
//! checks that selectors rely on.
use std::collections::HashSet;

use cow_utils::CowUtils;
use lazy_static::lazy_static;
use veil_shared::char_stream::{is_css_newline, is_css_whitespace, CHAR_CR, CHAR_LF};

use crate::values::is_nth;

/// Upper bound for open ended repetitions in property grammars
pub const UPPER_LIMIT: usize = 10;

/// Every media type we know of
pub const MEDIA: &[&str] = &[
    "all", "aural", "braille", "embossed", "handheld", "print", "projection", "screen", "speech",
    "tty", "tv",
];

/// Groups of media types a property can be restricted to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaGroup {
    All,
    Visual,
    Aural,
    VisualPaged,
    VisualInteractive,
}

impl MediaGroup {
    /// Media types in this group
    #[must_use]
    pub fn media(&self) -> &'static [&'static str] {
        match self {
            MediaGroup::All => MEDIA,
            MediaGroup::Visual => &["handheld", "print", "projection", "screen", "tty", "tv"],
            MediaGroup::Aural => &["speech", "aural"],
            MediaGroup::VisualPaged => &[
                "embossed", "handheld", "print", "projection", "screen", "tty", "tv",
            ],
            MediaGroup::VisualInteractive => &[
                "braille", "handheld", "print", "projection", "screen", "speech", "tty", "tv",
            ],
        }
    }

    /// Returns true when any of the given (lowercase) media is part of this group. `all` is
    /// a member of every group.
    #[must_use]
    pub fn allows_any<S: AsRef<str>>(&self, media: &[S]) -> bool {
        media.iter().any(|m| {
            let m = m.as_ref();
            m == "all" || self.media().contains(&m)
        })
    }
}

/// Returns true for a known media type (case-insensitive)
#[must_use]
pub fn is_media(name: &str) -> bool {
    let name = name.trim().cow_to_ascii_lowercase();
    MEDIA.contains(&name.as_ref())
}

lazy_static! {
    /// Element names that may appear in a type selector
    pub static ref HTML_ELEMENTS: HashSet<&'static str> = [
        "a", "abbr", "acronym", "address", "area", "article", "aside", "audio", "b", "base",
        "basefont", "bdi", "bdo", "bgsound", "big", "blockquote", "body", "br", "button",
        "caption", "center", "cite", "code", "col", "colgroup", "command", "dd", "del", "details",
        "dfn", "dir", "div", "dl", "dt", "em", "embed", "event-source", "fieldset", "figcaption",
        "figure", "font", "footer", "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5", "h6",
        "head", "header", "hgroup", "hr", "html", "i", "iframe", "img", "input", "ins", "isindex",
        "kbd", "keygen", "label", "legend", "li", "link", "listing", "main", "map", "mark", "menu",
        "meta", "nav", "noframes", "noscript", "ol", "optgroup", "option", "p", "param",
        "plaintext", "pre", "q", "s", "samp", "script", "section", "select", "small", "source",
        "spacer", "span", "strike", "strong", "style", "sub", "summary", "sup", "table", "tbody",
        "td", "textarea", "tfoot", "th", "thead", "time", "title", "tr", "tt", "u", "ul", "var",
        "video", "wbr", "xmp",
        // MathML
        "math", "maligngroup", "malignmark", "menclose", "mfenced", "mfrac", "mglyph", "mi",
        "mlongdiv", "mn", "mo", "mover", "mpadded", "mrow", "ms", "mscarries", "mscarry",
        "msgroup", "msline", "mspace", "msqrt", "msrow", "mstack", "mstyle", "msub", "msup",
        "mtable", "mtd", "mtext", "mtr", "munder", "munderover",
    ]
    .into_iter()
    .collect();

    /// Pseudo-classes (and CSS2 pseudo-elements) allowed in selectors
    pub static ref PSEUDO_CLASSES: HashSet<&'static str> = [
        "first-child", "last-child", "nth-child", "nth-last-child", "nth-of-type",
        "nth-last-of-type", "link", "visited", "hover", "active", "focus", "lang", "first-line",
        "first-letter", "before", "after", "target",
    ]
    .into_iter()
    .collect();

    /// Languages accepted by `:lang()`
    pub static ref LANGUAGES: HashSet<&'static str> = [
        "az", "be", "bg", "cs", "de", "el", "en", "es", "fi", "fr", "id", "it", "ja", "ka", "kk",
        "ky", "lv", "mo", "nl", "no", "pl", "pt", "ro", "ru", "sv", "tl", "tr", "tt", "uk",
        "zh-hans", "zh-hant",
    ]
    .into_iter()
    .collect();
}

/// Pseudo-classes that could leak browsing history. Selectors using them are removed.
pub const BANNED_PSEUDO_CLASSES: &[&str] = &["visited"];

/// Pseudo-elements that may be written with a double colon
const PSEUDO_ELEMENTS: &[&str] = &["first-line", "first-letter", "before", "after"];

/// Generic font family keywords
pub const GENERIC_FONTS: &[&str] = &["serif", "sans-serif", "cursive", "fantasy", "monospace"];

/// Generic voice family keywords
pub const GENERIC_VOICES: &[&str] = &["male", "female", "child"];

/// List style types, also accepted as the style argument of `counter()`
pub const LIST_STYLE_TYPES: &[&str] = &[
    "disc", "circle", "square", "decimal", "decimal-leading-zero", "lower-roman", "upper-roman",
    "lower-greek", "lower-latin", "upper-latin", "armenian", "georgian", "lower-alpha",
    "upper-alpha", "none",
];

/// Returns true for a whitelisted element name (case-insensitive)
#[must_use]
pub fn is_html_element(name: &str) -> bool {
    HTML_ELEMENTS.contains(name.cow_to_ascii_lowercase().as_ref())
}

/// Class and id names: a letter followed by letters, digits and `_:.-`
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-'))
}

/// Checks an identifier in its encoded form: escapes must be well formed, digits may not start
/// the identifier (also not after leading dashes) and only name characters are allowed.
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    let chars: Vec<char> = name.chars().collect();
    let mut seen_name_char = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            i += 1;
            let Some(&next) = chars.get(i) else {
                return false;
            };
            if is_css_newline(next) {
                return false;
            }
            if next.is_ascii_hexdigit() {
                let mut len = 0;
                while len < 6 && chars.get(i).is_some_and(char::is_ascii_hexdigit) {
                    i += 1;
                    len += 1;
                }
                if chars.get(i) == Some(&CHAR_CR) && chars.get(i + 1) == Some(&CHAR_LF) {
                    i += 2;
                } else if chars.get(i).is_some_and(|c| is_css_whitespace(*c)) {
                    i += 1;
                }
            } else {
                i += 1;
            }
            seen_name_char = true;
            continue;
        }

        let allowed = match c {
            '-' => true,
            '0'..='9' => seen_name_char,
            '_' => true,
            c if c.is_ascii_alphabetic() => true,
            c if c as u32 >= 0xA1 && !c.is_control() => true,
            _ => false,
        };
        if !allowed {
            return false;
        }
        if c != '-' {
            seen_name_char = true;
        }
        i += 1;
    }

    !chars.is_empty()
}

/// Checks the content of a quoted string (without its quotes) in its encoded form: no bare
/// quote of the given kind, no bare newline and no dangling escape.
#[must_use]
pub fn is_valid_string(content: &str, quote: char) -> bool {
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                None => return false,
                Some(CHAR_CR) => {
                    chars.next_if_eq(&CHAR_LF);
                }
                Some(_) => {}
            },
            c if is_css_newline(c) => return false,
            c if c == quote => return false,
            _ => {}
        }
    }
    true
}

/// Checks a complete quoted string, quotes included
#[must_use]
pub fn is_valid_quoted_string(value: &str) -> bool {
    let mut chars = value.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open), Some(close)) if open == close && (open == '"' || open == '\'') => {
            is_valid_string(chars.as_str(), open)
        }
        _ => false,
    }
}

/// Removes one pair of matching outer quotes, if present
#[must_use]
pub fn remove_outer_quotes(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Returns the argument of `name(arg)`, without surrounding quotes
fn pseudo_class_arg<'a>(pseudo: &'a str, name: &str) -> Option<&'a str> {
    let rest = pseudo.strip_prefix(name)?.trim_start();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    Some(remove_outer_quotes(inner))
}

fn is_valid_single_pseudo_class(pseudo: &str) -> bool {
    let pseudo = pseudo.cow_to_ascii_lowercase();
    if PSEUDO_CLASSES.contains(pseudo.as_ref()) {
        return true;
    }

    if let Some(lang) = pseudo_class_arg(&pseudo, "lang") {
        return LANGUAGES.contains(lang);
    }

    ["nth-child", "nth-last-child", "nth-of-type", "nth-last-of-type"]
        .iter()
        .any(|name| pseudo_class_arg(&pseudo, name).is_some_and(is_nth))
}

/// Checks a (possibly chained) pseudo-class, given without its leading colon:
/// `hover`, `first-child:hover`, `lang(en)`, `nth-child(2n+1)`, `:before`.
#[must_use]
pub fn is_valid_pseudo_class(pseudo: &str) -> bool {
    let parts: Vec<&str> = pseudo.split(':').collect();
    for (idx, part) in parts.iter().enumerate() {
        if part.is_empty() {
            // `::name` is only allowed for pseudo-elements
            let next = parts.get(idx + 1).map(|p| p.cow_to_ascii_lowercase());
            match next {
                Some(next) if PSEUDO_ELEMENTS.contains(&next.as_ref()) => continue,
                _ => return false,
            }
        }
        if !is_valid_single_pseudo_class(part) {
            return false;
        }
    }
    true
}

/// Returns true when any part of a chained pseudo-class is banned
#[must_use]
pub fn is_banned_pseudo_class(pseudo: &str) -> bool {
    pseudo.split(':').any(|part| {
        let part = part.trim().cow_to_ascii_lowercase();
        BANNED_PSEUDO_CLASSES.contains(&part.as_ref())
    })
}

/// A specific (non generic) font or voice family name
#[must_use]
pub fn is_specific_family(name: &str) -> bool {
    !name.trim().is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, ' ' | '.' | '_' | '-' | ',' | '+' | '~'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_media() {
        assert!(is_media("screen"));
        assert!(is_media("PRINT"));
        assert!(!is_media("tvvv"));
        assert!(MediaGroup::Visual.allows_any(&["screen"]));
        assert!(!MediaGroup::Visual.allows_any(&["speech"]));
        assert!(MediaGroup::Aural.allows_any(&["all"]));
        assert!(MediaGroup::VisualInteractive.allows_any(&["braille", "speech"]));
    }

    #[test_case("foo", true)]
    #[test_case("-foo", true)]
    #[test_case("foo2", true)]
    #[test_case("_x", true)]
    #[test_case("2foo", false)]
    #[test_case("-2foo", false)]
    #[test_case("f\\6f o", true)]
    #[test_case("\\31 0", true)]
    #[test_case("a\\:b", true)]
    #[test_case("a b", false)]
    #[test_case("a\\", false)]
    #[test_case("a\\\nb", false)]
    #[test_case("caf\u{e9}", true)]
    #[test_case("", false)]
    fn test_identifier(value: &str, expected: bool) {
        assert_eq!(is_valid_identifier(value), expected);
    }

    #[test_case("\"abc\"", true)]
    #[test_case("'it\\'s'", true)]
    #[test_case("\"a'b\"", true)]
    #[test_case("\"a\\\nb\"", true)]
    #[test_case("\"a\nb\"", false)]
    #[test_case("\"a\"b\"", false)]
    #[test_case("\"a\\\"", false)]
    #[test_case("\"abc'", false)]
    #[test_case("abc", false)]
    fn test_quoted_string(value: &str, expected: bool) {
        assert_eq!(is_valid_quoted_string(value), expected);
    }

    #[test_case("hover", true)]
    #[test_case("first-child:hover", true)]
    #[test_case("FOCUS", true)]
    #[test_case("lang(en)", true)]
    #[test_case("lang(\"fr\")", true)]
    #[test_case("lang(xx)", false)]
    #[test_case("nth-child(2n+1)", true)]
    #[test_case("nth-of-type(odd)", true)]
    #[test_case("nth-child(2n + 1)", false)]
    #[test_case(":before", true)]
    #[test_case(":hover", false)]
    #[test_case("checked", false)]
    #[test_case("", false)]
    fn test_pseudo_class(value: &str, expected: bool) {
        assert_eq!(is_valid_pseudo_class(value), expected);
    }

    #[test]
    fn test_banned_pseudo_class() {
        assert!(is_banned_pseudo_class("visited"));
        assert!(is_banned_pseudo_class("hover:Visited"));
        assert!(!is_banned_pseudo_class("hover"));
    }

    #[test]
    fn test_names() {
        assert!(is_valid_name("main-nav_2:x.y"));
        assert!(!is_valid_name("2col"));
        assert!(!is_valid_name("a$b"));
        assert!(is_html_element("H1"));
        assert!(!is_html_element("badtag123"));
        assert!(is_specific_family("Times New Roman"));
        assert!(!is_specific_family("evil;font"));
        assert_eq!(remove_outer_quotes("'UTF-8'"), "UTF-8");
        assert_eq!(remove_outer_quotes("UTF-8"), "UTF-8");
    }
}
