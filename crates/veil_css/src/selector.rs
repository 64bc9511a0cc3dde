//! Selector validation. A selector group is accepted only when every selector in it is made of
//! whitelisted elements, class or id names, pseudo-classes and attribute selectors.
use cow_utils::CowUtils;
use log::debug;
use veil_shared::char_stream::is_css_whitespace;

use crate::whitelist::{
    is_banned_pseudo_class, is_html_element, is_valid_identifier, is_valid_name, is_valid_pseudo_class,
    is_valid_quoted_string,
};

/// Result of checking a single (complex) selector
#[derive(Clone, Debug, PartialEq)]
pub enum SelectorOutcome {
    /// The normalized selector to write
    Accepted(String),
    /// Valid but not allowed; removed from its group without affecting the rest
    Banned,
    /// Invalidates the whole group
    Invalid,
}

/// Checks a comma separated selector group. Returns the normalized group, or `None` when the
/// rule holding it must be dropped.
#[must_use]
pub fn verify_selector_group(group: &str) -> Option<String> {
    let Some(selectors) = split_top_level(group, ',') else {
        debug!("selector group '{}' is unbalanced", group.trim());
        return None;
    };

    let mut accepted = Vec::with_capacity(selectors.len());
    for selector in selectors {
        match verify_selector(selector) {
            SelectorOutcome::Accepted(selector) => accepted.push(selector),
            SelectorOutcome::Banned => debug!("banned selector '{}' removed", selector.trim()),
            SelectorOutcome::Invalid => {
                debug!("invalid selector '{}', dropping '{}'", selector.trim(), group.trim());
                return None;
            }
        }
    }

    (!accepted.is_empty()).then(|| accepted.join(", "))
}

/// Checks one selector: simple selectors joined by `>`, `+` or whitespace
#[must_use]
pub fn verify_selector(selector: &str) -> SelectorOutcome {
    let Some(parts) = split_compounds(selector.trim()) else {
        return SelectorOutcome::Invalid;
    };
    if parts.is_empty() {
        return SelectorOutcome::Invalid;
    }

    let mut out = String::new();
    let mut banned = false;
    for (combinator, compound) in parts {
        match verify_simple_selector(compound) {
            SelectorOutcome::Accepted(simple) => {
                match combinator {
                    Some(' ') => out.push(' '),
                    Some(c) => {
                        out.push(' ');
                        out.push(c);
                        out.push(' ');
                    }
                    None => {}
                }
                out.push_str(&simple);
            }
            SelectorOutcome::Banned => banned = true,
            SelectorOutcome::Invalid => return SelectorOutcome::Invalid,
        }
    }

    if banned {
        SelectorOutcome::Banned
    } else {
        SelectorOutcome::Accepted(out)
    }
}

/// Checks a simple selector: `*` or an element name, at most one class or id, attribute
/// selectors and a chain of pseudo-classes. An element name may only be left out when
/// something else follows it.
#[must_use]
pub fn verify_simple_selector(selector: &str) -> SelectorOutcome {
    let element_end = selector.find(['.', '#', ':', '[']).unwrap_or(selector.len());
    let element = &selector[..element_end];

    let mut class_or_id: Option<&str> = None;
    let mut attributes = Vec::new();
    let mut pseudo = String::new();

    let mut rest = &selector[element_end..];
    while let Some(c) = rest.chars().next() {
        match c {
            '.' | '#' => {
                if class_or_id.is_some() {
                    return SelectorOutcome::Invalid;
                }
                let end = rest[1..].find(['.', '#', ':', '[']).map_or(rest.len(), |i| i + 1);
                if !is_valid_name(&rest[1..end]) {
                    return SelectorOutcome::Invalid;
                }
                class_or_id = Some(&rest[..end]);
                rest = &rest[end..];
            }
            '[' => {
                let Some(end) = closing_bracket(rest) else {
                    return SelectorOutcome::Invalid;
                };
                let Some(attribute) = verify_attribute(&rest[1..end]) else {
                    return SelectorOutcome::Invalid;
                };
                attributes.push(attribute);
                rest = &rest[end + 1..];
            }
            ':' => {
                let end = pseudo_class_end(rest);
                if !pseudo.is_empty() {
                    pseudo.push(':');
                }
                pseudo.push_str(&rest[1..end]);
                rest = &rest[end..];
            }
            _ => return SelectorOutcome::Invalid,
        }
    }

    let element_ok = match element {
        "" => class_or_id.is_some() || !attributes.is_empty() || !pseudo.is_empty(),
        "*" => true,
        name => is_html_element(name),
    };
    if !element_ok {
        return SelectorOutcome::Invalid;
    }

    if !pseudo.is_empty() {
        if is_banned_pseudo_class(&pseudo) {
            return SelectorOutcome::Banned;
        }
        if !is_valid_pseudo_class(&pseudo) {
            return SelectorOutcome::Invalid;
        }
    }

    let mut out = element.cow_to_ascii_lowercase().into_owned();
    out.push_str(class_or_id.unwrap_or_default());
    for attribute in attributes {
        out.push_str(&attribute);
    }
    if !pseudo.is_empty() {
        out.push(':');
        out.push_str(&pseudo.cow_to_ascii_lowercase());
    }
    SelectorOutcome::Accepted(out)
}

/// Checks the inside of `[...]`: a name, optionally followed by `=`, `~=` or `|=` and an
/// identifier or quoted string
fn verify_attribute(inner: &str) -> Option<String> {
    let inner = inner.trim();
    // the operator always comes before any quoted value
    let unquoted = inner.find(['"', '\'']).map_or(inner, |quote| &inner[..quote]);
    let (name, matcher) = match unquoted.find('=') {
        Some(eq) => {
            let name = inner[..eq].strip_suffix(['~', '|']).unwrap_or(&inner[..eq]);
            (name, Some((&inner[name.len()..=eq], &inner[eq + 1..])))
        }
        None => (inner, None),
    };

    let name = name.trim();
    let mut chars = name.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return None;
    }
    let name = name.cow_to_ascii_lowercase();

    match matcher {
        None => Some(format!("[{name}]")),
        Some((op, value)) => {
            let value = value.trim();
            (is_valid_identifier(value) || is_valid_quoted_string(value))
                .then(|| format!("[{name}{op}{value}]"))
        }
    }
}

/// Index of the `]` closing the attribute selector `rest` starts with
fn closing_bracket(rest: &str) -> Option<usize> {
    let mut quote = None;
    let mut chars = rest.char_indices().skip(1);
    while let Some((idx, c)) = chars.next() {
        match (quote, c) {
            (_, '\\') => {
                chars.next();
            }
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, ']') => return Some(idx),
            _ => {}
        }
    }
    None
}

/// End of a pseudo-class chain: the next attribute selector outside of parentheses
fn pseudo_class_end(rest: &str) -> usize {
    let mut depth = 0usize;
    for (idx, c) in rest.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '[' if depth == 0 => return idx,
            _ => {}
        }
    }
    rest.len()
}

/// Characters (with their byte offsets) that are not escaped and not inside quotes, brackets
/// or parentheses. Opening brackets themselves are included. `None` when quotes or brackets
/// are unbalanced, or the text ends in an escape.
fn top_level_chars(text: &str) -> Option<Vec<(usize, char)>> {
    let mut out = Vec::new();
    let mut quote = None;
    let mut depth = 0usize;

    let mut chars = text.char_indices();
    while let Some((idx, c)) = chars.next() {
        if c == '\\' {
            chars.next()?;
            continue;
        }
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => {
                if depth == 0 {
                    out.push((idx, c));
                }
                match c {
                    '"' | '\'' => quote = Some(c),
                    '[' | '(' => depth += 1,
                    ']' | ')' => depth = depth.checked_sub(1)?,
                    _ => {}
                }
            }
        }
    }

    (quote.is_none() && depth == 0).then_some(out)
}

fn split_top_level(text: &str, separator: char) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (idx, c) in top_level_chars(text)? {
        if c == separator {
            parts.push(&text[start..idx]);
            start = idx + c.len_utf8();
        }
    }
    parts.push(&text[start..]);
    Some(parts)
}

/// Splits a selector into its simple selectors, each with the combinator in front of it
fn split_compounds(selector: &str) -> Option<Vec<(Option<char>, &str)>> {
    let mut parts = Vec::new();
    let mut start: Option<usize> = None;
    let mut combinator: Option<char> = None;

    for (idx, c) in top_level_chars(selector)? {
        if is_css_whitespace(c) || c == '>' || c == '+' {
            if let Some(begin) = start.take() {
                parts.push((combinator.take(), &selector[begin..idx]));
            }
            if c == '>' || c == '+' {
                if parts.is_empty() || matches!(combinator, Some('>' | '+')) {
                    return None;
                }
                combinator = Some(c);
            } else if combinator.is_none() && !parts.is_empty() {
                combinator = Some(' ');
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }

    match start {
        Some(begin) => parts.push((combinator, &selector[begin..])),
        // dangling combinator
        None if combinator.is_some() => return None,
        None => {}
    }
    Some(parts)
}
