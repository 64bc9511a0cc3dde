//! Property value grammars and the compiler for the pattern notation they are written in.
//!
//! ```text
//! rule    := alt ( '|' alt )*
//! alt     := item ( ' ' item )*  |  item ( '||' item )+  |  item ( '&&' item )+
//! item    := atom ( '?' | '{' lo ',' hi '}' ( '[' slo ',' shi ']' )? | '#{' lo ',' hi '}' )?
//! atom    := keyword | '<' scalar '>' | '%' name | '[' rule ']' | '@' special
//! ```
use std::fmt::{Display, Formatter};

use nom::branch::alt;
use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::{char, digit1, multispace0, multispace1};
use nom::combinator::{all_consuming, map, map_opt, map_res, not, opt, recognize};
use nom::multi::{many0, many1, separated_list1};
use nom::sequence::{delimited, pair, preceded, separated_pair, terminated};
use nom::IResult;

use crate::errors::GrammarError;

macro_rules! debug_print {
    // ($($x:tt)*) => { println!($($x)*) }
    ($($x:tt)*) => {{}};
}

/// Single word value checks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarKind {
    Integer,
    Real,
    Percentage,
    Length,
    Angle,
    Color,
    Uri,
    Shape,
    String,
    Identifier,
    IdSelector,
    Time,
    Frequency,
    Transform,
}

impl ScalarKind {
    fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "integer" => ScalarKind::Integer,
            "number" => ScalarKind::Real,
            "percentage" => ScalarKind::Percentage,
            "length" => ScalarKind::Length,
            "angle" => ScalarKind::Angle,
            "color" => ScalarKind::Color,
            "uri" => ScalarKind::Uri,
            "shape" => ScalarKind::Shape,
            "string" => ScalarKind::String,
            "identifier" => ScalarKind::Identifier,
            "id-selector" => ScalarKind::IdSelector,
            "time" => ScalarKind::Time,
            "frequency" => ScalarKind::Frequency,
            "transform" => ScalarKind::Transform,
            _ => return None,
        };
        Some(kind)
    }

    fn name(&self) -> &'static str {
        match self {
            ScalarKind::Integer => "integer",
            ScalarKind::Real => "number",
            ScalarKind::Percentage => "percentage",
            ScalarKind::Length => "length",
            ScalarKind::Angle => "angle",
            ScalarKind::Color => "color",
            ScalarKind::Uri => "uri",
            ScalarKind::Shape => "shape",
            ScalarKind::String => "string",
            ScalarKind::Identifier => "identifier",
            ScalarKind::IdSelector => "id-selector",
            ScalarKind::Time => "time",
            ScalarKind::Frequency => "frequency",
            ScalarKind::Transform => "transform",
        }
    }
}

/// Fragments that are checked natively instead of through a pattern
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Special {
    /// One item of the `content` property
    ContentItem,
    /// Font size with an optional `/line-height`
    FontPart,
    /// Comma separated font family list
    FontFamily,
    /// Comma separated voice family list
    VoiceFamily,
}

impl Special {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "content-item" => Some(Special::ContentItem),
            "font-part" => Some(Special::FontPart),
            "font-family" => Some(Special::FontFamily),
            "voice-family" => Some(Special::VoiceFamily),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Special::ContentItem => "content-item",
            Special::FontPart => "font-part",
            Special::FontFamily => "font-family",
            Special::VoiceFamily => "voice-family",
        }
    }
}

/// A compiled grammar
#[derive(Clone, Debug, PartialEq)]
pub enum GrammarNode {
    /// Any one of these keywords
    Literal(Vec<String>),
    Scalar(ScalarKind),
    Special(Special),
    /// A named auxiliary rule
    Ref(String),
    /// All nodes, in order
    Sequence(Vec<GrammarNode>),
    /// One or more of the nodes, each at most once, in any order (`||`)
    DoubleBar(Vec<GrammarNode>),
    /// All of the nodes in any order (`&&`)
    AllOf(Vec<GrammarNode>),
    /// The first node that matches (`|`)
    Alternatives(Vec<GrammarNode>),
    Optional(Box<GrammarNode>),
    /// `lo..=hi` occurrences, each claiming `slot_lo..=slot_hi` tokens
    Repeat {
        node: Box<GrammarNode>,
        lo: usize,
        hi: usize,
        slot_lo: usize,
        slot_hi: usize,
    },
    /// `lo..=hi` comma separated groups, each group matching the node
    CommaList {
        node: Box<GrammarNode>,
        lo: usize,
        hi: usize,
    },
}

impl GrammarNode {
    /// Calls `f` with the name of every rule this grammar refers to
    fn visit_refs<'a>(&'a self, f: &mut dyn FnMut(&'a str)) {
        match self {
            GrammarNode::Ref(name) => f(name),
            GrammarNode::Sequence(nodes)
            | GrammarNode::DoubleBar(nodes)
            | GrammarNode::AllOf(nodes)
            | GrammarNode::Alternatives(nodes) => nodes.iter().for_each(|n| n.visit_refs(f)),
            GrammarNode::Optional(node)
            | GrammarNode::Repeat { node, .. }
            | GrammarNode::CommaList { node, .. } => node.visit_refs(f),
            GrammarNode::Literal(_) | GrammarNode::Scalar(_) | GrammarNode::Special(_) => {}
        }
    }

    /// Names of all rules this grammar refers to
    #[must_use]
    pub fn references(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.visit_refs(&mut |name| refs.push(name));
        refs
    }
}

fn write_joined(f: &mut Formatter<'_>, nodes: &[GrammarNode], sep: &str) -> std::fmt::Result {
    for (idx, node) in nodes.iter().enumerate() {
        if idx > 0 {
            write!(f, "{sep}")?;
        }
        match node {
            GrammarNode::Sequence(_)
            | GrammarNode::DoubleBar(_)
            | GrammarNode::AllOf(_)
            | GrammarNode::Alternatives(_) => write!(f, "[{node}]")?,
            GrammarNode::Literal(words) if words.len() > 1 => write!(f, "[{node}]")?,
            _ => write!(f, "{node}")?,
        }
    }
    Ok(())
}

impl Display for GrammarNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GrammarNode::Literal(words) => write!(f, "{}", words.join(" | ")),
            GrammarNode::Scalar(kind) => write!(f, "<{}>", kind.name()),
            GrammarNode::Special(special) => write!(f, "@{}", special.name()),
            GrammarNode::Ref(name) => write!(f, "%{name}"),
            GrammarNode::Sequence(nodes) => write_joined(f, nodes, " "),
            GrammarNode::DoubleBar(nodes) => write_joined(f, nodes, " || "),
            GrammarNode::AllOf(nodes) => write_joined(f, nodes, " && "),
            GrammarNode::Alternatives(nodes) => write_joined(f, nodes, " | "),
            GrammarNode::Optional(node) => {
                write_joined(f, std::slice::from_ref(node.as_ref()), "")?;
                write!(f, "?")
            }
            GrammarNode::Repeat {
                node,
                lo,
                hi,
                slot_lo,
                slot_hi,
            } => {
                write_joined(f, std::slice::from_ref(node.as_ref()), "")?;
                write!(f, "{{{lo},{hi}}}")?;
                if (*slot_lo, *slot_hi) != (1, 1) {
                    write!(f, "[{slot_lo},{slot_hi}]")?;
                }
                Ok(())
            }
            GrammarNode::CommaList { node, lo, hi } => {
                write_joined(f, std::slice::from_ref(node.as_ref()), "")?;
                write!(f, "#{{{lo},{hi}}}")
            }
        }
    }
}

/// Compiles a pattern. `is_known_rule` decides whether a `%name` reference resolves.
pub fn compile(source: &str, is_known_rule: &dyn Fn(&str) -> bool) -> Result<GrammarNode, GrammarError> {
    let node = match all_consuming(delimited(multispace0, parse_rule, multispace0))(source) {
        Ok((_, node)) => node,
        Err(err) => {
            return Err(GrammarError::Compile(format!("'{source}': {err}")));
        }
    };

    if let Some(unknown) = node.references().into_iter().find(|name| !is_known_rule(name)) {
        return Err(GrammarError::UnknownRule(unknown.to_string()));
    }
    check_bounds(&node).map_err(|msg| GrammarError::Compile(format!("'{source}': {msg}")))?;

    Ok(node)
}

fn check_bounds(node: &GrammarNode) -> Result<(), String> {
    match node {
        GrammarNode::Repeat {
            node,
            lo,
            hi,
            slot_lo,
            slot_hi,
        } => {
            if lo > hi || slot_lo > slot_hi {
                return Err(format!("empty range {{{lo},{hi}}}[{slot_lo},{slot_hi}]"));
            }
            if *slot_lo == 0 {
                return Err("repetitions must claim at least one token".into());
            }
            check_bounds(node)
        }
        GrammarNode::CommaList { node, lo, hi } => {
            if lo > hi || *hi == 0 {
                return Err(format!("empty range #{{{lo},{hi}}}"));
            }
            check_bounds(node)
        }
        GrammarNode::Optional(node) => check_bounds(node),
        GrammarNode::Sequence(nodes)
        | GrammarNode::DoubleBar(nodes)
        | GrammarNode::AllOf(nodes)
        | GrammarNode::Alternatives(nodes) => nodes.iter().try_for_each(check_bounds),
        GrammarNode::Literal(_) | GrammarNode::Scalar(_) | GrammarNode::Special(_) | GrammarNode::Ref(_) => Ok(()),
    }
}

/// Removes surrounding whitespace from a parser
fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Keywords: letters, digits, dashes, underscores and slashes
fn parse_keyword(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/'))(input)
}

fn parse_name(input: &str) -> IResult<&str, &str> {
    recognize(take_while1(|c: char| c.is_ascii_alphanumeric() || c == '-'))(input)
}

fn parse_number(input: &str) -> IResult<&str, usize> {
    map_res(digit1, |s: &str| s.parse::<usize>())(input)
}

fn parse_range(open: char, close: char) -> impl FnMut(&str) -> IResult<&str, (usize, usize)> {
    move |input| {
        delimited(
            char(open),
            separated_pair(ws(parse_number), char(','), ws(parse_number)),
            char(close),
        )(input)
    }
}

fn parse_atom(input: &str) -> IResult<&str, GrammarNode> {
    debug_print!("Parsing atom: {}", input);

    alt((
        map_opt(delimited(char('<'), parse_name, char('>')), |name| {
            ScalarKind::from_name(name).map(GrammarNode::Scalar)
        }),
        map(preceded(char('%'), parse_name), |name| {
            GrammarNode::Ref(name.to_string())
        }),
        map_opt(preceded(char('@'), parse_name), |name| {
            Special::from_name(name).map(GrammarNode::Special)
        }),
        delimited(char('['), ws(parse_rule), char(']')),
        map(parse_keyword, |kw| GrammarNode::Literal(vec![kw.to_string()])),
    ))(input)
}

enum Multiplier {
    Optional,
    Repeat((usize, usize), Option<(usize, usize)>),
    CommaList((usize, usize)),
}

fn parse_item(input: &str) -> IResult<&str, GrammarNode> {
    let (input, atom) = parse_atom(input)?;
    let (input, multiplier) = opt(alt((
        map(char('?'), |_| Multiplier::Optional),
        map(
            pair(parse_range('{', '}'), opt(parse_range('[', ']'))),
            |(range, slots)| Multiplier::Repeat(range, slots),
        ),
        map(preceded(char('#'), parse_range('{', '}')), Multiplier::CommaList),
    )))(input)?;

    let node = match multiplier {
        None => atom,
        Some(Multiplier::Optional) => GrammarNode::Optional(Box::new(atom)),
        Some(Multiplier::Repeat((lo, hi), slots)) => {
            let (slot_lo, slot_hi) = slots.unwrap_or((1, 1));
            GrammarNode::Repeat {
                node: Box::new(atom),
                lo,
                hi,
                slot_lo,
                slot_hi,
            }
        }
        Some(Multiplier::CommaList((lo, hi))) => GrammarNode::CommaList {
            node: Box::new(atom),
            lo,
            hi,
        },
    };
    Ok((input, node))
}

/// Converts a list of nodes into a single node, or a combined node if there are multiple.
fn value_or_list(list: Vec<GrammarNode>, combine: fn(Vec<GrammarNode>) -> GrammarNode) -> GrammarNode {
    let mut list = list;
    if list.len() == 1 {
        if let Some(node) = list.pop() {
            return node;
        }
    }
    combine(list)
}

/// Merges neighbouring keyword alternatives into one literal set
fn merge_literals(list: Vec<GrammarNode>) -> Vec<GrammarNode> {
    let mut merged: Vec<GrammarNode> = Vec::with_capacity(list.len());
    for node in list {
        match (merged.last_mut(), node) {
            (Some(GrammarNode::Literal(words)), GrammarNode::Literal(more)) => words.extend(more),
            (_, node) => merged.push(node),
        }
    }
    merged
}

fn parse_combination(input: &str) -> IResult<&str, GrammarNode> {
    debug_print!("Parsing combination: {}", input);

    let (input, first) = parse_item(input)?;

    if let Ok((rest, others)) = many1(preceded(ws(tag("||")), parse_item))(input) {
        let mut list = vec![first];
        list.extend(others);
        return Ok((rest, GrammarNode::DoubleBar(list)));
    }

    if let Ok((rest, others)) = many1(preceded(ws(tag("&&")), parse_item))(input) {
        let mut list = vec![first];
        list.extend(others);
        return Ok((rest, GrammarNode::AllOf(list)));
    }

    let (input, others) = many0(preceded(multispace1, parse_item))(input)?;
    let mut list = vec![first];
    list.extend(others);
    Ok((input, value_or_list(list, GrammarNode::Sequence)))
}

fn parse_rule(input: &str) -> IResult<&str, GrammarNode> {
    debug_print!("Parsing rule: {}", input);

    let single_bar = ws(terminated(char('|'), not(char('|'))));
    let (input, list) = separated_list1(single_bar, parse_combination)(input)?;
    Ok((
        input,
        value_or_list(merge_literals(list), GrammarNode::Alternatives),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn any_rule(_: &str) -> bool {
        true
    }

    fn lit(words: &[&str]) -> GrammarNode {
        GrammarNode::Literal(words.iter().map(|w| w.to_string()).collect())
    }

    #[test]
    fn keywords_merge() {
        let node = compile("left | center|right", &any_rule).unwrap();
        assert_eq!(node, lit(&["left", "center", "right"]));
    }

    #[test]
    fn scalars_and_alternatives() {
        let node = compile("auto | <length> | <percentage>", &any_rule).unwrap();
        assert_eq!(
            node,
            GrammarNode::Alternatives(vec![
                lit(&["auto"]),
                GrammarNode::Scalar(ScalarKind::Length),
                GrammarNode::Scalar(ScalarKind::Percentage),
            ])
        );
    }

    #[test]
    fn sequences_and_groups() {
        let node = compile("<length> [<length> | auto]?", &any_rule).unwrap();
        assert_eq!(
            node,
            GrammarNode::Sequence(vec![
                GrammarNode::Scalar(ScalarKind::Length),
                GrammarNode::Optional(Box::new(GrammarNode::Alternatives(vec![
                    GrammarNode::Scalar(ScalarKind::Length),
                    lit(&["auto"]),
                ]))),
            ])
        );
    }

    #[test]
    fn double_bar_and_all_of() {
        let node = compile("%h-pos || %v-pos", &any_rule).unwrap();
        assert_eq!(
            node,
            GrammarNode::DoubleBar(vec![
                GrammarNode::Ref("h-pos".into()),
                GrammarNode::Ref("v-pos".into()),
            ])
        );

        let node = compile("list-item && [block | inline]?", &any_rule).unwrap();
        assert!(matches!(node, GrammarNode::AllOf(ref list) if list.len() == 2));
    }

    #[test]
    fn repetitions() {
        let node = compile("[<integer> | <number>]{0,10}[1,3] auto", &any_rule).unwrap();
        let GrammarNode::Sequence(list) = node else {
            unreachable!("a sequence was compiled");
        };
        assert!(matches!(
            list[0],
            GrammarNode::Repeat {
                lo: 0,
                hi: 10,
                slot_lo: 1,
                slot_hi: 3,
                ..
            }
        ));
        assert_eq!(list[1], lit(&["auto"]));

        let node = compile("<length>{1,4}", &any_rule).unwrap();
        assert_eq!(node.to_string(), "<length>{1,4}");

        let node = compile("none | [<uri> | auto]#{1,10}", &any_rule).unwrap();
        assert_eq!(node.to_string(), "none | [<uri> | auto]#{1,10}");
    }

    #[test]
    fn specials() {
        let node = compile("normal | none | @content-item{1,10}", &any_rule).unwrap();
        assert_eq!(node.to_string(), "[normal | none] | @content-item{1,10}");
    }

    #[test]
    fn errors() {
        assert!(matches!(
            compile("<bogus>", &any_rule),
            Err(GrammarError::Compile(_))
        ));
        assert!(matches!(
            compile("a b || c", &any_rule),
            Err(GrammarError::Compile(_))
        ));
        assert!(matches!(
            compile("<length>{4,1}", &any_rule),
            Err(GrammarError::Compile(_))
        ));
        assert!(matches!(
            compile("[auto", &any_rule),
            Err(GrammarError::Compile(_))
        ));
        assert_eq!(
            compile("%missing | auto", &|name| name == "present"),
            Err(GrammarError::UnknownRule("missing".into()))
        );
    }
}
