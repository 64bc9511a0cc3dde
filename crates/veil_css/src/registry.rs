//! The property registry: every property we let through, the media it applies to and the
//! grammar its value must match. Built once and never modified afterwards.
use std::collections::HashMap;
use std::sync::LazyLock;

use cow_utils::CowUtils;
use log::error;

use crate::grammar::{compile, GrammarNode};
use crate::whitelist::MediaGroup;

/// A property that may appear in a declaration
#[derive(Debug, Clone)]
pub struct PropertyEntry {
    pub name: &'static str,
    /// Media group the property is restricted to, or `None` when it applies everywhere
    pub media: Option<MediaGroup>,
    /// Commas delimit words in the value
    pub allow_commas: bool,
    pub grammar: GrammarNode,
}

const V: Option<MediaGroup> = Some(MediaGroup::Visual);
const A: Option<MediaGroup> = Some(MediaGroup::Aural);
const P: Option<MediaGroup> = Some(MediaGroup::VisualPaged);
const I: Option<MediaGroup> = Some(MediaGroup::VisualInteractive);
const M: Option<MediaGroup> = Some(MediaGroup::All);
const ANY: Option<MediaGroup> = None;

/// Named grammar fragments, referenced as `%name`
const RULES: &[(&str, &str)] = &[
    ("h-position", "left | center | right | <percentage> | <length>"),
    ("v-position", "top | center | bottom | <percentage> | <length>"),
    ("h-keyword", "left | center | right"),
    ("v-keyword", "top | center | bottom"),
    ("position", "%h-position %v-position? | %h-keyword || %v-keyword"),
    ("length-percentage", "<length> | <percentage>"),
    ("auto-length-percentage", "auto | <length> | <percentage>"),
    ("color-or-transparent", "transparent | <color>"),
    ("uri-or-none", "none | <uri>"),
    // backgrounds
    ("bg-attachment", "scroll | fixed | local"),
    ("bg-repeat", "repeat-x | repeat-y | [repeat | space | round | no-repeat]{1,2}"),
    ("bg-size", "[<length> | <percentage> | auto]{1,2} | cover | contain"),
    ("box", "border-box | padding-box | content-box"),
    (
        "background",
        "%color-or-transparent || %uri-or-none || %position || %bg-repeat || %bg-attachment",
    ),
    // borders
    (
        "border-style",
        "none | hidden | dotted | dashed | solid | double | groove | ridge | inset | outset",
    ),
    ("border-width", "thin | medium | thick | <length>"),
    ("border", "%border-width || %border-style || %color-or-transparent"),
    ("border-image-slice", "[<percentage> | <integer>]{1,4} fill?"),
    ("border-image-width", "[auto | <length> | <percentage> | <integer>]{1,4}"),
    ("border-image-repeat", "[stretch | repeat | round | space]{1,2}"),
    ("shadow", "inset || <length>{2,4} || <color>"),
    ("text-shadow", "<length>{2,3} || <color>"),
    // alignment
    (
        "content-distribution",
        "auto | baseline | last-baseline | space-between | space-around | space-evenly | stretch",
    ),
    ("overflow-position", "unsafe | safe | true"),
    (
        "content-position",
        "center | start | end | flex-start | flex-end | left | right",
    ),
    (
        "content-alignment",
        "%overflow-position %content-position | %content-position %overflow-position?",
    ),
    ("self-keyword", "auto | stretch | baseline | last-baseline"),
    (
        "self-position",
        "center | start | end | self-start | self-end | flex-start | flex-end | left | right",
    ),
    (
        "self-alignment",
        "%overflow-position %self-position | %self-position %overflow-position?",
    ),
    // flexbox
    ("flex-direction", "row | row-reverse | column | column-reverse"),
    ("flex-wrap", "nowrap | wrap | wrap-reverse"),
    ("flex-basis", "content | auto | <length> | <percentage>"),
    // fonts
    ("font-style", "normal | italic | oblique"),
    ("font-variant", "normal | small-caps"),
    (
        "font-weight",
        "normal | bold | bolder | lighter | 100 | 200 | 300 | 400 | 500 | 600 | 700 | 800 | 900",
    ),
    (
        "font-size",
        "xx-small | x-small | small | medium | large | x-large | xx-large | larger | smaller | <length> | <percentage>",
    ),
    // lists
    (
        "list-style-type",
        "disc | circle | square | decimal | decimal-leading-zero | lower-roman | upper-roman | lower-greek | lower-latin | upper-latin | armenian | georgian | lower-alpha | upper-alpha | none",
    ),
    ("list-style-position", "inside | outside"),
    // text
    ("text-decoration-line", "none | underline || overline || line-through"),
    ("text-decoration-style", "solid | double | dotted | dashed | wavy"),
    (
        "text-emphasis-style",
        "none | [filled | open] || [dot | circle | double-circle | triangle | sesame] | <string>",
    ),
    // generated content and ui
    (
        "cursor-keyword",
        "auto | default | none | context-menu | help | pointer | progress | wait | cell | crosshair | text | vertical-text | alias | copy | move | no-drop | not-allowed | grab | grabbing | e-resize | n-resize | ne-resize | nw-resize | s-resize | se-resize | sw-resize | w-resize | ew-resize | ns-resize | nesw-resize | nwse-resize | col-resize | row-resize | all-scroll | zoom-in | zoom-out",
    ),
    ("cursor", "<uri> [<number> <number>]? | %cursor-keyword"),
    (
        "azimuth-position",
        "left-side | far-left | left | center-left | center | center-right | right | far-right | right-side",
    ),
];

/// Property name, media group, comma delimited, grammar
const PROPERTIES: &[(&str, Option<MediaGroup>, bool, &str)] = &[
    ("align-content", V, false, "%content-distribution || %content-alignment"),
    ("align-items", V, false, "%self-keyword | %self-alignment"),
    ("align-self", V, false, "%self-keyword | %self-alignment"),
    ("azimuth", A, false, "leftwards | rightwards | <angle> | %azimuth-position || behind"),
    ("background", V, false, "%background"),
    ("background-attachment", V, true, "%bg-attachment#{1,10}"),
    ("background-clip", V, true, "%box#{1,10}"),
    ("background-color", V, false, "%color-or-transparent"),
    ("background-image", V, true, "%uri-or-none#{1,10}"),
    ("background-origin", V, true, "%box#{1,10}"),
    ("background-position", V, true, "%position#{1,10}"),
    ("background-repeat", V, true, "%bg-repeat#{1,10}"),
    ("background-size", V, true, "%bg-size#{1,10}"),
    ("border", V, false, "%border"),
    ("border-bottom", V, false, "%border"),
    ("border-bottom-color", V, false, "%color-or-transparent"),
    ("border-bottom-left-radius", V, false, "%length-percentage{1,2}"),
    ("border-bottom-right-radius", V, false, "%length-percentage{1,2}"),
    ("border-bottom-style", V, false, "%border-style"),
    ("border-bottom-width", V, false, "%border-width"),
    ("border-collapse", V, false, "collapse | separate"),
    ("border-color", V, false, "%color-or-transparent{1,4}"),
    ("border-image", V, false, "%uri-or-none || %border-image-slice || %border-image-repeat"),
    ("border-image-outset", V, false, "[<length> | <integer>]{1,4}"),
    ("border-image-repeat", V, false, "%border-image-repeat"),
    ("border-image-slice", V, false, "%border-image-slice"),
    ("border-image-source", V, false, "%uri-or-none"),
    ("border-image-width", V, false, "%border-image-width"),
    ("border-left", V, false, "%border"),
    ("border-left-color", V, false, "%color-or-transparent"),
    ("border-left-style", V, false, "%border-style"),
    ("border-left-width", V, false, "%border-width"),
    (
        "border-radius",
        V,
        false,
        "%length-percentage{1,4} | %length-percentage{1,4} / %length-percentage{1,4}",
    ),
    ("border-right", V, false, "%border"),
    ("border-right-color", V, false, "%color-or-transparent"),
    ("border-right-style", V, false, "%border-style"),
    ("border-right-width", V, false, "%border-width"),
    ("border-spacing", V, false, "<length> <length>?"),
    ("border-style", V, false, "%border-style{1,4}"),
    ("border-top", V, false, "%border"),
    ("border-top-color", V, false, "%color-or-transparent"),
    ("border-top-left-radius", V, false, "%length-percentage{1,2}"),
    ("border-top-right-radius", V, false, "%length-percentage{1,2}"),
    ("border-top-style", V, false, "%border-style"),
    ("border-top-width", V, false, "%border-width"),
    ("border-width", V, false, "%border-width{1,4}"),
    ("bottom", V, false, "%auto-length-percentage"),
    ("box-decoration-break", V, false, "slice | clone"),
    ("box-shadow", V, true, "none | %shadow#{1,10}"),
    ("box-sizing", V, false, "content-box | border-box"),
    ("break-after", P, false, "auto | always | avoid | left | right | page | column | avoid-page | avoid-column"),
    ("break-before", P, false, "auto | always | avoid | left | right | page | column | avoid-page | avoid-column"),
    ("break-inside", P, false, "auto | avoid | avoid-page | avoid-column"),
    ("caption-side", V, false, "top | bottom"),
    ("caret-color", I, false, "auto | %color-or-transparent"),
    ("clear", V, false, "none | left | right | both"),
    ("clip", V, false, "auto | <shape>"),
    ("color", V, false, "<color>"),
    ("color-interpolation", V, false, "auto | sRGB | linearRGB"),
    ("color-rendering", V, false, "auto | optimizeSpeed | optimizeQuality"),
    ("column-count", V, false, "auto | <integer>"),
    ("column-fill", V, false, "auto | balance"),
    ("column-gap", V, false, "normal | <length>"),
    ("column-rule", V, false, "%border"),
    ("column-rule-color", V, false, "%color-or-transparent"),
    ("column-rule-style", V, false, "%border-style"),
    ("column-rule-width", V, false, "%border-width"),
    ("column-span", V, false, "none | all"),
    ("column-width", V, false, "auto | <length>"),
    ("columns", V, false, "[auto | <length>] || [auto | <integer>]"),
    ("content", M, false, "normal | none | @content-item{1,10}"),
    ("counter-increment", M, false, "none | [<identifier> <integer>?]{1,10}[1,2]"),
    ("counter-reset", M, false, "none | [<identifier> <integer>?]{1,10}[1,2]"),
    ("cue", A, false, "%uri-or-none %uri-or-none?"),
    ("cue-after", A, false, "%uri-or-none"),
    ("cue-before", A, false, "%uri-or-none"),
    ("cursor", I, true, "%cursor#{1,11}"),
    ("direction", V, false, "ltr | rtl"),
    (
        "display",
        ANY,
        false,
        "[block | inline | run-in] || [flow | flow-root | table | flex | grid | ruby] \
         | list-item && [block | inline | run-in]? && [flow | flow-root]? \
         | table-row-group | table-header-group | table-footer-group | table-row | table-cell \
         | table-column-group | table-column | table-caption | ruby-base | ruby-text \
         | ruby-base-container | ruby-text-container | contents | none | inline-block \
         | inline-list-item | inline-table | inline-flex | inline-grid",
    ),
    ("elevation", A, false, "below | level | above | higher | lower | <angle>"),
    ("empty-cells", V, false, "show | hide"),
    ("flex", V, false, "none | [<number> <number>?] || %flex-basis"),
    ("flex-basis", V, false, "%flex-basis"),
    ("flex-direction", V, false, "%flex-direction"),
    ("flex-flow", V, false, "%flex-direction || %flex-wrap"),
    ("flex-grow", V, false, "<number>"),
    ("flex-shrink", V, false, "<number>"),
    ("flex-wrap", V, false, "%flex-wrap"),
    ("float", V, false, "left | right | none"),
    (
        "font",
        V,
        true,
        "caption | icon | menu | message-box | small-caption | status-bar \
         | [%font-style || %font-variant || %font-weight]? @font-part @font-family",
    ),
    ("font-family", V, true, "@font-family"),
    ("font-size", V, false, "%font-size"),
    ("font-style", V, false, "%font-style"),
    ("font-variant", V, false, "%font-variant"),
    ("font-weight", V, false, "%font-weight"),
    ("hanging-punctuation", V, false, "none | [allow-end | force-end] || first || last"),
    ("height", V, false, "%auto-length-percentage"),
    ("justify-content", V, false, "%content-distribution || %content-alignment"),
    (
        "justify-items",
        V,
        false,
        "%self-keyword | %self-alignment | legacy && %h-keyword?",
    ),
    ("justify-self", V, false, "%self-keyword | %self-alignment"),
    ("left", V, false, "%auto-length-percentage"),
    ("letter-spacing", V, false, "normal | <length>"),
    ("line-break", V, false, "auto | newspaper | normal | strict | keep-all"),
    ("line-height", V, false, "normal | <number> | <length> | <percentage>"),
    ("list-style", V, false, "%list-style-type || %list-style-position || %uri-or-none"),
    ("list-style-image", V, false, "%uri-or-none"),
    ("list-style-position", V, false, "%list-style-position"),
    ("list-style-type", V, false, "%list-style-type"),
    ("margin", V, false, "%auto-length-percentage{1,4}"),
    ("margin-bottom", V, false, "%auto-length-percentage"),
    ("margin-left", V, false, "%auto-length-percentage"),
    ("margin-right", V, false, "%auto-length-percentage"),
    ("margin-top", V, false, "%auto-length-percentage"),
    ("max-height", V, false, "none | <length> | <percentage>"),
    ("max-width", V, false, "none | <length> | <percentage>"),
    ("min-height", V, false, "%auto-length-percentage"),
    ("min-width", V, false, "%auto-length-percentage"),
    ("nav-down", I, false, "auto | <id-selector> [current | root | <string>]?"),
    ("nav-left", I, false, "auto | <id-selector> [current | root | <string>]?"),
    ("nav-right", I, false, "auto | <id-selector> [current | root | <string>]?"),
    ("nav-up", I, false, "auto | <id-selector> [current | root | <string>]?"),
    ("opacity", V, false, "<number>"),
    ("order", V, false, "<integer>"),
    ("orphans", P, false, "<integer>"),
    ("outline", I, false, "[invert | <color>] || %border-style || %border-width"),
    ("outline-color", I, false, "invert | <color>"),
    ("outline-offset", V, false, "<length>"),
    ("outline-style", I, false, "%border-style"),
    ("outline-width", I, false, "%border-width"),
    ("overflow", V, false, "visible | hidden | scroll | auto"),
    ("overflow-wrap", V, false, "normal | break-word"),
    ("overflow-x", V, false, "visible | hidden | scroll | auto"),
    ("overflow-y", V, false, "visible | hidden | scroll | auto"),
    ("padding", V, false, "%length-percentage{1,4}"),
    ("padding-bottom", V, false, "%length-percentage"),
    ("padding-left", V, false, "%length-percentage"),
    ("padding-right", V, false, "%length-percentage"),
    ("padding-top", V, false, "%length-percentage"),
    ("page-break-after", P, false, "auto | always | avoid | left | right"),
    ("page-break-before", P, false, "auto | always | avoid | left | right"),
    ("page-break-inside", P, false, "auto | avoid"),
    ("pause", A, false, "[<time> | <percentage>]{1,2}"),
    ("pause-after", A, false, "<time> | <percentage>"),
    ("pause-before", A, false, "<time> | <percentage>"),
    ("pitch", A, false, "x-low | low | medium | high | x-high | <frequency>"),
    ("pitch-range", A, false, "<number>"),
    ("play-during", A, false, "auto | none | <uri> [mix || repeat]?"),
    ("position", V, false, "static | relative | absolute | fixed"),
    ("punctuation-trim", V, false, "none | start || [end | allow-end] || adjacent"),
    ("quotes", V, false, "none | [<string> <string>]{1,10}[2,2]"),
    ("resize", I, false, "none | both | horizontal | vertical"),
    ("richness", A, false, "<number>"),
    ("right", V, false, "%auto-length-percentage"),
    ("speak", A, false, "normal | none | spell-out"),
    ("speak-header", A, false, "once | always"),
    ("speak-numeral", A, false, "digits | continuous"),
    ("speak-punctuation", A, false, "code | none"),
    (
        "speech-rate",
        A,
        false,
        "x-slow | slow | medium | fast | x-fast | faster | slower | <number>",
    ),
    ("stress", A, false, "<number>"),
    ("table-layout", V, false, "auto | fixed"),
    (
        "text-align",
        V,
        false,
        "start | end | left | right | center | justify | match-parent",
    ),
    ("text-align-last", V, false, "auto | start | end | left | right | center | justify"),
    (
        "text-autospace",
        V,
        false,
        "none | ideograph-numeric || ideograph-alpha || ideograph-space || ideograph-parenthesis",
    ),
    (
        "text-decoration",
        V,
        false,
        "%text-decoration-line || <color> || %text-decoration-style || blink",
    ),
    ("text-decoration-color", V, false, "<color>"),
    ("text-decoration-line", V, false, "%text-decoration-line"),
    ("text-decoration-skip", V, false, "none | images || spaces || ink || all"),
    ("text-decoration-style", V, false, "%text-decoration-style"),
    ("text-emphasis", V, false, "%text-emphasis-style || <color>"),
    ("text-emphasis-color", V, false, "<color>"),
    ("text-emphasis-position", V, false, "[over | under] [right | left]?"),
    ("text-emphasis-style", V, false, "%text-emphasis-style"),
    ("text-indent", V, false, "%length-percentage && hanging? && each-line?"),
    (
        "text-justify",
        V,
        false,
        "auto | trim || [inter-word | inter-ideograph | inter-cluster | distribute | kashida]",
    ),
    ("text-outline", V, false, "none | <color> || [<length> <length>?]"),
    ("text-overflow", V, false, "clip | ellipsis | <string>"),
    ("text-shadow", V, true, "none | %text-shadow#{1,10}"),
    (
        "text-transform",
        V,
        false,
        "capitalize | uppercase | lowercase | none | fullwidth | large-kana",
    ),
    ("text-underline-position", V, false, "auto | under | alphabetic | over"),
    ("text-wrap", V, false, "normal | unrestricted | none | suppress"),
    ("top", V, false, "%auto-length-percentage"),
    ("transform", V, false, "none | <transform>{1,20}"),
    ("transform-origin", V, false, "%position"),
    ("unicode-bidi", V, false, "normal | embed | bidi-override"),
    (
        "vertical-align",
        V,
        false,
        "baseline | sub | super | top | text-top | middle | bottom | text-bottom | <percentage> | <length>",
    ),
    ("visibility", V, false, "visible | hidden | collapse"),
    ("voice-family", A, true, "@voice-family"),
    (
        "volume",
        A,
        false,
        "silent | x-soft | soft | medium | loud | x-loud | <number> | <percentage>",
    ),
    ("white-space", V, false, "normal | pre | nowrap | pre-wrap | pre-line"),
    (
        "white-space-collapsing",
        V,
        false,
        "collapse | discard | [preserve | preserve-breaks] || trim-inner",
    ),
    ("widows", P, false, "<integer>"),
    ("width", V, false, "%auto-length-percentage"),
    ("word-break", V, false, "normal | break-all | keep-all | hyphenate"),
    ("word-spacing", V, false, "normal | <length> | <percentage>"),
    ("word-wrap", V, false, "normal | break-word"),
    ("z-index", V, false, "auto | <integer>"),
];

/// Compiled properties and auxiliary rules
pub struct Registry {
    rules: HashMap<&'static str, GrammarNode>,
    properties: HashMap<&'static str, PropertyEntry>,
}

impl Registry {
    fn build() -> Self {
        let is_known_rule = |name: &str| RULES.iter().any(|(rule, _)| *rule == name);

        let mut rules = HashMap::with_capacity(RULES.len());
        for (name, pattern) in RULES {
            match compile(pattern, &is_known_rule) {
                Ok(grammar) => {
                    rules.insert(*name, grammar);
                }
                Err(e) => error!("rule '{name}' left out of the registry: {e}"),
            }
        }

        let mut properties = HashMap::with_capacity(PROPERTIES.len());
        for (name, media, allow_commas, pattern) in PROPERTIES {
            match compile(pattern, &is_known_rule) {
                Ok(grammar) => {
                    properties.insert(
                        *name,
                        PropertyEntry {
                            name,
                            media: *media,
                            allow_commas: *allow_commas,
                            grammar,
                        },
                    );
                }
                Err(e) => error!("property '{name}' left out of the registry: {e}"),
            }
        }

        Self { rules, properties }
    }

    /// Looks up a property by name (case-insensitive)
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyEntry> {
        self.properties.get(name.trim().cow_to_ascii_lowercase().as_ref())
    }

    /// Looks up an auxiliary rule by name
    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&GrammarNode> {
        self.rules.get(name)
    }

    /// Number of known properties
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::build);

/// The process wide registry
#[must_use]
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Shortcut for `registry().property(name)`
#[must_use]
pub fn lookup(name: &str) -> Option<&'static PropertyEntry> {
    registry().property(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_entry_compiles() {
        let is_known_rule = |name: &str| RULES.iter().any(|(rule, _)| *rule == name);
        for (name, pattern) in RULES {
            assert!(compile(pattern, &is_known_rule).is_ok(), "rule {name}");
        }
        for (name, _, _, pattern) in PROPERTIES {
            assert!(compile(pattern, &is_known_rule).is_ok(), "property {name}");
        }
        assert_eq!(registry().len(), PROPERTIES.len());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let entry = lookup("Background-Color").unwrap();
        assert_eq!(entry.name, "background-color");
        assert_eq!(entry.media, Some(MediaGroup::Visual));
        assert!(!entry.allow_commas);

        assert!(lookup("font-family").unwrap().allow_commas);
        assert!(lookup("behavior").is_none());
        assert!(lookup("-moz-binding").is_none());
    }

    #[test]
    fn rules_resolve() {
        assert!(registry().rule("position").is_some());
        assert!(registry().rule("nope").is_none());
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<&str> = PROPERTIES.iter().map(|(name, ..)| *name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), PROPERTIES.len());
    }
}
