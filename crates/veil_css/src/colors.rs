use std::collections::HashSet;

use cow_utils::CowUtils;
use lazy_static::lazy_static;

use crate::values::{function_args, is_integer, is_number, is_percentage};

// Names for this table are taken from https://www.w3.org/TR/css-color-3/#svg-color

lazy_static! {
    /// Extended (SVG) colour keywords
    pub static ref NAMED_COLORS: HashSet<&'static str> = [
        "aliceblue", "antiquewhite", "aqua", "aquamarine", "azure", "beige", "bisque", "black",
        "blanchedalmond", "blue", "blueviolet", "brown", "burlywood", "cadetblue", "chartreuse",
        "chocolate", "coral", "cornflowerblue", "cornsilk", "crimson", "cyan", "darkblue",
        "darkcyan", "darkgoldenrod", "darkgray", "darkgreen", "darkgrey", "darkkhaki",
        "darkmagenta", "darkolivegreen", "darkorange", "darkorchid", "darkred", "darksalmon",
        "darkseagreen", "darkslateblue", "darkslategray", "darkslategrey", "darkturquoise",
        "darkviolet", "deeppink", "deepskyblue", "dimgray", "dimgrey", "dodgerblue", "firebrick",
        "floralwhite", "forestgreen", "fuchsia", "gainsboro", "ghostwhite", "gold", "goldenrod",
        "gray", "green", "greenyellow", "grey", "honeydew", "hotpink", "indianred", "indigo",
        "ivory", "khaki", "lavender", "lavenderblush", "lawngreen", "lemonchiffon", "lightblue",
        "lightcoral", "lightcyan", "lightgoldenrodyellow", "lightgray", "lightgreen", "lightgrey",
        "lightpink", "lightsalmon", "lightseagreen", "lightskyblue", "lightslategray",
        "lightslategrey", "lightsteelblue", "lightyellow", "lime", "limegreen", "linen", "magenta",
        "maroon", "mediumaquamarine", "mediumblue", "mediumorchid", "mediumpurple",
        "mediumseagreen", "mediumslateblue", "mediumspringgreen", "mediumturquoise",
        "mediumvioletred", "midnightblue", "mintcream", "mistyrose", "moccasin", "navajowhite",
        "navy", "oldlace", "olive", "olivedrab", "orange", "orangered", "orchid", "palegoldenrod",
        "palegreen", "paleturquoise", "palevioletred", "papayawhip", "peachpuff", "peru", "pink",
        "plum", "powderblue", "purple", "red", "rosybrown", "royalblue", "saddlebrown", "salmon",
        "sandybrown", "seagreen", "seashell", "sienna", "silver", "skyblue", "slateblue",
        "slategray", "slategrey", "snow", "springgreen", "steelblue", "tan", "teal", "thistle",
        "tomato", "turquoise", "violet", "wheat", "white", "whitesmoke", "yellow", "yellowgreen",
        "rebeccapurple"
    ]
    .into_iter()
    .collect();

    /// CSS2 system colours, stored lowercase
    pub static ref SYSTEM_COLORS: HashSet<&'static str> = [
        "activeborder", "activecaption", "appworkspace", "background", "buttonface",
        "buttonhighlight", "buttonshadow", "buttontext", "captiontext", "graytext", "highlight",
        "highlighttext", "inactiveborder", "inactivecaption", "inactivecaptiontext",
        "infobackground", "infotext", "menu", "menutext", "scrollbar", "threeddarkshadow",
        "threedface", "threedhighlight", "threedlightshadow", "threedshadow", "window",
        "windowframe", "windowtext",
    ]
    .into_iter()
    .collect();
}

fn is_hex(value: &str) -> bool {
    // Check if the input is empty or doesn't start with '#'
    if value.is_empty() || !value.starts_with('#') {
        return false;
    }

    // Check if all characters after '#' are hexadecimal digits
    value.chars().skip(1).all(|c| c.is_ascii_hexdigit())
}

fn is_rgb_component(value: &str) -> bool {
    is_integer(value) || is_percentage(value)
}

/// Checks `rgb(r,g,b)` and `rgba(r,g,b,a)`
fn is_rgb(value: &str) -> bool {
    if let Some(args) = function_args(value, "rgb") {
        return args.len() == 3 && args.iter().all(|a| is_rgb_component(a));
    }
    if let Some(args) = function_args(value, "rgba") {
        return args.len() == 4 && args[..3].iter().all(|a| is_rgb_component(a)) && is_number(args[3]);
    }
    false
}

/// Checks `hsl(h,s,l)` and `hsla(h,s,l,a)`
fn is_hsl(value: &str) -> bool {
    let hsl = |args: &[&str]| is_number(args[0]) && is_percentage(args[1]) && is_percentage(args[2]);

    if let Some(args) = function_args(value, "hsl") {
        return args.len() == 3 && hsl(&args);
    }
    if let Some(args) = function_args(value, "hsla") {
        return args.len() == 4 && hsl(&args) && is_number(args[3]);
    }
    false
}

/// `<color>`: keywords, `#rgb`, `#rrggbb` and the rgb/hsl functional notations
#[must_use]
pub fn is_color(value: &str) -> bool {
    let value = value.trim();
    let lower = value.cow_to_ascii_lowercase();

    if lower == "transparent" || NAMED_COLORS.contains(lower.as_ref()) || SYSTEM_COLORS.contains(lower.as_ref()) {
        return true;
    }

    if value.starts_with('#') {
        return (value.len() == 4 || value.len() == 7) && is_hex(value);
    }

    is_rgb(value) || is_hsl(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("red", true)]
    #[test_case("RebeccaPurple", true)]
    #[test_case("transparent", true)]
    #[test_case("ButtonFace", true)]
    #[test_case("#ff0000", true)]
    #[test_case("#F00", true)]
    #[test_case("#ff00", false)]
    #[test_case("#gg0000", false)]
    #[test_case("rgb(255, 0, 0)", true)]
    #[test_case("rgb(100%,0%,0%)", true)]
    #[test_case("rgba(255, 0, 0, 0.5)", true)]
    #[test_case("rgb(255, 0)", false)]
    #[test_case("rgb(1.5, 0, 0)", false)]
    #[test_case("hsl(120, 100%, 50%)", true)]
    #[test_case("hsla(120, 100%, 50%, .3)", true)]
    #[test_case("hsl(120, 100, 50)", false)]
    #[test_case("bogus", false)]
    #[test_case("url(x)", false)]
    fn test_css_color(value: &str, expected: bool) {
        assert_eq!(is_color(value), expected);
    }
}
