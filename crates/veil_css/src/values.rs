//! Scalar value checks: numbers, dimensions and the small functional notations that the value
//! lexer keeps as plain words.
use cow_utils::CowUtils;
use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{char, digit1, one_of};
use nom::combinator::{all_consuming, opt, recognize};
use nom::sequence::{pair, tuple};
use nom::IResult;

/// Units accepted for a `<length>`
const LENGTH_UNITS: &[&str] = &[
    "em", "ex", "px", "in", "cm", "mm", "pt", "pc", "ch", "rem", "vw", "vh", "vmin", "vmax",
];
const ANGLE_UNITS: &[&str] = &["deg", "grad", "rad", "turn"];
const TIME_UNITS: &[&str] = &["ms", "s"];
const FREQUENCY_UNITS: &[&str] = &["hz", "khz"];

/// Largest absolute `a` or `b` accepted in an `an+b` expression
const MAX_NTH: i64 = 999_999;

/// Recognizes a CSS number: optional sign, digits with an optional fraction or a bare
/// fraction, and an optional integer exponent.
fn number(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(one_of("+-")),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit1)))),
            recognize(pair(char('.'), digit1)),
        )),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)
}

fn integer(input: &str) -> IResult<&str, &str> {
    recognize(pair(opt(one_of("+-")), digit1))(input)
}

/// Splits a dimension into its finite numeric value and its (possibly empty) unit
#[must_use]
pub fn split_dimension(value: &str) -> Option<(f64, &str)> {
    let (unit, num) = number(value).ok()?;
    let num: f64 = num.parse().ok()?;
    if !num.is_finite() {
        return None;
    }
    Some((num, unit))
}

fn has_unit(value: &str, units: &[&str]) -> bool {
    match split_dimension(value.trim()) {
        Some((_, unit)) => {
            let unit = unit.cow_to_ascii_lowercase();
            units.contains(&unit.as_ref())
        }
        None => false,
    }
}

/// `<integer>`: fits in a signed 32 bit integer
#[must_use]
pub fn is_integer(value: &str) -> bool {
    all_consuming(integer)(value).is_ok() && value.parse::<i32>().is_ok()
}

/// `<number>`
#[must_use]
pub fn is_number(value: &str) -> bool {
    matches!(split_dimension(value), Some((_, "")))
}

/// `<percentage>`
#[must_use]
pub fn is_percentage(value: &str) -> bool {
    matches!(split_dimension(value), Some((_, "%")))
}

/// `<length>`: a number with a length unit, or a unitless zero
#[must_use]
pub fn is_length(value: &str) -> bool {
    match split_dimension(value.trim()) {
        Some((num, "")) => num == 0.0,
        Some(_) => has_unit(value, LENGTH_UNITS),
        None => false,
    }
}

/// `<angle>`
#[must_use]
pub fn is_angle(value: &str) -> bool {
    has_unit(value, ANGLE_UNITS)
}

/// `<time>`
#[must_use]
pub fn is_time(value: &str) -> bool {
    has_unit(value, TIME_UNITS)
}

/// `<frequency>`: a positive number, optionally in hz or khz
#[must_use]
pub fn is_frequency(value: &str) -> bool {
    match split_dimension(value.trim()) {
        Some((num, "")) => num > 0.0,
        Some((num, _)) => num > 0.0 && has_unit(value, FREQUENCY_UNITS),
        None => false,
    }
}

/// Returns the comma separated arguments of `name(...)` when `value` is exactly that function
/// call. The name is matched case-insensitively and every argument must be non-empty.
#[must_use]
pub fn function_args<'a>(value: &'a str, name: &str) -> Option<Vec<&'a str>> {
    let value = value.trim();
    let open = name.len();
    if value.len() < open + 2
        || !value.is_char_boundary(open)
        || !value[..open].eq_ignore_ascii_case(name)
        || !value[open..].starts_with('(')
        || !value.ends_with(')')
    {
        return None;
    }

    let inner = &value[open + 1..value.len() - 1];
    let args: Vec<&str> = inner.split(',').map(str::trim).collect();
    if args.iter().any(|a| a.is_empty()) {
        return None;
    }
    Some(args)
}

/// `<shape>`: `rect(top, right, bottom, left)`
#[must_use]
pub fn is_shape(value: &str) -> bool {
    match function_args(value, "rect") {
        Some(args) => {
            args.len() == 4
                && args
                    .iter()
                    .all(|a| a.eq_ignore_ascii_case("auto") || is_length(a))
        }
        None => false,
    }
}

fn is_length_or_percentage(value: &str) -> bool {
    is_length(value) || is_percentage(value)
}

fn is_angle_or_number(value: &str) -> bool {
    is_angle(value) || is_number(value)
}

/// A single 2D transform function
#[must_use]
pub fn is_transform(value: &str) -> bool {
    let value = value.trim();
    let Some(paren) = value.find('(') else {
        return false;
    };
    let name = value[..paren].cow_to_ascii_lowercase();
    let Some(args) = function_args(value, &value[..paren]) else {
        return false;
    };

    match name.as_ref() {
        "matrix" => args.len() == 6 && args.iter().all(|a| is_number(a)),
        "translate" => (1..=2).contains(&args.len()) && args.iter().all(|a| is_length_or_percentage(a)),
        "translatex" | "translatey" => args.len() == 1 && is_length_or_percentage(args[0]),
        "scale" => (1..=2).contains(&args.len()) && args.iter().all(|a| is_number(a)),
        "scalex" | "scaley" => args.len() == 1 && is_number(args[0]),
        "rotate" => args.len() == 1 && is_angle(args[0]),
        "skew" => (1..=2).contains(&args.len()) && args.iter().all(|a| is_angle_or_number(a)),
        "skewx" | "skewy" => args.len() == 1 && is_angle_or_number(args[0]),
        _ => false,
    }
}

/// Parses the `b` part of an `an+b` expression: a sign directly followed by digits
fn nth_offset(input: &str) -> IResult<&str, &str> {
    recognize(pair(one_of("+-"), digit1))(input)
}

/// The `a` part: an optional sign and optional digits, followed by `n`
fn nth_step(input: &str) -> IResult<&str, (Option<char>, Option<&str>)> {
    let (input, sign) = opt(one_of("+-"))(input)?;
    let (input, digits) = opt(digit1)(input)?;
    let (input, _) = alt((tag("n"), tag("N")))(input)?;
    Ok((input, (sign, digits)))
}

fn within_nth_range(digits: &str) -> bool {
    digits
        .trim_start_matches(['+', '-'])
        .parse::<i64>()
        .is_ok_and(|v| v <= MAX_NTH)
}

/// Argument of the `:nth-*()` pseudo-classes: `odd`, `even`, an integer or `an+b`. Whitespace
/// is not accepted anywhere in the expression.
#[must_use]
pub fn is_nth(value: &str) -> bool {
    if value.eq_ignore_ascii_case("odd") || value.eq_ignore_ascii_case("even") {
        return true;
    }

    if let Ok((_, num)) = all_consuming(integer)(value) {
        return within_nth_range(num);
    }

    match nth_step(value) {
        Ok((rest, (_, digits))) => {
            if digits.is_some_and(|d| !within_nth_range(d)) {
                return false;
            }
            if rest.is_empty() {
                return true;
            }
            match all_consuming(nth_offset)(rest) {
                Ok((_, offset)) => within_nth_range(offset),
                Err(_) => false,
            }
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("0", true)]
    #[test_case("-12", true)]
    #[test_case("+7", true)]
    #[test_case("1.5", false)]
    #[test_case("99999999999", false)]
    #[test_case("", false)]
    fn test_integer(value: &str, expected: bool) {
        assert_eq!(is_integer(value), expected);
    }

    #[test_case("1.5", true)]
    #[test_case(".5", true)]
    #[test_case("-3e2", true)]
    #[test_case("1.", false)]
    #[test_case("1e", false)]
    #[test_case("NaN", false)]
    #[test_case("Infinity", false)]
    fn test_number(value: &str, expected: bool) {
        assert_eq!(is_number(value), expected);
    }

    #[test_case("10px", true)]
    #[test_case("1.5em", true)]
    #[test_case("2REM", true)]
    #[test_case("0", true)]
    #[test_case("0.0", true)]
    #[test_case("10", false)]
    #[test_case("1.5", false)]
    #[test_case("10furlongs", false)]
    #[test_case("px", false)]
    #[test_case("1e400px", false)]
    fn test_length(value: &str, expected: bool) {
        assert_eq!(is_length(value), expected);
    }

    #[test_case("50%", true)]
    #[test_case("-2.5%", true)]
    #[test_case("%", false)]
    #[test_case("5", false)]
    fn test_percentage(value: &str, expected: bool) {
        assert_eq!(is_percentage(value), expected);
    }

    #[test]
    fn test_units() {
        assert!(is_angle("90deg"));
        assert!(is_angle("-1.2rad"));
        assert!(!is_angle("90"));
        assert!(is_time("200ms"));
        assert!(is_time("2s"));
        assert!(!is_time("2m"));
        assert!(is_frequency("440hz"));
        assert!(is_frequency("2KHz"));
        assert!(is_frequency("12"));
        assert!(!is_frequency("-12hz"));
    }

    #[test_case("rect(1px, 2px, 3px, 4px)", true)]
    #[test_case("rect(auto,auto,0,auto)", true)]
    #[test_case("rect(1px, 2px, 3px)", false)]
    #[test_case("rect(1px, 2px, 3px, 4)", false)]
    #[test_case("circle(1px)", false)]
    fn test_shape(value: &str, expected: bool) {
        assert_eq!(is_shape(value), expected);
    }

    #[test_case("rotate(45deg)", true)]
    #[test_case("translate(10px, 50%)", true)]
    #[test_case("translateX(2em)", true)]
    #[test_case("scale(1.5)", true)]
    #[test_case("scaleY(2)", true)]
    #[test_case("matrix(1, 0, 0, 1, 0, 0)", true)]
    #[test_case("skew(10deg, 0.5)", true)]
    #[test_case("rotate(45)", false)]
    #[test_case("matrix(1, 0)", false)]
    #[test_case("perspective(10px)", false)]
    #[test_case("translate()", false)]
    fn test_transform(value: &str, expected: bool) {
        assert_eq!(is_transform(value), expected);
    }

    #[test_case("odd", true)]
    #[test_case("even", true)]
    #[test_case("3", true)]
    #[test_case("n", true)]
    #[test_case("-n", true)]
    #[test_case("-n+1", true)]
    #[test_case("n-1", true)]
    #[test_case("2n", true)]
    #[test_case("10n", true)]
    #[test_case("2n+1", true)]
    #[test_case("-2n+1", true)]
    #[test_case("+1", true)]
    #[test_case("-1", true)]
    #[test_case("", false)]
    #[test_case("-", false)]
    #[test_case("+", false)]
    #[test_case("2+n", false)]
    #[test_case("2n+1+1", false)]
    #[test_case("+-2n", false)]
    #[test_case("-+2n", false)]
    #[test_case("2n1", false)]
    #[test_case("n3", false)]
    #[test_case("n+n", false)]
    #[test_case("2n+-1", false)]
    #[test_case("2n-+1", false)]
    #[test_case("2n + 1", false)]
    #[test_case("1000000n", false)]
    #[test_case("n+1000000", false)]
    fn test_nth(value: &str, expected: bool) {
        assert_eq!(is_nth(value), expected);
    }
}
