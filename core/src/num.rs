//! Numeric payload conversion.

use crate::error::ParseError;

/// Parse the raw text of an integer token into an `i64`.
///
/// The magnitude is accumulated positively and the sign applied last, so
/// the text of `i64::MIN` itself reports overflow. Digits are guaranteed
/// by the lexer; anything unexpected is treated as overflow rather than
/// trusted.
pub(crate) fn parse_integer(text: &[u8]) -> Result<i64, ParseError> {
    let (sign, digits) = match text.split_first() {
        Some((b'-', rest)) => (-1i64, rest),
        _ => (1i64, text),
    };

    let mut value: i64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return Err(ParseError::IntegerOverflow);
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add((b - b'0') as i64))
            .ok_or(ParseError::IntegerOverflow)?;
    }
    Ok(sign * value)
}

/// Parse the raw text of a double token into an `f64`.
///
/// JSON's number grammar is a subset of Rust's float syntax, so the
/// standard parser applies directly; a finite-looking literal that comes
/// back infinite has overflowed.
pub(crate) fn parse_double(text: &[u8]) -> Result<f64, ParseError> {
    let s = std::str::from_utf8(text).map_err(|_| ParseError::DoubleOverflow)?;
    let value: f64 = s.parse().map_err(|_| ParseError::DoubleOverflow)?;
    if value.is_infinite() {
        return Err(ParseError::DoubleOverflow);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(b"0", 0)]
    #[test_case(b"42", 42)]
    #[test_case(b"-17", -17)]
    #[test_case(b"9223372036854775807", i64::MAX)]
    #[test_case(b"-9223372036854775807", i64::MIN + 1)]
    fn test_integers(text: &[u8], expect: i64) {
        assert_eq!(parse_integer(text), Ok(expect));
    }

    #[test]
    fn test_integer_overflow() {
        assert_eq!(
            parse_integer(b"9223372036854775808"),
            Err(ParseError::IntegerOverflow)
        );
        // the magnitude of i64::MIN is not representable positively
        assert_eq!(
            parse_integer(b"-9223372036854775808"),
            Err(ParseError::IntegerOverflow)
        );
    }

    #[test_case(b"3.5", 3.5)]
    #[test_case(b"-1.5e-3", -1.5e-3)]
    #[test_case(b"2.5E10", 2.5e10)]
    #[test_case(b"1e0", 1.0)]
    fn test_doubles(text: &[u8], expect: f64) {
        assert_eq!(parse_double(text), Ok(expect));
    }

    #[test]
    fn test_double_overflow() {
        assert_eq!(parse_double(b"1e999"), Err(ParseError::DoubleOverflow));
        assert_eq!(parse_double(b"-1e999"), Err(ParseError::DoubleOverflow));
    }
}
