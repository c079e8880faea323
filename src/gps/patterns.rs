//! # Field Pattern Library
//!
//! Text patterns for the sentences the receiver pair emits. Patterns are
//! compiled once on first use.
//!
//! Every numeric field is an optional group: an empty field still matches the
//! sentence structurally and decodes to a missing value.

use once_cell::sync::Lazy;
use regex::Regex;

/// Decimal token as emitted by the receivers
pub const NUMERIC: &str = r"[+-]?[0-9]*\.?[0-9]+";

/// Device tags that prefix every sub-message
pub const SOURCE_TAGS: &[&str] = &["gps1", "gps2"];

/// Orientation sentence preamble
pub const ORIENTATION_TAG: &str = "$PTNL,AVR";

/// Position sentence tag
pub const POSITION_TAG: &str = "$GPGGA";

/// `<tag>,<ws><payload to end of line>`
///
/// Groups: 1 = tag, 2 = payload.
pub static SUB_MESSAGE: Lazy<Regex> =
    Lazy::new(|| compile(&format!(r"({}),\s*(.*)", SOURCE_TAGS.join("|"))));

/// `$PTNL,AVR,<time>,<yaw>,Yaw,<tilt>,Tilt`
///
/// Groups: 1 = yaw, 2 = tilt.
pub static ORIENTATION: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r"\$PTNL,AVR,(?:{n})?,({n})?,Yaw,({n})?,Tilt",
        n = NUMERIC
    ))
});

/// `$GPGGA,<time>,<lat>,<N|S>,<lon>,<E|W>,<quality>,<sats>,<hdop>,<alt>,M`
///
/// Groups: 1 = time, 2 = latitude, 3 = N/S, 4 = longitude, 5 = E/W,
/// 6 = fix quality, 7 = satellites, 8 = hdop, 9 = altitude.
pub static POSITION: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        concat!(
            r"\$GPGGA,({n})?,",   // fix time
            r"({n})?,([NS])?,",   // latitude
            r"({n})?,([EW])?,",   // longitude
            r"({n})?,",           // fix quality
            r"({n})?,",           // number of satellites
            r"({n})?,",           // hdop
            r"({n})?,M",          // altitude
        ),
        n = NUMERIC
    ))
});

/// `HHMMSS.ff` fix time; the fraction is matched and discarded.
///
/// Groups: 1 = hours, 2 = minutes, 3 = seconds.
pub static FIX_TIME: Lazy<Regex> = Lazy::new(|| compile(r"^(\d{2})(\d{2})(\d{2})\.\d{2}$"));

fn compile(pattern: &str) -> Regex {
    // Patterns are fixed at compile time; the tests below force every one of them.
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_patterns_compile() {
        Lazy::force(&SUB_MESSAGE);
        Lazy::force(&ORIENTATION);
        Lazy::force(&POSITION);
        Lazy::force(&FIX_TIME);
    }

    #[test]
    fn test_numeric_requires_a_digit() {
        let re = Regex::new(&format!("^{}$", NUMERIC)).unwrap();
        for ok in ["1", "-1", "+1.5", ".5", "0012.34"] {
            assert!(re.is_match(ok), "{} should match", ok);
        }
        for bad in ["", "-", ".", "1.", "1e5"] {
            assert!(!re.is_match(bad), "{} should not match", bad);
        }
    }

    #[test]
    fn test_sub_message_stops_at_line_end() {
        let text = "gps1, first\ngps2, second";
        let payloads: Vec<&str> = SUB_MESSAGE
            .captures_iter(text)
            .map(|c| c.get(2).unwrap().as_str())
            .collect();
        assert_eq!(payloads, vec!["first", "second"]);
    }

    #[test]
    fn test_position_groups() {
        let caps = POSITION
            .captures("$GPGGA,123456.00,4512.34,N,01123.45,E,1,08,0.9,123.4,M")
            .unwrap();
        assert_eq!(&caps[1], "123456.00");
        assert_eq!(&caps[2], "4512.34");
        assert_eq!(&caps[3], "N");
        assert_eq!(&caps[4], "01123.45");
        assert_eq!(&caps[5], "E");
        assert_eq!(&caps[9], "123.4");
    }

    #[test]
    fn test_position_allows_empty_fields() {
        let caps = POSITION.captures("$GPGGA,123456.00,4512.34,N,01123.45,E,,,,,M").unwrap();
        assert!(caps.get(6).is_none());
        assert!(caps.get(9).is_none());
    }

    #[test]
    fn test_fix_time_requires_two_digit_fraction() {
        assert!(FIX_TIME.is_match("235959.00"));
        assert!(FIX_TIME.is_match("000000.50"));
        assert!(!FIX_TIME.is_match("23595.00"));
        assert!(!FIX_TIME.is_match("235959"));
        assert!(!FIX_TIME.is_match("235959.0"));
    }

    #[test]
    fn test_tags_are_exposed_for_builders() {
        assert!(POSITION.is_match(&format!("{},,,,,,,,,,M", POSITION_TAG)));
        assert!(ORIENTATION.is_match(&format!("{},,,Yaw,,Tilt", ORIENTATION_TAG)));
    }
}
