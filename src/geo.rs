// src/geo.rs

use once_cell::sync::Lazy;
use regex::Regex;

/// Trailing state-code token of a region name: `", TX"` or `", NY-NJ-PA"`.
/// Every consumer goes through the helpers below so the join keys and the
/// extracted state column can never disagree on what the suffix is.
static STATE_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r", ([A-Z]{2}(?:-[A-Z]{2})*)$").expect("state suffix pattern"));

/// Strip the trailing state-code suffix from a metro name. Applied
/// identically to both sides of any join.
pub fn clean_metro_name(name: &str) -> String {
    STATE_SUFFIX_RE.replace(name, "").into_owned()
}

/// The state-code token itself, if the name carries one.
pub fn state_code(name: &str) -> Option<String> {
    STATE_SUFFIX_RE
        .captures(name)
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_state_suffix() {
        assert_eq!(
            clean_metro_name("Austin-Round Rock-Georgetown, TX"),
            "Austin-Round Rock-Georgetown"
        );
        assert_eq!(
            clean_metro_name("New York-Newark-Jersey City, NY-NJ-PA"),
            "New York-Newark-Jersey City"
        );
        assert_eq!(clean_metro_name("Nowhere Special"), "Nowhere Special");
    }

    #[test]
    fn extracts_the_same_suffix_it_strips() {
        for name in [
            "Austin-Round Rock-Georgetown, TX",
            "Charlotte-Concord-Gastonia, NC-SC",
            "Nowhere Special",
        ] {
            match state_code(name) {
                Some(code) => {
                    assert_eq!(format!("{}, {}", clean_metro_name(name), code), name)
                }
                None => assert_eq!(clean_metro_name(name), name),
            }
        }
    }
}
