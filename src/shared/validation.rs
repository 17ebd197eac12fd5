//! Shared validation helpers

use regex::Regex;
use std::sync::OnceLock;

/// Maximum accepted reference id length. Reference ids are composed from
/// lead id, report id and a timestamp, none of which should approach this.
pub const MAX_REF_ID_LENGTH: usize = 200;

fn ref_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static pattern"))
}

/// Check whether a caller-supplied reference id has a plausible shape before
/// it is forwarded to the provider.
pub fn is_valid_ref_id(ref_id: &str) -> bool {
    !ref_id.is_empty() && ref_id.len() <= MAX_REF_ID_LENGTH && ref_id_pattern().is_match(ref_id)
}

/// Format an amount as the fixed-point decimal string with two fraction
/// digits that the provider's payment endpoint expects.
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}
