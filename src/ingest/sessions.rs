use regex::Regex;
use std::sync::OnceLock;

static DIGIT_RUN: OnceLock<Regex> = OnceLock::new();

/// Session count carried by the text of a `SESIONES` cell.
///
/// Takes the first maximal run of ASCII digits anywhere in the text, so
/// `"12 sesiones"` and `"Sesiones: 7, créditos: 2"` give 12 and 7. Text without
/// digits gives 0. A run too long for `u64` saturates.
pub fn session_count(text: &str) -> u64 {
    let pattern = DIGIT_RUN.get_or_init(|| Regex::new(r"[0-9]+").expect("Hardcode regex pattern"));
    let Some(digits) = pattern.find(text) else {
        return 0;
    };
    match digits.as_str().parse::<u64>() {
        Ok(count) => count,
        Err(_) => {
            tracing::warn!(value = %text, "session count does not fit in 64 bits, saturating");
            u64::MAX
        }
    }
}
