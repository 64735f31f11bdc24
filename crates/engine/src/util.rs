//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

/// Canonical lookup key for a display name.
///
/// NFKD-normalized, combining marks stripped, lowercased, inner whitespace
/// collapsed. Two names mapping to the same key are the same catalog entry.
pub(crate) fn normalize_name_key(value: &str) -> String {
    let stripped: String = value
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_key_strips_accents_and_case() {
        assert_eq!(normalize_name_key("Scïence  Fictiön"), "science fiction");
    }

    #[test]
    fn name_key_collapses_whitespace() {
        assert_eq!(normalize_name_key("  History \t of Art "), "history of art");
    }
}
