//! ID generation utilities.

use uuid::Uuid;

/// Generates a new time-ordered identifier.
///
/// Every entity the core creates (requests, folders, collections, tabs,
/// history entries) uses this format.
#[must_use]
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

/// Returns true if `id` is usable as a persistence key.
///
/// Ids end up as file names in file-backed stores, so path separators and
/// parent references are rejected along with blank strings.
#[must_use]
pub fn is_valid_id(id: &str) -> bool {
    let trimmed = id.trim();
    !trimmed.is_empty()
        && trimmed == id
        && !id.contains(['/', '\\'])
        && id != "."
        && id != ".."
}

/// An entity persisted under a stable id.
pub trait Identified {
    /// Returns the persistence key.
    fn id(&self) -> &str;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_format() {
        let id = generate_id();
        assert_eq!(id.len(), 36);
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_generate_id_uniqueness() {
        assert_ne!(generate_id(), generate_id());
    }

    #[test]
    fn test_id_validation() {
        assert!(is_valid_id(&generate_id()));
        assert!(is_valid_id("req-1"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id(" padded "));
        assert!(!is_valid_id("../escape"));
        assert!(!is_valid_id(".."));
    }
}
