//! Request validation helpers.
//!
//! Field constraints live in static schema structs (`validator`
//! derive) on the request DTOs; the helpers here cover the cases the
//! wire contract distinguishes beyond that: missing fields
//! (`required`), values outside a closed set (`only`), and the
//! free-form `dependents` map.

use std::collections::BTreeMap;

use ballot_common::{AppError, AppResult};

/// The only accepted voting principal kind.
pub const VOTER_TYPE_USER: &str = "sys/user";

const MAX_ENTITY_NAME_LEN: usize = 64;
const MAX_ENTITY_ID_LEN: usize = 64;

/// Unwrap a required field, or fail with reason `required` at `path`.
pub fn required<T>(value: Option<T>, path: &[&str]) -> AppResult<T> {
    value.ok_or_else(|| AppError::invalid_field(path.iter().copied(), "required"))
}

/// Check membership in a closed value set, or fail with reason `only`.
pub fn one_of(value: &str, allowed: &[&str], path: &[&str]) -> AppResult<()> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(AppError::invalid_field(path.iter().copied(), "only"))
    }
}

/// Validate a caller-supplied `dependents` map: each key is an entity
/// name, each value an entity id, both non-empty and bounded.
pub fn check_dependents(dependents: &BTreeMap<String, String>) -> AppResult<()> {
    for (name, id) in dependents {
        if name.is_empty() || name.len() > MAX_ENTITY_NAME_LEN {
            return Err(AppError::invalid_field(["dependents"], "length"));
        }
        if id.is_empty() || id.len() > MAX_ENTITY_ID_LEN {
            return Err(AppError::invalid_field(["dependents", name], "length"));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn path_of(err: AppError) -> (Vec<String>, String) {
        match err {
            AppError::Validation { path, why_exactly } => (path, why_exactly),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_required_present() {
        assert_eq!(required(Some(1), &["fields"]).unwrap(), 1);
    }

    #[test]
    fn test_required_missing() {
        let err = required::<String>(None, &["fields", "title"]).unwrap_err();
        let (path, why) = path_of(err);
        assert_eq!(path, vec!["fields", "title"]);
        assert_eq!(why, "required");
    }

    #[test]
    fn test_one_of_accepts_member() {
        one_of("sys/user", &[VOTER_TYPE_USER], &["fields", "voter_type"]).unwrap();
    }

    #[test]
    fn test_one_of_rejects_outsider() {
        let err = one_of("sys/robot", &[VOTER_TYPE_USER], &["fields", "voter_type"]).unwrap_err();
        let (path, why) = path_of(err);
        assert_eq!(path, vec!["fields", "voter_type"]);
        assert_eq!(why, "only");
    }

    #[test]
    fn test_dependents_accepts_reasonable_map() {
        let deps = BTreeMap::from([("poll".to_string(), "p1".to_string())]);
        check_dependents(&deps).unwrap();
    }

    #[test]
    fn test_dependents_rejects_blank_id() {
        let deps = BTreeMap::from([("poll".to_string(), String::new())]);
        let err = check_dependents(&deps).unwrap_err();
        let (path, why) = path_of(err);
        assert_eq!(path, vec!["dependents", "poll"]);
        assert_eq!(why, "length");
    }

    #[test]
    fn test_dependents_rejects_oversized_name() {
        let deps = BTreeMap::from([("e".repeat(65), "p1".to_string())]);
        let err = check_dependents(&deps).unwrap_err();
        let (path, _) = path_of(err);
        assert_eq!(path, vec!["dependents"]);
    }
}
