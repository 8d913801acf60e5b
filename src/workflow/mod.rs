//! Approval workflow engine.
//!
//! Each operation checks the caller's role first, then hands the store a
//! single conditional mutation. A `false` from the store becomes a 404 with
//! the operation's "not found or already processed" message.

pub mod expense;
pub mod resource;
pub mod states;

use crate::errors::{AppError, AppResult};

/// Optional text on an edit: absent leaves the field alone, blank is rejected.
pub(crate) fn optional_text(value: Option<&str>, field: &str) -> AppResult<Option<String>> {
    match value.map(str::trim) {
        None => Ok(None),
        Some("") => Err(AppError::validation(format!("{field} cannot be empty!"))),
        Some(text) => Ok(Some(text.to_string())),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::authz::Role;
    use crate::jwt::AuthUser;

    pub fn user(employee_id: i64, role: Role) -> AuthUser {
        AuthUser {
            employee_id,
            role,
            department: role.as_str().to_lowercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_text_distinguishes_absent_from_blank() {
        assert_eq!(optional_text(None, "Name").unwrap(), None);
        assert_eq!(optional_text(Some("  Meals "), "Name").unwrap(), Some("Meals".to_string()));
        assert!(matches!(optional_text(Some("   "), "Name"), Err(AppError::Validation(_))));
    }
}
