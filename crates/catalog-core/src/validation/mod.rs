//! Entity validation helpers
//!
//! Aggregates derive `validator::Validate`; these helpers turn failures into
//! `AppError::EntityValidation` and supply the checks the derive lacks.

use std::borrow::Cow;

use validator::{Validate, ValidationError};

use crate::error::AppError;

/// Reject strings that are empty or whitespace only.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some(Cow::Borrowed("must not be empty"));
        return Err(err);
    }
    Ok(())
}

/// Validate an entity, mapping failures to `AppError::EntityValidation`.
pub fn validate_entity<T: Validate>(entity: &T) -> Result<(), AppError> {
    entity.validate().map_err(AppError::from)
}
