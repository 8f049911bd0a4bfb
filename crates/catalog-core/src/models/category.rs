use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::validation::validate_entity;

/// Category aggregate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Category {
    pub id: Uuid,
    #[validate(
        custom(function = "crate::validation::not_blank"),
        length(min = 3, max = 255, message = "Name must be between 3 and 255 characters")
    )]
    pub name: String,
    #[validate(length(max = 10000, message = "Description must be at most 10000 characters"))]
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: String, description: String, is_active: bool) -> Result<Self, AppError> {
        let category = Category {
            id: Uuid::new_v4(),
            name,
            description,
            is_active,
            created_at: Utc::now(),
        };
        validate_entity(&category)?;
        Ok(category)
    }

    pub fn update(&mut self, name: String, description: Option<String>) -> Result<(), AppError> {
        self.name = name;
        if let Some(description) = description {
            self.description = description;
        }
        validate_entity(self)
    }

    pub fn activate(&mut self) {
        self.is_active = true;
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}
