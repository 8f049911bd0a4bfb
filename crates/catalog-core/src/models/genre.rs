use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::relation::RelationSet;
use crate::error::AppError;
use crate::validation::validate_entity;

/// Genre aggregate
///
/// `categories` is never loaded together with the genre row: repositories
/// fill it from the `genres_categories` join table on every read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Genre {
    pub id: Uuid,
    #[validate(
        custom(function = "crate::validation::not_blank"),
        length(max = 255, message = "Name must be at most 255 characters")
    )]
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub categories: RelationSet,
}

impl Genre {
    pub fn new(name: String, is_active: bool) -> Result<Self, AppError> {
        let genre = Genre {
            id: Uuid::new_v4(),
            name,
            is_active,
            created_at: Utc::now(),
            categories: RelationSet::default(),
        };
        validate_entity(&genre)?;
        Ok(genre)
    }

    pub fn update(&mut self, name: String) -> Result<(), AppError> {
        self.name = name;
        validate_entity(self)
    }

    pub fn activate(&mut self) {
        self.is_active = true;
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    pub fn add_category(&mut self, category_id: Uuid) {
        self.categories.add(category_id);
    }

    pub fn remove_category(&mut self, category_id: &Uuid) {
        self.categories.remove(category_id);
    }

    pub fn remove_all_categories(&mut self) {
        self.categories.clear();
    }
}
