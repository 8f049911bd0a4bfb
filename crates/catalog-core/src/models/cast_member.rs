use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::validation::validate_entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastMemberType {
    Director,
    Actor,
}

impl CastMemberType {
    /// Numeric code persisted in the `cast_members.type` column.
    pub fn code(&self) -> i16 {
        match self {
            CastMemberType::Director => 1,
            CastMemberType::Actor => 2,
        }
    }

    pub fn from_code(code: i16) -> Result<Self, AppError> {
        match code {
            1 => Ok(CastMemberType::Director),
            2 => Ok(CastMemberType::Actor),
            other => Err(AppError::EntityValidation(format!(
                "Unknown cast member type code: {}",
                other
            ))),
        }
    }
}

impl Display for CastMemberType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            CastMemberType::Director => write!(f, "director"),
            CastMemberType::Actor => write!(f, "actor"),
        }
    }
}

impl FromStr for CastMemberType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "director" | "1" => Ok(CastMemberType::Director),
            "actor" | "2" => Ok(CastMemberType::Actor),
            _ => Err(AppError::EntityValidation(format!(
                "Invalid cast member type: {}",
                s
            ))),
        }
    }
}

/// CastMember aggregate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct CastMember {
    pub id: Uuid,
    #[validate(
        custom(function = "crate::validation::not_blank"),
        length(max = 255, message = "Name must be at most 255 characters")
    )]
    pub name: String,
    pub member_type: CastMemberType,
    pub created_at: DateTime<Utc>,
}

impl CastMember {
    pub fn new(name: String, member_type: CastMemberType) -> Result<Self, AppError> {
        let member = CastMember {
            id: Uuid::new_v4(),
            name,
            member_type,
            created_at: Utc::now(),
        };
        validate_entity(&member)?;
        Ok(member)
    }

    pub fn update(&mut self, name: String, member_type: CastMemberType) -> Result<(), AppError> {
        self.name = name;
        self.member_type = member_type;
        validate_entity(self)
    }
}
