use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::relation::RelationSet;
use crate::error::AppError;
use crate::events::DomainEvent;
use crate::validation::validate_entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "ER")]
    Er,
    L,
    #[serde(rename = "10")]
    Rate10,
    #[serde(rename = "12")]
    Rate12,
    #[serde(rename = "14")]
    Rate14,
    #[serde(rename = "16")]
    Rate16,
    #[serde(rename = "18")]
    Rate18,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Er => "ER",
            Rating::L => "L",
            Rating::Rate10 => "10",
            Rating::Rate12 => "12",
            Rating::Rate14 => "14",
            Rating::Rate16 => "16",
            Rating::Rate18 => "18",
        }
    }
}

impl Display for Rating {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ER" => Ok(Rating::Er),
            "L" => Ok(Rating::L),
            "10" => Ok(Rating::Rate10),
            "12" => Ok(Rating::Rate12),
            "14" => Ok(Rating::Rate14),
            "16" => Ok(Rating::Rate16),
            "18" => Ok(Rating::Rate18),
            _ => Err(AppError::EntityValidation(format!("Invalid rating: {}", s))),
        }
    }
}

/// Encoding state of a media sub-entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl MediaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaStatus::Pending => "pending",
            MediaStatus::Processing => "processing",
            MediaStatus::Completed => "completed",
            MediaStatus::Error => "error",
        }
    }
}

impl Display for MediaStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(MediaStatus::Pending),
            "processing" => Ok(MediaStatus::Processing),
            "completed" => Ok(MediaStatus::Completed),
            "error" => Ok(MediaStatus::Error),
            _ => Err(AppError::InvalidInput(format!("Invalid media status: {}", s))),
        }
    }
}

/// Stored image (thumb, thumb half, banner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub path: String,
}

impl Image {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Stored video file (main media or trailer) and its encoding state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub id: Uuid,
    pub file_path: String,
    pub encoded_path: Option<String>,
    pub status: MediaStatus,
}

impl Media {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_path: file_path.into(),
            encoded_path: None,
            status: MediaStatus::Pending,
        }
    }

    pub fn update_as_sent_to_encode(&mut self) {
        self.status = MediaStatus::Processing;
    }

    pub fn update_as_encoded(&mut self, encoded_path: impl Into<String>) {
        self.status = MediaStatus::Completed;
        self.encoded_path = Some(encoded_path.into());
    }

    pub fn update_as_encoding_error(&mut self) {
        self.status = MediaStatus::Error;
        self.encoded_path = None;
    }
}

/// Scalar fields of a video, validated together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDetails {
    pub title: String,
    pub description: String,
    pub year_launched: i32,
    pub opened: bool,
    pub published: bool,
    pub duration: i32,
    pub rating: Rating,
}

/// Video aggregate root
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Video {
    pub id: Uuid,
    #[validate(
        custom(function = "crate::validation::not_blank"),
        length(max = 255, message = "Title must be at most 255 characters")
    )]
    pub title: String,
    #[validate(
        custom(function = "crate::validation::not_blank"),
        length(max = 4000, message = "Description must be at most 4000 characters")
    )]
    pub description: String,
    pub year_launched: i32,
    pub opened: bool,
    pub published: bool,
    pub duration: i32,
    pub rating: Rating,
    pub created_at: DateTime<Utc>,
    pub thumb: Option<Image>,
    pub thumb_half: Option<Image>,
    pub banner: Option<Image>,
    pub media: Option<Media>,
    pub trailer: Option<Media>,
    pub categories: RelationSet,
    pub genres: RelationSet,
    pub cast_members: RelationSet,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl Video {
    pub fn new(details: VideoDetails) -> Result<Self, AppError> {
        let video = Video {
            id: Uuid::new_v4(),
            title: details.title,
            description: details.description,
            year_launched: details.year_launched,
            opened: details.opened,
            published: details.published,
            duration: details.duration,
            rating: details.rating,
            created_at: Utc::now(),
            thumb: None,
            thumb_half: None,
            banner: None,
            media: None,
            trailer: None,
            categories: RelationSet::default(),
            genres: RelationSet::default(),
            cast_members: RelationSet::default(),
            events: Vec::new(),
        };
        validate_entity(&video)?;
        Ok(video)
    }

    /// Rebuild a video from persisted state; relation sets come from join rows.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid,
        details: VideoDetails,
        created_at: DateTime<Utc>,
        thumb: Option<Image>,
        thumb_half: Option<Image>,
        banner: Option<Image>,
        media: Option<Media>,
        trailer: Option<Media>,
    ) -> Self {
        Video {
            id,
            title: details.title,
            description: details.description,
            year_launched: details.year_launched,
            opened: details.opened,
            published: details.published,
            duration: details.duration,
            rating: details.rating,
            created_at,
            thumb,
            thumb_half,
            banner,
            media,
            trailer,
            categories: RelationSet::default(),
            genres: RelationSet::default(),
            cast_members: RelationSet::default(),
            events: Vec::new(),
        }
    }

    pub fn details(&self) -> VideoDetails {
        VideoDetails {
            title: self.title.clone(),
            description: self.description.clone(),
            year_launched: self.year_launched,
            opened: self.opened,
            published: self.published,
            duration: self.duration,
            rating: self.rating,
        }
    }

    pub fn update(&mut self, details: VideoDetails) -> Result<(), AppError> {
        self.title = details.title;
        self.description = details.description;
        self.year_launched = details.year_launched;
        self.opened = details.opened;
        self.published = details.published;
        self.duration = details.duration;
        self.rating = details.rating;
        validate_entity(self)
    }

    pub fn update_thumb(&mut self, path: impl Into<String>) {
        self.thumb = Some(Image::new(path));
    }

    pub fn update_thumb_half(&mut self, path: impl Into<String>) {
        self.thumb_half = Some(Image::new(path));
    }

    pub fn update_banner(&mut self, path: impl Into<String>) {
        self.banner = Some(Image::new(path));
    }

    /// Replace the main media file and raise `VideoUploaded` for the encoder.
    pub fn update_media(&mut self, path: impl Into<String>) {
        let path = path.into();
        self.media = Some(Media::new(path.clone()));
        self.events.push(DomainEvent::video_uploaded(self.id, path));
    }

    pub fn update_trailer(&mut self, path: impl Into<String>) {
        self.trailer = Some(Media::new(path));
    }

    pub fn update_as_sent_to_encode(&mut self) -> Result<(), AppError> {
        self.media_mut()?.update_as_sent_to_encode();
        Ok(())
    }

    pub fn update_as_encoded(&mut self, encoded_path: impl Into<String>) -> Result<(), AppError> {
        self.media_mut()?.update_as_encoded(encoded_path);
        Ok(())
    }

    pub fn update_as_encoding_error(&mut self) -> Result<(), AppError> {
        self.media_mut()?.update_as_encoding_error();
        Ok(())
    }

    fn media_mut(&mut self) -> Result<&mut Media, AppError> {
        self.media
            .as_mut()
            .ok_or_else(|| AppError::EntityValidation("There is no media".to_string()))
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

    pub fn add_genre(&mut self, genre_id: Uuid) {
        self.genres.add(genre_id);
    }

    pub fn remove_genre(&mut self, genre_id: &Uuid) {
        self.genres.remove(genre_id);
    }

    pub fn remove_all_genres(&mut self) {
        self.genres.clear();
    }

    pub fn add_cast_member(&mut self, cast_member_id: Uuid) {
        self.cast_members.add(cast_member_id);
    }

    pub fn remove_cast_member(&mut self, cast_member_id: &Uuid) {
        self.cast_members.remove(cast_member_id);
    }

    pub fn remove_all_cast_members(&mut self) {
        self.cast_members.clear();
    }

    /// Events raised since the aggregate was loaded or last committed.
    pub fn events(&self) -> &[DomainEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}
