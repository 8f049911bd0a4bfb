//! Category use cases

use catalog_core::models::{Category, SearchInput, SearchOutput};
use catalog_core::{cancellable, ensure_not_cancelled, AppError};
use catalog_db::{CategoryRepository, UnitOfWork};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::persist;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCategoryInput {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryOutput {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Category> for CategoryOutput {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            is_active: category.is_active,
            created_at: category.created_at,
        }
    }
}

#[derive(Clone)]
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
    uow: Arc<dyn UnitOfWork>,
}

impl CategoryService {
    pub fn new(categories: Arc<dyn CategoryRepository>, uow: Arc<dyn UnitOfWork>) -> Self {
        Self { categories, uow }
    }

    #[tracing::instrument(skip(self, input, cancel), fields(category.name = %input.name))]
    pub async fn create(
        &self,
        input: CreateCategoryInput,
        cancel: &CancellationToken,
    ) -> Result<CategoryOutput, AppError> {
        ensure_not_cancelled(cancel)?;
        let category = Category::new(
            input.name,
            input.description.unwrap_or_default(),
            input.is_active,
        )?;

        persist(self.uow.as_ref(), cancel, self.categories.insert(&category)).await?;

        tracing::info!(category_id = %category.id, "Category created");
        Ok(category.into())
    }

    #[tracing::instrument(skip(self, input, cancel), fields(category.id = %input.id))]
    pub async fn update(
        &self,
        input: UpdateCategoryInput,
        cancel: &CancellationToken,
    ) -> Result<CategoryOutput, AppError> {
        let mut category = cancellable(cancel, self.categories.get(input.id)).await?;
        category.update(input.name, input.description)?;
        match input.is_active {
            Some(true) => category.activate(),
            Some(false) => category.deactivate(),
            None => {}
        }

        persist(self.uow.as_ref(), cancel, self.categories.update(&category)).await?;
        Ok(category.into())
    }

    pub async fn get(&self, id: Uuid, cancel: &CancellationToken) -> Result<CategoryOutput, AppError> {
        let category = cancellable(cancel, self.categories.get(id)).await?;
        Ok(category.into())
    }

    #[tracing::instrument(skip(self, cancel))]
    pub async fn delete(&self, id: Uuid, cancel: &CancellationToken) -> Result<(), AppError> {
        let category = cancellable(cancel, self.categories.get(id)).await?;
        persist(self.uow.as_ref(), cancel, self.categories.delete(&category)).await?;
        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }

    pub async fn list(
        &self,
        input: &SearchInput,
        cancel: &CancellationToken,
    ) -> Result<SearchOutput<CategoryOutput>, AppError> {
        let page = cancellable(cancel, self.categories.search(input)).await?;
        Ok(page.map(CategoryOutput::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::InMemoryCatalog;

    fn service(catalog: &Arc<InMemoryCatalog>) -> CategoryService {
        CategoryService::new(catalog.clone(), catalog.clone())
    }

    #[tokio::test]
    async fn test_create_and_get_category() {
        let catalog = InMemoryCatalog::new();
        let service = service(&catalog);
        let cancel = CancellationToken::new();

        let created = service
            .create(
                CreateCategoryInput {
                    name: "Documentary".to_string(),
                    description: Some("Real stories".to_string()),
                    is_active: true,
                },
                &cancel,
            )
            .await
            .unwrap();

        let fetched = service.get(created.id, &cancel).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(catalog.commit_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_name_is_entity_validation() {
        let catalog = InMemoryCatalog::new();
        let result = service(&catalog)
            .create(
                CreateCategoryInput {
                    name: "  ".to_string(),
                    description: None,
                    is_active: true,
                },
                &CancellationToken::new(),
            )
            .await;

        assert!(matches!(result, Err(AppError::EntityValidation(_))));
        assert_eq!(catalog.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_update_keeps_description_when_omitted() {
        let catalog = InMemoryCatalog::new();
        let service = service(&catalog);
        let cancel = CancellationToken::new();
        let created = service
            .create(
                CreateCategoryInput {
                    name: "Drama".to_string(),
                    description: Some("Serious".to_string()),
                    is_active: true,
                },
                &cancel,
            )
            .await
            .unwrap();

        let updated = service
            .update(
                UpdateCategoryInput {
                    id: created.id,
                    name: "Dramas".to_string(),
                    description: None,
                    is_active: Some(false),
                },
                &cancel,
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Dramas");
        assert_eq!(updated.description, "Serious");
        assert!(!updated.is_active);
    }

    #[tokio::test]
    async fn test_get_missing_category_is_not_found() {
        let catalog = InMemoryCatalog::new();
        let result = service(&catalog)
            .get(Uuid::new_v4(), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_then_list() {
        let catalog = InMemoryCatalog::new();
        let service = service(&catalog);
        let cancel = CancellationToken::new();
        let ids = catalog.seed_categories(3);

        service.delete(ids[0], &cancel).await.unwrap();

        let page = service.list(&SearchInput::default(), &cancel).await.unwrap();
        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|c| c.id != ids[0]));
    }
}
