//! Category management service

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use shared::{
    category_description_rule, category_name_rule, field_errors, validate_category_image,
    Category, CategoryImage, Item,
};
use uuid::Uuid;
use validator::Validate;

use super::{AdminGuard, DeleteInput};
use crate::error::{AppError, AppResult};
use crate::store::{DynStore, ItemQuery, Write, WriteBatch};

/// Category service for grouping items
#[derive(Clone)]
pub struct CategoryService {
    store: DynStore,
    admin: AdminGuard,
}

/// Input for creating or updating a category
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CategoryInput {
    #[validate(custom = "category_name_rule")]
    pub name: String,
    #[validate(custom = "category_description_rule")]
    pub description: String,
}

/// Picture upload, base64 encoded
#[derive(Debug, Clone, Deserialize)]
pub struct ImageInput {
    pub content_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    #[serde(flatten)]
    pub category: Category,
    /// Active items in the category
    pub item_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub items: Vec<Item>,
}

impl CategoryService {
    /// Create a new CategoryService instance
    pub fn new(store: DynStore, admin: AdminGuard) -> Self {
        Self { store, admin }
    }

    /// All categories by name, with their active item counts
    pub async fn list(&self) -> AppResult<Vec<CategorySummary>> {
        let categories = self.store.list_categories().await?;
        let items = self.store.find_items(&ItemQuery::active()).await?;

        Ok(categories
            .into_iter()
            .map(|category| CategorySummary {
                item_count: items
                    .iter()
                    .filter(|i| i.category == Some(category.id))
                    .count(),
                category,
            })
            .collect())
    }

    /// Get a category with its active items sorted by name
    pub async fn detail(&self, id: Uuid) -> AppResult<CategoryDetail> {
        let category = self.get(id).await?;
        let items = self
            .store
            .find_items(&ItemQuery {
                category: Some(id),
                ..ItemQuery::active()
            })
            .await?;
        Ok(CategoryDetail { category, items })
    }

    pub async fn create(&self, input: CategoryInput) -> AppResult<Category> {
        check(&input)?;
        let category = Category::new(input.name.trim(), input.description.trim());
        self.store
            .commit(WriteBatch::new().with(Write::PutCategory(category.clone())))
            .await?;

        tracing::info!(category_id = %category.id, name = %category.name, "Created category");
        Ok(category)
    }

    /// Rename or redescribe a category; its picture is kept
    pub async fn update(&self, id: Uuid, input: CategoryInput) -> AppResult<Category> {
        let mut category = self.get(id).await?;
        check(&input)?;
        category.name = input.name.trim().to_string();
        category.description = input.description.trim().to_string();

        self.store
            .commit(WriteBatch::new().with(Write::PutCategory(category.clone())))
            .await?;
        Ok(category)
    }

    /// Delete a category. Its items stay, without a category.
    pub async fn delete(&self, id: Uuid, input: &DeleteInput) -> AppResult<()> {
        self.admin.check(input.password.as_deref())?;

        let category = self.get(id).await?;
        self.store
            .commit(
                WriteBatch::new()
                    .with(Write::UncategorizeItems(category.id))
                    .with(Write::DeleteCategory(category.id)),
            )
            .await?;

        tracing::info!(category_id = %id, "Deleted category");
        Ok(())
    }

    /// Attach or replace the category picture
    pub async fn set_image(&self, id: Uuid, input: ImageInput) -> AppResult<Category> {
        let mut category = self.get(id).await?;
        let data = BASE64
            .decode(input.data.trim())
            .map_err(|_| AppError::validation("image", "Image data must be base64 encoded"))?;
        validate_category_image(&input.content_type, data.len())
            .map_err(|message| AppError::validation("image", message))?;

        category.image = Some(CategoryImage {
            content_type: input.content_type.to_lowercase(),
            data,
        });
        self.store
            .commit(WriteBatch::new().with(Write::PutCategory(category.clone())))
            .await?;
        Ok(category)
    }

    pub async fn image(&self, id: Uuid) -> AppResult<CategoryImage> {
        self.get(id)
            .await?
            .image
            .ok_or_else(|| AppError::NotFound("Category image".to_string()))
    }

    async fn get(&self, id: Uuid) -> AppResult<Category> {
        self.store
            .get_category(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Category".to_string()))
    }
}

fn check(input: &CategoryInput) -> AppResult<()> {
    input
        .validate()
        .map_err(|e| AppError::Validation(field_errors(&e)))
}
