//! Product Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

use super::serde_helpers;

/// Product ID type
pub type ProductId = RecordId;

/// Product category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Mobile,
    Home,
    Apparel,
    HomeAndKitchen,
    Laptop,
    #[default]
    Other,
}

/// Product model matching SurrealDB schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<ProductId>,
    pub name: String,
    #[serde(default)]
    pub category: Category,
    pub price: f64,
    pub available: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub images: Vec<String>,
    /// Kept at one decimal place, see [`round_rating`]
    #[serde(default)]
    pub ratings_average: f64,
    #[serde(default)]
    pub ratings_quantity: i64,
    pub created_at: i64,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProductCreate {
    #[validate(length(
        min = 2,
        max = 70,
        message = "Product name must be between 2 and 70 characters"
    ))]
    pub name: String,
    #[serde(default)]
    pub category: Category,
    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: f64,
    pub available: bool,
    pub description: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "Stock must not be negative"))]
    pub stock: i64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 5.0, message = "Rating must be between 0 and 5"))]
    pub ratings_average: f64,
    #[serde(default)]
    #[validate(range(min = 0, message = "Ratings quantity must not be negative"))]
    pub ratings_quantity: i64,
}

impl ProductCreate {
    /// Trim text fields and round the rating before it ever hits the database
    pub fn normalize(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self.ratings_average = round_rating(self.ratings_average);
        self
    }
}

/// Update product payload: the only fields an admin may patch
///
/// 未知字段直接拒绝 (400), 防止绕过校验写入任意字段。
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(
        min = 2,
        max = 70,
        message = "Product name must be between 2 and 70 characters"
    ))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, message = "Stock must not be negative"))]
    pub stock: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

/// Ratings are stored at one decimal place
pub fn round_rating(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
