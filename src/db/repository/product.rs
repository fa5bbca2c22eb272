//! Product Repository

use std::collections::HashMap;

use chrono::Utc;
use serde_json::Value;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Product, ProductCreate, ProductUpdate};
use crate::db::query::ListQuery;

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// List products according to raw request parameters
    ///
    /// Returns raw JSON rows because the `fields` parameter may project an
    /// arbitrary subset of the document.
    pub async fn list(&self, params: &HashMap<String, String>) -> RepoResult<Vec<Value>> {
        let list_query = ListQuery::from_params("product", params);
        let (query, binds) = list_query.build();

        let mut result = self.base.db().query(query).bind(binds).await?;

        if list_query.selects_full_documents() {
            // 走模型反序列化, id 统一为 "product:xyz" 字符串
            let products: Vec<Product> = result.take(0)?;
            let mut rows = Vec::with_capacity(products.len());
            for product in products {
                rows.push(
                    serde_json::to_value(product)
                        .map_err(|e| RepoError::Database(e.to_string()))?,
                );
            }
            Ok(rows)
        } else {
            let rows: Vec<Value> = result.take(0)?;
            Ok(rows)
        }
    }

    /// Find product by id; malformed ids read as missing
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let record: RecordId = match id.parse() {
            Ok(record) => record,
            Err(_) => return Ok(None),
        };
        let product: Option<Product> = self.base.db().select(record).await?;
        Ok(product)
    }

    /// Find product by name
    pub async fn find_by_name(&self, name: &str) -> RepoResult<Option<Product>> {
        let name_owned = name.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM product WHERE name = $name LIMIT 1")
            .bind(("name", name_owned))
            .await?;
        let products: Vec<Product> = result.take(0)?;
        Ok(products.into_iter().next())
    }

    /// Create a new product
    pub async fn create(&self, data: ProductCreate) -> RepoResult<Product> {
        let data = data.normalize();

        // Check duplicate name
        if self.find_by_name(&data.name).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Product '{}' already exists",
                data.name
            )));
        }

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE product SET
                    name = $name,
                    category = $category,
                    price = $price,
                    available = $available,
                    description = $description,
                    stock = $stock,
                    images = $images,
                    ratings_average = $ratings_average,
                    ratings_quantity = $ratings_quantity,
                    created_at = $created_at
                RETURN AFTER"#,
            )
            .bind(("name", data.name))
            .bind(("category", data.category))
            .bind(("price", data.price))
            .bind(("available", data.available))
            .bind(("description", data.description))
            .bind(("stock", data.stock))
            .bind(("images", data.images))
            .bind(("ratings_average", data.ratings_average))
            .bind(("ratings_quantity", data.ratings_quantity))
            .bind(("created_at", Utc::now().timestamp_millis()))
            .await?;

        let created: Option<Product> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    /// Update a product; only the fields present in the patch are touched
    pub async fn update(&self, id: &str, mut data: ProductUpdate) -> RepoResult<Product> {
        let record: RecordId = id
            .parse()
            .map_err(|_| RepoError::NotFound(format!("No product found with ID {}", id)))?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("No product found with ID {}", id)))?;

        data.name = data.name.map(|name| name.trim().to_string());
        data.description = data.description.map(|d| d.trim().to_string());

        // Check duplicate name if changing
        if let Some(ref new_name) = data.name
            && new_name != &existing.name
            && self.find_by_name(new_name).await?.is_some()
        {
            return Err(RepoError::Duplicate(format!(
                "Product '{}' already exists",
                new_name
            )));
        }

        let mut result = self
            .base
            .db()
            .query("UPDATE $record MERGE $data RETURN AFTER")
            .bind(("record", record))
            .bind(("data", data))
            .await?;

        result
            .take::<Option<Product>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("No product found with ID {}", id)))
    }

    /// Hard delete a product
    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let record: RecordId = id
            .parse()
            .map_err(|_| RepoError::NotFound(format!("No product found with ID {}", id)))?;
        let existing: Option<Product> = self.base.db().select(record.clone()).await?;
        if existing.is_none() {
            return Err(RepoError::NotFound(format!(
                "No product found with ID {}",
                id
            )));
        }

        self.base
            .db()
            .query("DELETE $record")
            .bind(("record", record))
            .await?;
        Ok(())
    }
}
