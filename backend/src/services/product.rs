//! Product (recipe) service with cost roll-up

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{assemble_products, Product, ProductRow, RecipeItem, RecipeItemRow};
use crate::services::ingredient::IngredientService;
use crate::services::subscription::SubscriptionService;
use shared::{cost_product, index_ingredients, merge_recipe_items, PlanResource, ProductCosting};

const PRODUCT_COLUMNS: &str = "id, business_id, name, selling_price, category, created_at, updated_at";

/// Product service for managing recipes and their costs
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Input for creating or replacing a product
#[derive(Debug, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub selling_price: Decimal,
    pub category: Option<String>,
    #[serde(default)]
    pub recipe: Vec<RecipeItem>,
}

impl ProductService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Check required fields and recipe quantities; merges repeated ingredients
    pub fn validate_input(input: ProductInput) -> AppResult<ProductInput> {
        AppError::check("name", shared::validate_name(&input.name))?;
        AppError::check("selling_price", shared::validate_selling_price(input.selling_price))?;
        for item in &input.recipe {
            AppError::check("recipe.quantity", shared::validate_quantity(item.quantity))?;
        }

        Ok(ProductInput {
            recipe: merge_recipe_items(input.recipe)?,
            ..input
        })
    }

    /// Create a product with its bill of materials
    pub async fn create(&self, business_id: Uuid, input: ProductInput) -> AppResult<Product> {
        let input = Self::validate_input(input)?;

        SubscriptionService::new(self.db.clone())
            .ensure_can_create(business_id, PlanResource::Products)
            .await?;

        let mut tx = self.db.begin().await?;
        Self::ensure_ingredients_exist(&mut *tx, business_id, &input.recipe).await?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products (business_id, name, selling_price, category)
            VALUES ($1, $2, $3, $4)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(business_id)
        .bind(input.name.trim())
        .bind(input.selling_price)
        .bind(&input.category)
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_recipe(&mut *tx, row.id, &input.recipe).await?;
        tx.commit().await?;

        tracing::info!(%business_id, product_id = %row.id, lines = input.recipe.len(), "Product created");

        Ok(Product {
            id: row.id,
            business_id: row.business_id,
            name: row.name,
            selling_price: row.selling_price,
            category: row.category,
            recipe: input.recipe,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    /// Replace a product's fields and recipe
    pub async fn update(
        &self,
        business_id: Uuid,
        product_id: Uuid,
        input: ProductInput,
    ) -> AppResult<Product> {
        let input = Self::validate_input(input)?;

        let mut tx = self.db.begin().await?;
        Self::ensure_ingredients_exist(&mut *tx, business_id, &input.recipe).await?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products
            SET name = $1, selling_price = $2, category = $3, updated_at = NOW()
            WHERE id = $4 AND business_id = $5
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(input.name.trim())
        .bind(input.selling_price)
        .bind(&input.category)
        .bind(product_id)
        .bind(business_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        sqlx::query("DELETE FROM product_ingredients WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        Self::insert_recipe(&mut *tx, product_id, &input.recipe).await?;

        tx.commit().await?;

        Ok(Product {
            id: row.id,
            business_id: row.business_id,
            name: row.name,
            selling_price: row.selling_price,
            category: row.category,
            recipe: input.recipe,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    /// Delete a product. Historical orders keep their lines and prices.
    pub async fn delete(&self, business_id: Uuid, product_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1 AND business_id = $2")
            .bind(product_id)
            .bind(business_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }
        Ok(())
    }

    /// Get a single product with its recipe
    pub async fn get(&self, business_id: Uuid, product_id: Uuid) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND business_id = $2"
        ))
        .bind(product_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let items = sqlx::query_as::<_, RecipeItemRow>(
            "SELECT product_id, ingredient_id, quantity FROM product_ingredients WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(assemble_products(vec![row], items).remove(0))
    }

    /// List all products of a business with their recipes, by name
    pub async fn list(&self, business_id: Uuid) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE business_id = $1 ORDER BY name"
        ))
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;

        let items = sqlx::query_as::<_, RecipeItemRow>(
            r#"
            SELECT pi.product_id, pi.ingredient_id, pi.quantity
            FROM product_ingredients pi
            JOIN products p ON p.id = pi.product_id
            WHERE p.business_id = $1
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;

        Ok(assemble_products(rows, items))
    }

    /// Cost and margin of one product
    pub async fn get_costing(&self, business_id: Uuid, product_id: Uuid) -> AppResult<ProductCosting> {
        let product = self.get(business_id, product_id).await?;
        let ingredients = IngredientService::new(self.db.clone()).list(business_id).await?;

        let costing = cost_product(&product, &index_ingredients(&ingredients))?;
        if !costing.unresolved.is_empty() {
            tracing::warn!(
                %product_id,
                unresolved = costing.unresolved.len(),
                "Recipe references deleted ingredients; skipped in cost"
            );
        }
        Ok(costing)
    }

    /// Cost and margin of every product
    pub async fn list_costings(&self, business_id: Uuid) -> AppResult<Vec<ProductCosting>> {
        let products = self.list(business_id).await?;
        let ingredients = IngredientService::new(self.db.clone()).list(business_id).await?;
        let index = index_ingredients(&ingredients);

        products
            .iter()
            .map(|p| cost_product(p, &index).map_err(AppError::from))
            .collect()
    }

    async fn ensure_ingredients_exist(
        conn: &mut PgConnection,
        business_id: Uuid,
        recipe: &[RecipeItem],
    ) -> AppResult<()> {
        if recipe.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = recipe.iter().map(|i| i.ingredient_id).collect();
        let found: HashSet<Uuid> = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM ingredients WHERE business_id = $1 AND id = ANY($2)",
        )
        .bind(business_id)
        .bind(&ids)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .collect();

        if let Some(missing) = ids.iter().find(|id| !found.contains(*id)) {
            return Err(AppError::NotFound(format!("Ingredient {}", missing)));
        }
        Ok(())
    }

    async fn insert_recipe(
        conn: &mut PgConnection,
        product_id: Uuid,
        recipe: &[RecipeItem],
    ) -> AppResult<()> {
        for item in recipe {
            sqlx::query(
                "INSERT INTO product_ingredients (product_id, ingredient_id, quantity) VALUES ($1, $2, $3)",
            )
            .bind(product_id)
            .bind(item.ingredient_id)
            .bind(item.quantity)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_validate_merges_repeated_ingredients() {
        let flour = Uuid::new_v4();
        let input = ProductInput {
            name: "Pão de mel".to_string(),
            selling_price: dec("6.5"),
            category: None,
            recipe: vec![
                RecipeItem::new(flour, dec("0.05")),
                RecipeItem::new(flour, dec("0.02")),
            ],
        };

        let validated = ProductService::validate_input(input).unwrap();
        assert_eq!(validated.recipe.len(), 1);
        assert_eq!(validated.recipe[0].quantity, dec("0.07"));
    }

    #[test]
    fn test_validate_requires_name_and_price() {
        let missing_name = ProductInput {
            name: String::new(),
            selling_price: dec("5"),
            category: None,
            recipe: vec![],
        };
        assert!(ProductService::validate_input(missing_name).is_err());

        let free = ProductInput {
            name: "Brigadeiro".to_string(),
            selling_price: Decimal::ZERO,
            category: None,
            recipe: vec![],
        };
        assert!(ProductService::validate_input(free).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_recipe_quantity() {
        let input = ProductInput {
            name: "Beijinho".to_string(),
            selling_price: dec("2"),
            category: None,
            recipe: vec![RecipeItem::new(Uuid::new_v4(), Decimal::ZERO)],
        };
        assert!(ProductService::validate_input(input).is_err());
    }
}
