//! CSV import of ingredients and products
//!
//! Each source has its own typed row. All rows are parsed and validated
//! first; entities are only created when the whole file is valid.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{RecipeItem, Unit};
use crate::services::ingredient::{CreateIngredientInput, IngredientService};
use crate::services::product::{ProductInput, ProductService};

/// Header row occupies line 1
const FIRST_DATA_ROW: usize = 2;

/// What a CSV file describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportSource {
    Ingredients,
    Products,
}

/// One row of an ingredients file
#[derive(Debug, Deserialize)]
pub struct IngredientImportRow {
    pub name: String,
    pub unit: String,
    pub cost_per_unit: Decimal,
    pub stock: Option<Decimal>,
    pub min_stock: Option<Decimal>,
}

/// One row of a products file; `recipe` reads `name:qty;name:qty`
#[derive(Debug, Deserialize)]
pub struct ProductImportRow {
    pub name: String,
    pub selling_price: Decimal,
    pub category: Option<String>,
    pub recipe: Option<String>,
}

/// Error attached to a file row
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

/// Import outcome
#[derive(Debug, Default, Serialize)]
pub struct ImportResult {
    pub source: Option<ImportSource>,
    pub total_rows: usize,
    pub created: usize,
    pub errors: Vec<RowError>,
}

/// Import service
#[derive(Clone)]
pub struct ImportService {
    db: PgPool,
}

/// Parse every record of `data` into `T`, keeping successes and row errors apart
pub fn read_rows<T>(data: &str) -> (Vec<(usize, T)>, Vec<RowError>)
where
    T: for<'de> Deserialize<'de>,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());

    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for (index, record) in reader.deserialize::<T>().enumerate() {
        let row = index + FIRST_DATA_ROW;
        match record {
            Ok(value) => rows.push((row, value)),
            Err(e) => errors.push(RowError {
                row,
                message: format!("Invalid row: {}", e),
            }),
        }
    }

    (rows, errors)
}

/// Split `Farinha:0.5;Ovo:2` into name and quantity pairs
pub fn parse_recipe(recipe: &str) -> Result<Vec<(String, Decimal)>, String> {
    recipe
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (name, quantity) = part
                .rsplit_once(':')
                .ok_or_else(|| format!("Recipe entry '{}' must be name:quantity", part))?;
            let quantity: Decimal = quantity
                .trim()
                .parse()
                .map_err(|_| format!("Invalid quantity in recipe entry '{}'", part))?;
            Ok((name.trim().to_string(), quantity))
        })
        .collect()
}

impl IngredientImportRow {
    fn into_input(self) -> AppResult<CreateIngredientInput> {
        let unit: Unit = self.unit.parse()?;
        let input = CreateIngredientInput {
            name: self.name,
            unit,
            cost_per_unit: self.cost_per_unit,
            initial_stock: self.stock,
            min_stock: self.min_stock,
        };
        IngredientService::validate_create(&input)?;
        Ok(input)
    }
}

impl ProductImportRow {
    /// `ingredients` maps lowercase ingredient names to ids
    fn into_input(self, ingredients: &HashMap<String, Uuid>) -> AppResult<ProductInput> {
        let mut recipe = Vec::new();
        if let Some(raw) = self.recipe.as_deref() {
            let entries = parse_recipe(raw).map_err(AppError::Import)?;
            for (name, quantity) in entries {
                let ingredient_id = ingredients
                    .get(&name.to_lowercase())
                    .copied()
                    .ok_or_else(|| AppError::Import(format!("Unknown ingredient '{}'", name)))?;
                recipe.push(RecipeItem::new(ingredient_id, quantity));
            }
        }

        ProductService::validate_input(ProductInput {
            name: self.name,
            selling_price: self.selling_price,
            category: self.category.filter(|c| !c.is_empty()),
            recipe,
        })
    }
}

/// Validate parsed rows with `convert`, collecting inputs and row errors
fn validate_rows<R, I>(
    rows: Vec<(usize, R)>,
    mut convert: impl FnMut(R) -> AppResult<I>,
) -> (Vec<(usize, I)>, Vec<RowError>) {
    let mut inputs = Vec::new();
    let mut errors = Vec::new();
    for (row, record) in rows {
        match convert(record) {
            Ok(input) => inputs.push((row, input)),
            Err(e) => errors.push(RowError {
                row,
                message: e.to_string(),
            }),
        }
    }
    (inputs, errors)
}

impl ImportService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Import a CSV file of the given source
    pub async fn import(
        &self,
        business_id: Uuid,
        source: ImportSource,
        data: &str,
    ) -> AppResult<ImportResult> {
        if data.trim().is_empty() {
            return Err(AppError::validation(
                "file",
                "The file is empty",
                "O arquivo está vazio",
            ));
        }

        let result = match source {
            ImportSource::Ingredients => self.import_ingredients(business_id, data).await?,
            ImportSource::Products => self.import_products(business_id, data).await?,
        };

        tracing::info!(
            %business_id,
            ?source,
            total = result.total_rows,
            created = result.created,
            errors = result.errors.len(),
            "CSV import finished"
        );

        Ok(result)
    }

    async fn import_ingredients(&self, business_id: Uuid, data: &str) -> AppResult<ImportResult> {
        let (rows, mut errors) = read_rows::<IngredientImportRow>(data);
        let total_rows = rows.len() + errors.len();
        let (inputs, invalid) = validate_rows(rows, IngredientImportRow::into_input);
        errors.extend(invalid);

        let mut result = ImportResult {
            source: Some(ImportSource::Ingredients),
            total_rows,
            ..Default::default()
        };
        if !errors.is_empty() {
            errors.sort_by_key(|e| e.row);
            result.errors = errors;
            return Ok(result);
        }

        let service = IngredientService::new(self.db.clone());
        for (row, input) in inputs {
            match service.create(business_id, input).await {
                Ok(_) => result.created += 1,
                Err(e) => result.errors.push(RowError {
                    row,
                    message: e.to_string(),
                }),
            }
        }
        Ok(result)
    }

    async fn import_products(&self, business_id: Uuid, data: &str) -> AppResult<ImportResult> {
        let ingredients: HashMap<String, Uuid> = IngredientService::new(self.db.clone())
            .list(business_id)
            .await?
            .into_iter()
            .map(|i| (i.name.to_lowercase(), i.id))
            .collect();

        let (rows, mut errors) = read_rows::<ProductImportRow>(data);
        let total_rows = rows.len() + errors.len();
        let (inputs, invalid) = validate_rows(rows, |r| r.into_input(&ingredients));
        errors.extend(invalid);

        let mut result = ImportResult {
            source: Some(ImportSource::Products),
            total_rows,
            ..Default::default()
        };
        if !errors.is_empty() {
            errors.sort_by_key(|e| e.row);
            result.errors = errors;
            return Ok(result);
        }

        let service = ProductService::new(self.db.clone());
        for (row, input) in inputs {
            match service.create(business_id, input).await {
                Ok(_) => result.created += 1,
                Err(e) => result.errors.push(RowError {
                    row,
                    message: e.to_string(),
                }),
            }
        }
        Ok(result)
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
    fn test_read_ingredient_rows_reports_bad_rows() {
        let data = "name,unit,cost_per_unit,stock,min_stock\n\
                    Farinha,kg,5.20,10,\n\
                    Ovo,un,abc,,\n\
                    Leite,l,4.5,,2\n";

        let (rows, errors) = read_rows::<IngredientImportRow>(data);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, 2);
        assert_eq!(rows[0].1.cost_per_unit, dec("5.20"));
        assert_eq!(rows[0].1.min_stock, None);
        assert_eq!(rows[1].0, 4);
        assert_eq!(rows[1].1.min_stock, Some(dec("2")));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 3);
    }

    #[test]
    fn test_ingredient_row_validation() {
        let valid = IngredientImportRow {
            name: "Farinha".to_string(),
            unit: "kg".to_string(),
            cost_per_unit: dec("5"),
            stock: None,
            min_stock: None,
        };
        assert!(valid.into_input().is_ok());

        let bad_unit = IngredientImportRow {
            name: "Farinha".to_string(),
            unit: "cup".to_string(),
            cost_per_unit: dec("5"),
            stock: None,
            min_stock: None,
        };
        assert!(bad_unit.into_input().is_err());
    }

    #[test]
    fn test_parse_recipe() {
        let entries = parse_recipe("Farinha:0.03; Ovo:1 ;").unwrap();
        assert_eq!(
            entries,
            vec![
                ("Farinha".to_string(), dec("0.03")),
                ("Ovo".to_string(), dec("1")),
            ]
        );

        assert!(parse_recipe("Farinha").is_err());
        assert!(parse_recipe("Farinha:muito").is_err());
        assert!(parse_recipe("").unwrap().is_empty());
    }

    #[test]
    fn test_product_row_resolves_ingredients_by_name() {
        let flour = Uuid::new_v4();
        let ingredients = HashMap::from([("farinha".to_string(), flour)]);

        let row = ProductImportRow {
            name: "Brownie".to_string(),
            selling_price: dec("8"),
            category: Some(String::new()),
            recipe: Some("FARINHA:0.03;Farinha:0.02".to_string()),
        };
        let input = row.into_input(&ingredients).unwrap();
        assert_eq!(input.category, None);
        assert_eq!(input.recipe, vec![RecipeItem::new(flour, dec("0.05"))]);

        let unknown = ProductImportRow {
            name: "Bolo".to_string(),
            selling_price: dec("30"),
            category: None,
            recipe: Some("Açúcar:0.2".to_string()),
        };
        assert!(unknown.into_input(&ingredients).is_err());
    }
}
