//! Validation utilities for Cozinha ao Lucro
//!
//! Checks applied before entities are created, both from the API and from
//! spreadsheet imports.

use rust_decimal::Decimal;

// ============================================================================
// Catalog Validations
// ============================================================================

/// Validate a product or ingredient name
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name is required");
    }
    if trimmed.chars().count() > 120 {
        return Err("Name must be at most 120 characters");
    }
    Ok(())
}

/// Validate a product selling price (must be positive)
pub fn validate_selling_price(price: Decimal) -> Result<(), &'static str> {
    if price <= Decimal::ZERO {
        return Err("Selling price must be greater than zero");
    }
    Ok(())
}

/// Validate an ingredient cost (zero allowed for donated or free items)
pub fn validate_cost_per_unit(cost: Decimal) -> Result<(), &'static str> {
    if cost < Decimal::ZERO {
        return Err("Cost per unit cannot be negative");
    }
    Ok(())
}

/// Validate a recipe, order or movement quantity
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be greater than zero");
    }
    Ok(())
}

/// Validate an optional minimum stock level
pub fn validate_min_stock(min_stock: Option<Decimal>) -> Result<(), &'static str> {
    match min_stock {
        Some(min) if min < Decimal::ZERO => Err("Minimum stock cannot be negative"),
        _ => Ok(()),
    }
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate a Brazilian phone number.
/// Accepts: 11987654321, (11) 98765-4321, +55 11 98765-4321
pub fn validate_br_phone(phone: &str) -> Result<(), &'static str> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let national = digits.strip_prefix("55").filter(|d| d.len() >= 10).unwrap_or(&digits);

    match national.len() {
        // Mobile: area code + 9 + eight digits
        11 if national.as_bytes()[2] == b'9' => Ok(()),
        // Landline: area code + eight digits
        10 => Ok(()),
        _ => Err("Invalid Brazilian phone number"),
    }
}
