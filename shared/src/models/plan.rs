//! Subscription plans and the limits they impose

use serde::{Deserialize, Serialize};

/// Subscription tier of a business account
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Free,
    Essential,
    Pro,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Essential => "essential",
            PlanTier::Pro => "pro",
        }
    }

    pub fn limits(&self) -> PlanLimits {
        match self {
            PlanTier::Free => PlanLimits {
                max_products: Some(5),
                max_ingredients: Some(20),
                max_orders_per_month: Some(30),
            },
            PlanTier::Essential => PlanLimits {
                max_products: Some(50),
                max_ingredients: Some(200),
                max_orders_per_month: Some(500),
            },
            PlanTier::Pro => PlanLimits {
                max_products: None,
                max_ingredients: None,
                max_orders_per_month: None,
            },
        }
    }
}

impl std::str::FromStr for PlanTier {
    type Err = crate::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(PlanTier::Free),
            "essential" => Ok(PlanTier::Essential),
            "pro" => Ok(PlanTier::Pro),
            other => Err(crate::DomainError::UnknownPlan(other.to_string())),
        }
    }
}

/// Resources gated by the subscription plan
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanResource {
    Products,
    Ingredients,
    MonthlyOrders,
}

impl std::fmt::Display for PlanResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanResource::Products => write!(f, "products"),
            PlanResource::Ingredients => write!(f, "ingredients"),
            PlanResource::MonthlyOrders => write!(f, "orders this month"),
        }
    }
}

/// Per-plan caps; `None` means unlimited
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanLimits {
    pub max_products: Option<u32>,
    pub max_ingredients: Option<u32>,
    pub max_orders_per_month: Option<u32>,
}

impl PlanLimits {
    pub fn limit_for(&self, resource: PlanResource) -> Option<u32> {
        match resource {
            PlanResource::Products => self.max_products,
            PlanResource::Ingredients => self.max_ingredients,
            PlanResource::MonthlyOrders => self.max_orders_per_month,
        }
    }

    /// Check whether one more `resource` may be created given `current_count`
    pub fn check(&self, resource: PlanResource, current_count: u64) -> Result<(), crate::DomainError> {
        match self.limit_for(resource) {
            Some(limit) if current_count >= u64::from(limit) => {
                Err(crate::DomainError::PlanLimitReached { resource, limit })
            }
            _ => Ok(()),
        }
    }
}

/// Current consumption of plan-gated resources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanUsage {
    pub tier: PlanTier,
    pub limits: PlanLimits,
    pub products: u64,
    pub ingredients: u64,
    pub orders_this_month: u64,
}
