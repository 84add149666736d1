//! Order workflow and plan gating tests
//!
//! Tests for the order kanban including:
//! - pending → preparing → ready → delivered
//! - cancelled from any open status; terminal statuses are final
//! - Plan limits for products, ingredients and monthly orders

use proptest::prelude::*;
use shared::{validate_transition, DomainError, OrderStatus, PlanResource, PlanTier};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut status = OrderStatus::Pending;
        let mut path = vec![status];
        while let Some(next) = status.next() {
            validate_transition(status, next).unwrap();
            status = next;
            path.push(status);
        }

        assert_eq!(
            path,
            vec![
                OrderStatus::Pending,
                OrderStatus::Preparing,
                OrderStatus::Ready,
                OrderStatus::Delivered,
            ]
        );
    }

    #[test]
    fn test_cancel_from_open_statuses() {
        for status in OrderStatus::OPEN {
            assert!(status.can_transition_to(OrderStatus::Cancelled));
        }
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_invalid_transition_error() {
        let err = validate_transition(OrderStatus::Pending, OrderStatus::Delivered).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Delivered,
            }
        );
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_free_plan_limits() {
        let limits = PlanTier::Free.limits();
        assert!(limits.check(PlanResource::Products, 4).is_ok());
        assert!(limits.check(PlanResource::Products, 5).is_err());
        assert!(limits.check(PlanResource::Ingredients, 19).is_ok());
        assert!(limits.check(PlanResource::MonthlyOrders, 30).is_err());
    }

    #[test]
    fn test_pro_plan_is_unlimited() {
        let limits = PlanTier::Pro.limits();
        assert!(limits.check(PlanResource::MonthlyOrders, 1_000_000).is_ok());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn status_strategy() -> impl Strategy<Value = OrderStatus> {
        prop_oneof![
            Just(OrderStatus::Pending),
            Just(OrderStatus::Preparing),
            Just(OrderStatus::Ready),
            Just(OrderStatus::Delivered),
            Just(OrderStatus::Cancelled),
        ]
    }

    fn tier_strategy() -> impl Strategy<Value = PlanTier> {
        prop_oneof![Just(PlanTier::Free), Just(PlanTier::Essential), Just(PlanTier::Pro)]
    }

    fn resource_strategy() -> impl Strategy<Value = PlanResource> {
        prop_oneof![
            Just(PlanResource::Products),
            Just(PlanResource::Ingredients),
            Just(PlanResource::MonthlyOrders),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Terminal statuses accept no transition; no status moves to itself
        #[test]
        fn prop_terminal_and_self_transitions_rejected(
            from in status_strategy(),
            to in status_strategy()
        ) {
            if from.is_terminal() || from == to {
                prop_assert!(validate_transition(from, to).is_err());
            }
        }

        /// Every open status can reach a terminal one
        #[test]
        fn prop_open_statuses_can_finish(from in status_strategy()) {
            if !from.is_terminal() {
                prop_assert!(from.can_transition_to(OrderStatus::Cancelled));
            }
        }

        /// Creating is allowed exactly while the count is under the limit
        #[test]
        fn prop_plan_check_matches_limit(
            tier in tier_strategy(),
            resource in resource_strategy(),
            count in 0u64..1000
        ) {
            let limits = tier.limits();
            let allowed = limits.check(resource, count).is_ok();
            match limits.limit_for(resource) {
                Some(limit) => prop_assert_eq!(allowed, count < u64::from(limit)),
                None => prop_assert!(allowed),
            }
        }
    }
}
