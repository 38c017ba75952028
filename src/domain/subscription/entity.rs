//! Subscription entity - a time-boxed grant of a digital product.
//!
//! Subscriptions only come into existence as part of approving an order; each
//! one traces back to a single order line.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{
    OrderId, ProductId, SubscriptionId, Timestamp, UserId, ValidationError,
};
use crate::domain::order::DurationMonths;

/// Opaque account-access payload (credentials or instructions) delivered to
/// the customer. `Debug` never prints the contents.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessDetails(String);

impl fmt::Debug for AccessDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessDetails(<redacted>)")
    }
}

impl AccessDetails {
    pub fn new(details: impl Into<String>) -> Self {
        Self(details.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A provisioned grant of one product to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub order_id: OrderId,
    pub start_date: Timestamp,
    pub end_date: Timestamp,

    /// Stored flag. Only flips on explicit deactivation; expiry is derived.
    pub is_active: bool,

    pub access_details: AccessDetails,
    pub created_at: Timestamp,
}

impl Subscription {
    /// Builds an active subscription starting at `start`.
    ///
    /// The end date uses calendar month arithmetic, see
    /// [`Timestamp::add_months`] for the short-month rule.
    pub fn provision(
        user_id: UserId,
        product_id: ProductId,
        order_id: OrderId,
        duration: DurationMonths,
        access_details: AccessDetails,
        start: Timestamp,
    ) -> Result<Self, ValidationError> {
        let end_date = start.add_months(duration.get())?;
        Ok(Self {
            id: SubscriptionId::new(),
            user_id,
            product_id,
            order_id,
            start_date: start,
            end_date,
            is_active: true,
            access_details,
            created_at: start,
        })
    }

    /// Active for display: the stored flag is set and the end date is ahead.
    pub fn is_currently_active(&self, now: &Timestamp) -> bool {
        self.is_active && self.end_date.is_after(now)
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Whole days left, zero once expired or deactivated.
    pub fn days_remaining(&self, now: &Timestamp) -> u32 {
        if !self.is_active {
            return 0;
        }
        self.end_date.days_until(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(y, m, d, 10, 30, 0).unwrap())
    }

    fn subscription(months: u32, start: Timestamp) -> Subscription {
        Subscription::provision(
            UserId::new("user-1").unwrap(),
            ProductId::new(),
            OrderId::new(),
            DurationMonths::new(months).unwrap(),
            AccessDetails::new("login: demo"),
            start,
        )
        .unwrap()
    }

    #[test]
    fn debug_output_hides_access_details() {
        let sub = subscription(1, at(2025, 3, 1));

        let debug = format!("{:?}", sub);

        assert!(debug.contains("AccessDetails(<redacted>)"));
        assert!(!debug.contains("login: demo"));
        assert_eq!(sub.access_details.as_str(), "login: demo");
    }

    #[test]
    fn provision_computes_calendar_end_date() {
        let sub = subscription(1, at(2024, 1, 31));
        assert_eq!(sub.end_date, at(2024, 2, 29));
        assert!(sub.is_active);
        assert_eq!(sub.created_at, sub.start_date);
    }

    #[test]
    fn end_of_month_start_clamps_in_non_leap_year() {
        let sub = subscription(1, at(2025, 1, 31));
        assert_eq!(sub.end_date, at(2025, 2, 28));
    }

    #[test]
    fn twelve_months_lands_on_same_day_next_year() {
        let sub = subscription(12, at(2025, 6, 15));
        assert_eq!(sub.end_date, at(2026, 6, 15));
    }

    #[test]
    fn currently_active_requires_flag_and_future_end() {
        let start = at(2025, 3, 1);
        let mut sub = subscription(1, start);

        assert!(sub.is_currently_active(&at(2025, 3, 15)));
        assert!(!sub.is_currently_active(&at(2025, 4, 2)));

        sub.deactivate();
        assert!(!sub.is_currently_active(&at(2025, 3, 15)));
    }

    #[test]
    fn days_remaining_counts_down_to_zero() {
        let sub = subscription(1, at(2025, 3, 1));
        assert_eq!(sub.days_remaining(&at(2025, 3, 21)), 11);
        assert_eq!(sub.days_remaining(&at(2025, 5, 1)), 0);
    }

    #[test]
    fn deactivated_subscription_has_no_days_remaining() {
        let mut sub = subscription(3, at(2025, 3, 1));
        sub.deactivate();
        assert_eq!(sub.days_remaining(&at(2025, 3, 2)), 0);
    }
}
