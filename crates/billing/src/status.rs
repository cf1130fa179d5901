//! Subscription status projection
//!
//! Derives the status shown to the user, and the number of days left in the
//! trial or billing period, from the stored subscription row. Pure function of
//! the row and the current time.

use chrono::{DateTime, Utc};
use serde::Serialize;
use swiftbot_shared::{Subscription, SubscriptionStatus};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Display status of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProjectedStatus {
    pub status: SubscriptionStatus,
    /// Whole days left, rounded up; never negative
    pub remaining_days: i64,
}

/// Project a subscription at `now`
pub fn project(subscription: &Subscription, now: DateTime<Utc>) -> ProjectedStatus {
    let trial_over = subscription
        .trial_end_date
        .map(|end| now > end)
        .unwrap_or(false);

    let status = match subscription.status {
        SubscriptionStatus::Trial if trial_over => SubscriptionStatus::Expired,
        stored => stored,
    };

    let remaining_days = match status {
        _ if status.is_ended() => 0,
        SubscriptionStatus::Trial => days_until(subscription.trial_end_date, now),
        SubscriptionStatus::Active => days_until(subscription.next_billing_date, now),
        // Past due, incomplete and unknown rows have nothing to count down to
        _ => 0,
    };

    ProjectedStatus {
        status,
        remaining_days,
    }
}

/// Project a subscription at the current time
pub fn project_now(subscription: &Subscription) -> ProjectedStatus {
    project(subscription, Utc::now())
}

/// ceil((target - now) / 1 day), floored at 0; a missing date counts as 0
fn days_until(target: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    let Some(target) = target else {
        return 0;
    };

    let millis = (target - now).num_milliseconds();
    if millis <= 0 {
        return 0;
    }

    (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}
