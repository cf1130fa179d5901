//! SwiftBot price table
//!
//! Prices are in BRL cents, indexed by billing period and number of WhatsApp
//! connections (1..=7). Within a period, price strictly increases with the
//! number of connections.

use serde::Serialize;
use swiftbot_shared::{BillingPeriod, PlanSelection, MAX_CONNECTIONS, MIN_CONNECTIONS};

use crate::error::{BillingError, BillingResult};

const MONTHLY_PRICES_CENTS: [i64; MAX_CONNECTIONS as usize] = [
    28_875,  // 1 connection:  R$ 288,75
    53_375,  // 2 connections: R$ 533,75
    77_875,  // 3 connections: R$ 778,75
    102_375, // 4 connections: R$ 1.023,75
    126_875, // 5 connections: R$ 1.268,75
    151_375, // 6 connections: R$ 1.513,75
    175_875, // 7 connections: R$ 1.758,75
];

const ANNUAL_PRICES_CENTS: [i64; MAX_CONNECTIONS as usize] = [
    414_990,   // 1 connection:  R$ 4.149,90
    555_930,   // 2 connections: R$ 5.559,30
    696_870,   // 3 connections: R$ 6.968,70
    837_810,   // 4 connections: R$ 8.378,10
    978_750,   // 5 connections: R$ 9.787,50
    1_119_690, // 6 connections: R$ 11.196,90
    1_260_630, // 7 connections: R$ 12.606,30
];

/// Static mapping (billing period, connections) -> price
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceTable {
    monthly: [i64; MAX_CONNECTIONS as usize],
    annual: [i64; MAX_CONNECTIONS as usize],
}

static STANDARD: PriceTable = PriceTable {
    monthly: MONTHLY_PRICES_CENTS,
    annual: ANNUAL_PRICES_CENTS,
};

/// One row of the price table, for plan listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanPrice {
    pub plan: PlanSelection,
    pub price_cents: i64,
}

impl PriceTable {
    /// The prices currently offered to customers
    pub fn standard() -> &'static PriceTable {
        &STANDARD
    }

    fn row(&self, period: BillingPeriod) -> &[i64; MAX_CONNECTIONS as usize] {
        match period {
            BillingPeriod::Monthly => &self.monthly,
            BillingPeriod::Annual => &self.annual,
        }
    }

    /// Price of a plan in cents
    pub fn price_cents(&self, plan: &PlanSelection) -> BillingResult<i64> {
        let index = usize::from(plan.connections)
            .checked_sub(usize::from(MIN_CONNECTIONS))
            .ok_or_else(|| BillingError::InvalidPlan(plan.to_string()))?;

        self.row(plan.billing_period)
            .get(index)
            .copied()
            .ok_or_else(|| BillingError::InvalidPlan(plan.to_string()))
    }

    /// Every plan for a billing period, cheapest first
    pub fn plans(&self, period: BillingPeriod) -> Vec<PlanPrice> {
        self.row(period)
            .iter()
            .zip(MIN_CONNECTIONS..=MAX_CONNECTIONS)
            .map(|(&price_cents, connections)| PlanPrice {
                plan: PlanSelection {
                    connections,
                    billing_period: period,
                },
                price_cents,
            })
            .collect()
    }
}

/// Price of a plan in the standard table
pub fn price_cents(plan: &PlanSelection) -> BillingResult<i64> {
    PriceTable::standard().price_cents(plan)
}
