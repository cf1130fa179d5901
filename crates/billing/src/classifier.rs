//! Upgrade / downgrade classification of a plan change

use serde::{Deserialize, Serialize};
use swiftbot_shared::PlanSelection;

use crate::error::BillingResult;
use crate::pricing::PriceTable;

/// Direction of a plan change.
///
/// There is no lateral case: a change between two plans with the same price
/// is treated as a downgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeClassification {
    /// Applied immediately, prorated charge expected
    Upgrade,
    /// Deferred to the next billing cycle
    Downgrade,
}

impl ChangeClassification {
    pub fn is_upgrade(&self) -> bool {
        matches!(self, Self::Upgrade)
    }
}

impl std::fmt::Display for ChangeClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upgrade => write!(f, "upgrade"),
            Self::Downgrade => write!(f, "downgrade"),
        }
    }
}

/// A classified plan change with the prices it was decided on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanChange {
    pub current: PlanSelection,
    pub proposed: PlanSelection,
    pub classification: ChangeClassification,
    pub current_price_cents: i64,
    pub proposed_price_cents: i64,
}

impl PlanChange {
    /// Price difference per billing period (negative for downgrades)
    pub fn price_delta_cents(&self) -> i64 {
        self.proposed_price_cents - self.current_price_cents
    }

    pub fn is_unchanged(&self) -> bool {
        self.current == self.proposed
    }
}

impl PriceTable {
    /// Upgrade iff the proposed plan costs strictly more than the current one
    pub fn classify(
        &self,
        current: &PlanSelection,
        proposed: &PlanSelection,
    ) -> BillingResult<ChangeClassification> {
        Ok(self.evaluate(current, proposed)?.classification)
    }

    pub fn evaluate(
        &self,
        current: &PlanSelection,
        proposed: &PlanSelection,
    ) -> BillingResult<PlanChange> {
        let current_price_cents = self.price_cents(current)?;
        let proposed_price_cents = self.price_cents(proposed)?;

        let classification = if proposed_price_cents > current_price_cents {
            ChangeClassification::Upgrade
        } else {
            ChangeClassification::Downgrade
        };

        Ok(PlanChange {
            current: *current,
            proposed: *proposed,
            classification,
            current_price_cents,
            proposed_price_cents,
        })
    }
}

/// Classify against the standard price table
pub fn classify(
    current: &PlanSelection,
    proposed: &PlanSelection,
) -> BillingResult<ChangeClassification> {
    PriceTable::standard().classify(current, proposed)
}

/// Classify against the standard price table, keeping both prices
pub fn evaluate(current: &PlanSelection, proposed: &PlanSelection) -> BillingResult<PlanChange> {
    PriceTable::standard().evaluate(current, proposed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use swiftbot_shared::BillingPeriod;

    #[test]
    fn test_more_connections_same_period_is_upgrade() {
        let current = PlanSelection::monthly(2).unwrap();
        let proposed = PlanSelection::monthly(4).unwrap();
        assert_eq!(
            classify(&current, &proposed).unwrap(),
            ChangeClassification::Upgrade
        );
    }

    #[test]
    fn test_fewer_connections_annual_is_downgrade() {
        let current = PlanSelection::annual(5).unwrap();
        let proposed = PlanSelection::annual(3).unwrap();
        let change = evaluate(&current, &proposed).unwrap();
        assert_eq!(change.classification, ChangeClassification::Downgrade);
        assert_eq!(change.current_price_cents, 978_750);
        assert_eq!(change.proposed_price_cents, 696_870);
        assert_eq!(change.price_delta_cents(), -281_880);
    }

    #[test]
    fn test_same_plan_classifies_as_downgrade() {
        let plan = PlanSelection::monthly(3).unwrap();
        let change = evaluate(&plan, &plan).unwrap();
        assert_eq!(change.classification, ChangeClassification::Downgrade);
        assert!(change.is_unchanged());
    }

    #[test]
    fn test_cross_period_compares_raw_prices() {
        // Annual 1 (R$ 4.149,90) costs more than monthly 7 (R$ 1.758,75)
        let current = PlanSelection::monthly(7).unwrap();
        let proposed = PlanSelection::annual(1).unwrap();
        assert_eq!(
            classify(&current, &proposed).unwrap(),
            ChangeClassification::Upgrade
        );
        assert_eq!(
            classify(&proposed, &current).unwrap(),
            ChangeClassification::Downgrade
        );
    }

    #[test]
    fn test_classification_matches_price_comparison_for_all_pairs() {
        let table = PriceTable::standard();
        let all: Vec<_> = BillingPeriod::ALL
            .iter()
            .flat_map(|&period| table.plans(period))
            .collect();

        for a in &all {
            for b in &all {
                let expected = if b.price_cents > a.price_cents {
                    ChangeClassification::Upgrade
                } else {
                    ChangeClassification::Downgrade
                };
                assert_eq!(table.classify(&a.plan, &b.plan).unwrap(), expected);
            }
        }
    }
}
