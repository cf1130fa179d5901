//! Common types used across SwiftBot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SharedError;

// =============================================================================
// ID Wrappers
// =============================================================================

/// User ID wrapper (Supabase auth user id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| SharedError::Validation(format!("Invalid user id '{}': {}", s, e)))
    }
}

// =============================================================================
// Plans
// =============================================================================

/// Smallest number of WhatsApp connections a plan can include
pub const MIN_CONNECTIONS: u8 = 1;

/// Largest number of WhatsApp connections a plan can include
pub const MAX_CONNECTIONS: u8 = 7;

/// Billing period of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    #[default]
    Monthly,
    Annual,
}

impl BillingPeriod {
    pub const ALL: [BillingPeriod; 2] = [BillingPeriod::Monthly, BillingPeriod::Annual];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Annual => "annual",
        }
    }
}

impl std::fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BillingPeriod {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" | "month" | "mensal" => Ok(Self::Monthly),
            "annual" | "yearly" | "year" | "anual" => Ok(Self::Annual),
            _ => Err(SharedError::InvalidBillingPeriod(s.to_string())),
        }
    }
}

/// A plan the user can select: number of connections plus billing period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanSelection {
    pub connections: u8,
    pub billing_period: BillingPeriod,
}

impl PlanSelection {
    /// Build a selection, rejecting connection counts outside 1..=7
    pub fn new(connections: i64, billing_period: BillingPeriod) -> Result<Self, SharedError> {
        if connections < i64::from(MIN_CONNECTIONS) || connections > i64::from(MAX_CONNECTIONS) {
            return Err(SharedError::ConnectionsOutOfRange {
                min: MIN_CONNECTIONS,
                max: MAX_CONNECTIONS,
                got: connections,
            });
        }

        Ok(Self {
            connections: connections as u8,
            billing_period,
        })
    }

    pub fn monthly(connections: i64) -> Result<Self, SharedError> {
        Self::new(connections, BillingPeriod::Monthly)
    }

    pub fn annual(connections: i64) -> Result<Self, SharedError> {
        Self::new(connections, BillingPeriod::Annual)
    }
}

impl std::fmt::Display for PlanSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} connection(s), {}", self.connections, self.billing_period)
    }
}

// =============================================================================
// Subscriptions
// =============================================================================

/// Stored subscription status (row in `user_subscriptions`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    #[serde(alias = "trialing")]
    Trial,
    Active,
    #[serde(alias = "cancelled")]
    Canceled,
    Expired,
    PastDue,
    Incomplete,
    #[serde(other)]
    Unknown,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trial => "trial",
            Self::Active => "active",
            Self::Canceled => "canceled",
            Self::Expired => "expired",
            Self::PastDue => "past_due",
            Self::Incomplete => "incomplete",
            Self::Unknown => "unknown",
        }
    }

    /// Canceled and expired subscriptions have no remaining paid or trial time
    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Canceled | Self::Expired)
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trial" | "trialing" => Ok(Self::Trial),
            "active" => Ok(Self::Active),
            "canceled" | "cancelled" => Ok(Self::Canceled),
            "expired" => Ok(Self::Expired),
            "past_due" => Ok(Self::PastDue),
            "incomplete" => Ok(Self::Incomplete),
            _ => Err(SharedError::Validation(format!(
                "Invalid subscription status: {}",
                s
            ))),
        }
    }
}

/// Subscription record owned by one account.
///
/// Only the backend mutates it (billing webhooks and the plan-change endpoint);
/// this side reads it and derives display state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub user_id: UserId,
    #[serde(default)]
    pub status: SubscriptionStatus,
    pub connections_purchased: i64,
    #[serde(default)]
    pub billing_period: BillingPeriod,
    #[serde(default)]
    pub trial_start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub trial_end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_billing_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub canceled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub affiliate_code: Option<String>,
    #[serde(default)]
    pub promotion_code: Option<String>,

    // Deferred downgrade waiting for the next billing cycle
    #[serde(default)]
    pub scheduled_connections: Option<i64>,
    #[serde(default)]
    pub scheduled_billing_period: Option<BillingPeriod>,
    #[serde(default)]
    pub scheduled_change_date: Option<DateTime<Utc>>,
}

impl Subscription {
    /// The plan this subscription is currently billed for
    pub fn current_plan(&self) -> Result<PlanSelection, SharedError> {
        PlanSelection::new(self.connections_purchased, self.billing_period)
    }

    /// The plan a pending downgrade will switch to, if one is scheduled
    pub fn scheduled_plan(&self) -> Option<PlanSelection> {
        let connections = self.scheduled_connections?;
        let period = self.scheduled_billing_period.unwrap_or(self.billing_period);
        PlanSelection::new(connections, period).ok()
    }

    pub fn has_scheduled_change(&self) -> bool {
        self.scheduled_plan().is_some()
    }
}

// =============================================================================
// Team
// =============================================================================

/// Role of a team member within an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Owner,
    Admin,
    #[default]
    Member,
    /// Role string this client does not know about; gets no permissions
    #[serde(other)]
    Unknown,
}

impl UserRole {
    /// Get the permission level for this role (higher = more permissions)
    pub fn level(&self) -> u8 {
        match self {
            Self::Owner => 3,
            Self::Admin => 2,
            Self::Member => 1,
            Self::Unknown => 0,
        }
    }

    /// Owners and admins manage the team and the subscription
    pub fn can_administer(&self) -> bool {
        self.level() >= 2
    }

    /// Roles that may be given to a team member through the team endpoints
    pub fn is_assignable(&self) -> bool {
        matches!(self, Self::Admin | Self::Member)
    }

    /// Parse a role from string (case insensitive)
    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "owner" => Self::Owner,
            "admin" => Self::Admin,
            "member" => Self::Member,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Member of an account's team (row in `account_members`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: UserId,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A WhatsApp number connected to the account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
