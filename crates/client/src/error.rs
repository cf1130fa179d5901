//! Client error types

use swiftbot_billing::{ApiFailure, BillingError, FailureCode};
use swiftbot_shared::{SharedError, UserId, UserRole};

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Error reported by the API (non-2xx status or `success: false`)
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        code: Option<FailureCode>,
    },

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Supabase is not configured (SUPABASE_URL / SUPABASE_ANON_KEY)")]
    SupabaseNotConfigured,

    #[error(transparent)]
    Validation(#[from] SharedError),

    /// Add-member saga: assignment failed, the new member was deleted again
    #[error("Could not assign connections to new member {user_id}; the member was removed: {source}")]
    MemberRolledBack {
        user_id: UserId,
        source: Box<ClientError>,
    },

    /// Edit-member saga: connection update failed, the old role was put back
    #[error("Could not update connections for member {user_id}; role restored to {restored_role}: {source}")]
    RoleRestored {
        user_id: UserId,
        restored_role: UserRole,
        source: Box<ClientError>,
    },

    /// A saga step failed and so did its compensation; the account needs manual cleanup
    #[error("{operation} failed for member {user_id} ({source}) and rollback also failed ({compensation})")]
    CompensationFailed {
        operation: &'static str,
        user_id: UserId,
        source: Box<ClientError>,
        compensation: Box<ClientError>,
    },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<ClientError> for BillingError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api {
                status,
                message,
                code,
            } => BillingError::Api(ApiFailure {
                message,
                code,
                status: Some(status),
            }),
            ClientError::Http(e) => BillingError::Transport(e.to_string()),
            ClientError::NotFound(what) => BillingError::SubscriptionNotFound(what),
            ClientError::Config(e) => BillingError::Config(e.to_string()),
            ClientError::SupabaseNotConfigured => {
                BillingError::Config("Supabase is not configured".to_string())
            }
            other => BillingError::Internal(other.to_string()),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
