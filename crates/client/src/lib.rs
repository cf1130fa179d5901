// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! SwiftBot Account API Client
//!
//! Typed client for the SwiftBot account, team, subscription and checkout
//! endpoints, plus the Supabase REST read of the subscription row. Implements
//! the billing backend traits so the plan-change and card-update workflows run
//! against the real API.

pub mod account;
pub mod checkout;
pub mod config;
pub mod error;
pub mod facebook;
pub mod http;
pub mod subscription;
pub mod supabase;
pub mod team;

pub use account::{AccountClient, ResetPasswordCheck};
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, ClientResult};
pub use facebook::DataDeletionStatus;
pub use http::ApiClient;
pub use supabase::SupabaseClient;
pub use team::{NewMember, TeamService};
