//! Account-level endpoints
//!
//! `AccountClient` is the entry point of this crate: it owns the API client
//! and the optional Supabase reader, and hands out the team service. The
//! billing backend traits are implemented for it in `subscription` and
//! `checkout`.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use swiftbot_shared::{Connection, UserRole};
use tracing::info;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::{Ack, ApiClient};
use crate::supabase::SupabaseClient;
use crate::team::TeamService;

pub(crate) const MEMBER_PERMISSIONS: &str = "/api/account/member-permissions";
pub(crate) const ACCOUNT_CONNECTIONS: &str = "/api/account/connections";
pub(crate) const CHECK_RESET_PASSWORD: &str = "/api/account/check-reset-password";

/// Permission payload; older deployments nest the role under `permissions`
#[derive(Debug, Default, Deserialize)]
struct MemberPermissions {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    permissions: Option<NestedPermissions>,
}

#[derive(Debug, Default, Deserialize)]
struct NestedPermissions {
    #[serde(default)]
    role: Option<String>,
}

impl MemberPermissions {
    fn role(&self) -> Option<UserRole> {
        self.role
            .as_deref()
            .or_else(|| self.permissions.as_ref().and_then(|p| p.role.as_deref()))
            .map(UserRole::from_str_lossy)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConnectionsBody {
    Wrapped { connections: Vec<Connection> },
    Bare(Vec<Connection>),
}

/// Whether the user must set a new password before continuing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetPasswordCheck {
    #[serde(default, alias = "requiresReset", alias = "needs_reset")]
    pub requires_reset: bool,
}

#[derive(Clone)]
pub struct AccountClient {
    api: ApiClient,
    supabase: Option<SupabaseClient>,
}

impl AccountClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let api = ApiClient::new(config)?;
        let supabase = SupabaseClient::from_config(api.http().clone(), config);
        Ok(Self { api, supabase })
    }

    pub fn from_parts(api: ApiClient, supabase: Option<SupabaseClient>) -> Self {
        Self { api, supabase }
    }

    /// Build a client that talks to one base URL, with no Supabase reader
    pub fn with_base_url(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self::from_parts(
            ApiClient::with_http(Client::new(), base_url.into(), access_token.into()),
            None,
        )
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn supabase(&self) -> ClientResult<&SupabaseClient> {
        self.supabase
            .as_ref()
            .ok_or(ClientError::SupabaseNotConfigured)
    }

    pub fn team(&self) -> TeamService {
        TeamService::new(self.api.clone())
    }

    /// Role of the signed-in user in the current account.
    ///
    /// A payload without any role is treated as a plain member.
    pub async fn member_role(&self) -> ClientResult<UserRole> {
        let body: MemberPermissions = self.api.get(MEMBER_PERMISSIONS).await?;
        Ok(body.role().unwrap_or_default())
    }

    /// WhatsApp connections owned by the account
    pub async fn connections(&self) -> ClientResult<Vec<Connection>> {
        let body: ConnectionsBody = self.api.get(ACCOUNT_CONNECTIONS).await?;
        Ok(match body {
            ConnectionsBody::Wrapped { connections } => connections,
            ConnectionsBody::Bare(connections) => connections,
        })
    }

    pub async fn reset_password_check(&self) -> ClientResult<ResetPasswordCheck> {
        self.api.get(CHECK_RESET_PASSWORD).await
    }

    /// Clear the reset-password flag once the user has chosen a new password
    pub async fn acknowledge_password_reset(&self) -> ClientResult<()> {
        let _: Ack = self.api.post_empty(CHECK_RESET_PASSWORD).await?;
        info!("Password reset acknowledged");
        Ok(())
    }
}
