//! Supabase REST reads
//!
//! The subscription row is read straight from the `user_subscriptions` table
//! with the anon key plus the user's access token, row-level security scoping
//! the result to the caller.

use reqwest::{Client, Method};
use swiftbot_shared::{Subscription, UserId};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::decode;

const SUBSCRIPTIONS_TABLE: &str = "user_subscriptions";

#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    url: String,
    anon_key: String,
    access_token: String,
}

impl SupabaseClient {
    pub fn new(http: Client, url: String, anon_key: String, access_token: String) -> Self {
        Self {
            http,
            url: url.trim_end_matches('/').to_string(),
            anon_key,
            access_token,
        }
    }

    /// Build from config; `None` when Supabase is not configured
    pub fn from_config(http: Client, config: &ClientConfig) -> Option<Self> {
        match (&config.supabase_url, &config.supabase_anon_key) {
            (Some(url), Some(key)) => Some(Self::new(
                http,
                url.clone(),
                key.clone(),
                config.access_token.clone(),
            )),
            _ => None,
        }
    }

    /// Read the subscription row for a user
    pub async fn fetch_subscription(&self, user_id: UserId) -> ClientResult<Subscription> {
        let path = format!("/rest/v1/{}", SUBSCRIPTIONS_TABLE);
        debug!(user_id = %user_id, "Reading subscription row");

        let response = self
            .http
            .get(format!("{}{}", self.url, path))
            .query(&[("user_id", format!("eq.{}", user_id)), ("select", "*".to_string())])
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let rows: Vec<Subscription> = decode(&Method::GET, &path, response).await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| ClientError::NotFound(format!("subscription for user {}", user_id)))
    }
}
