//! Facebook data-deletion status lookup
//!
//! Meta sends users a confirmation code when they ask for their data to be
//! deleted; the status page looks the request up by that code.

use serde::{Deserialize, Serialize};

use crate::account::AccountClient;
use crate::error::{ClientError, ClientResult};

pub(crate) const DATA_DELETION_STATUS: &str = "/api/facebook/data-deletion-status";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDeletionStatus {
    #[serde(alias = "confirmation_code")]
    pub code: String,
    /// e.g. `pending`, `completed`
    pub status: String,
    #[serde(default)]
    pub requested_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

impl DataDeletionStatus {
    pub fn is_completed(&self) -> bool {
        self.status.eq_ignore_ascii_case("completed")
    }
}

impl AccountClient {
    pub async fn data_deletion_status(&self, code: &str) -> ClientResult<DataDeletionStatus> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ClientError::NotFound("empty confirmation code".to_string()));
        }
        self.api()
            .get_query(DATA_DELETION_STATUS, &[("code", code)])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_lookup_by_code() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", DATA_DELETION_STATUS)
            .match_query(Matcher::UrlEncoded("code".into(), "ABC123".into()))
            .with_status(200)
            .with_body(
                json!({
                    "confirmation_code": "ABC123",
                    "status": "completed",
                    "requested_at": "2026-10-01T12:00:00Z",
                    "completed_at": "2026-10-02T12:00:00Z"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = AccountClient::with_base_url(server.url(), "tok");
        let status = client.data_deletion_status(" ABC123 ").await.unwrap();
        assert_eq!(status.code, "ABC123");
        assert!(status.is_completed());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unknown_code_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", DATA_DELETION_STATUS)
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(json!({ "error": "Request not found" }).to_string())
            .create_async()
            .await;

        let client = AccountClient::with_base_url(server.url(), "tok");
        let err = client.data_deletion_status("nope").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_empty_code_is_rejected_locally() {
        let client = AccountClient::with_base_url("http://localhost:1", "tok");
        assert!(matches!(
            client.data_deletion_status("  ").await,
            Err(ClientError::NotFound(_))
        ));
    }
}
