//! Client configuration

use std::env;

use swiftbot_billing::Locale;
use swiftbot_shared::UserId;

/// Client configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // SwiftBot API
    pub api_url: String,
    pub http_timeout_secs: u64,

    // Session (issued by Supabase Auth)
    pub access_token: String,
    pub user_id: Option<UserId>,

    // Supabase REST (subscription reads)
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,

    // Presentation
    pub locale: Locale,
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: env::var("SWIFTBOT_API_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            http_timeout_secs: match env::var("SWIFTBOT_HTTP_TIMEOUT_SECS") {
                Ok(raw) => {
                    let parsed = raw.trim().parse::<u64>();
                    match parsed {
                        Ok(secs) if secs > 0 => secs,
                        _ => return Err(ConfigError::Invalid("SWIFTBOT_HTTP_TIMEOUT_SECS", raw)),
                    }
                }
                Err(_) => 30,
            },

            access_token: {
                let token = env::var("SWIFTBOT_ACCESS_TOKEN")
                    .map_err(|_| ConfigError::Missing("SWIFTBOT_ACCESS_TOKEN"))?;
                if token.trim().is_empty() {
                    return Err(ConfigError::Missing("SWIFTBOT_ACCESS_TOKEN"));
                }
                token
            },
            user_id: match env::var("SWIFTBOT_USER_ID") {
                Ok(raw) => Some(
                    raw.parse()
                        .map_err(|_| ConfigError::Invalid("SWIFTBOT_USER_ID", raw))?,
                ),
                Err(_) => None,
            },

            supabase_url: env::var("SUPABASE_URL").ok().filter(|v| !v.is_empty()),
            supabase_anon_key: env::var("SUPABASE_ANON_KEY").ok().filter(|v| !v.is_empty()),

            locale: match env::var("SWIFTBOT_LOCALE") {
                Ok(raw) => raw
                    .parse()
                    .map_err(|_| ConfigError::Invalid("SWIFTBOT_LOCALE", raw))?,
                Err(_) => Locale::default(),
            },
        })
    }

    /// The user id, required by commands that act on one account
    pub fn require_user_id(&self) -> Result<UserId, ConfigError> {
        self.user_id.ok_or(ConfigError::Missing("SWIFTBOT_USER_ID"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "SWIFTBOT_API_URL",
        "SWIFTBOT_HTTP_TIMEOUT_SECS",
        "SWIFTBOT_ACCESS_TOKEN",
        "SWIFTBOT_USER_ID",
        "SUPABASE_URL",
        "SUPABASE_ANON_KEY",
        "SWIFTBOT_LOCALE",
    ];

    fn cleanup_config() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial(env)]
    fn test_defaults() {
        cleanup_config();
        env::set_var("SWIFTBOT_ACCESS_TOKEN", "token-123");

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.api_url, "http://localhost:3000");
        assert_eq!(config.http_timeout_secs, 30);
        assert_eq!(config.locale, Locale::PtBr);
        assert!(config.user_id.is_none());
        assert!(config.supabase_url.is_none());

        cleanup_config();
    }

    #[test]
    #[serial(env)]
    fn test_missing_token_is_an_error() {
        cleanup_config();

        let result = ClientConfig::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::Missing("SWIFTBOT_ACCESS_TOKEN"))
        ));
    }

    #[test]
    #[serial(env)]
    fn test_reads_all_values() {
        cleanup_config();
        env::set_var("SWIFTBOT_API_URL", "https://app.swiftbot.com.br");
        env::set_var("SWIFTBOT_HTTP_TIMEOUT_SECS", "5");
        env::set_var("SWIFTBOT_ACCESS_TOKEN", "token-123");
        env::set_var("SWIFTBOT_USER_ID", "6f1c1c2e-1b9a-4c55-9a7e-0f3d2c1b0a99");
        env::set_var("SUPABASE_URL", "https://abc.supabase.co");
        env::set_var("SUPABASE_ANON_KEY", "anon");
        env::set_var("SWIFTBOT_LOCALE", "en");

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.api_url, "https://app.swiftbot.com.br");
        assert_eq!(config.http_timeout_secs, 5);
        assert_eq!(
            config.require_user_id().unwrap().to_string(),
            "6f1c1c2e-1b9a-4c55-9a7e-0f3d2c1b0a99"
        );
        assert_eq!(config.supabase_url.as_deref(), Some("https://abc.supabase.co"));
        assert_eq!(config.locale, Locale::En);

        cleanup_config();
    }

    #[test]
    #[serial(env)]
    fn test_invalid_timeout_is_rejected() {
        cleanup_config();
        env::set_var("SWIFTBOT_ACCESS_TOKEN", "token-123");

        env::set_var("SWIFTBOT_HTTP_TIMEOUT_SECS", "thirty");
        assert!(matches!(
            ClientConfig::from_env(),
            Err(ConfigError::Invalid("SWIFTBOT_HTTP_TIMEOUT_SECS", _))
        ));

        env::set_var("SWIFTBOT_HTTP_TIMEOUT_SECS", "0");
        assert!(matches!(
            ClientConfig::from_env(),
            Err(ConfigError::Invalid("SWIFTBOT_HTTP_TIMEOUT_SECS", _))
        ));

        cleanup_config();
    }

    #[test]
    #[serial(env)]
    fn test_invalid_user_id_is_rejected() {
        cleanup_config();
        env::set_var("SWIFTBOT_ACCESS_TOKEN", "token-123");
        env::set_var("SWIFTBOT_USER_ID", "not-a-uuid");

        assert!(matches!(
            ClientConfig::from_env(),
            Err(ConfigError::Invalid("SWIFTBOT_USER_ID", _))
        ));

        cleanup_config();
    }
}
