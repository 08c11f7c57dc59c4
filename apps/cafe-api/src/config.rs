//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//! `main` loads `.env` (via `dotenvy`) before calling [`ApiConfig::load`].

use std::env;
use std::path::PathBuf;

use cafe_core::{Money, PricingPolicy, TaxRate, DEFAULT_DELIVERY_FEE_CENTS, DEFAULT_TAX_RATE_BPS};

/// Fallback customer token secret when `JWT_SECRET` is unset.
pub const DEV_JWT_SECRET: &str = "kube-cafe-dev-user-secret";

/// Fallback admin token secret when `JWT_ADMIN_SECRET` is unset.
pub const DEV_JWT_ADMIN_SECRET: &str = "kube-cafe-dev-admin-secret";

/// Deployment environment. Only `development` leaks error details, and only
/// when asked for explicitly: an unset `APP_ENV` means production.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn is_development(&self) -> bool {
        matches!(self, AppEnv::Development)
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP listen port
    pub port: u16,

    /// SQLite location (`sqlite://path`, a bare path, or `sqlite::memory:`)
    pub database_url: String,

    /// Secret for customer tokens
    pub jwt_secret: String,

    /// Secret for admin tokens; must differ from `jwt_secret`
    pub jwt_admin_secret: String,

    /// Customer token lifetime in seconds
    pub jwt_user_lifetime_secs: i64,

    /// Admin token lifetime in seconds
    pub jwt_admin_lifetime_secs: i64,

    pub app_env: AppEnv,

    /// Where uploaded menu images are written
    pub upload_dir: PathBuf,

    /// Tax in basis points (500 = 5%)
    pub tax_rate_bps: u32,

    /// Flat delivery fee in paise
    pub delivery_fee_cents: i64,

    /// Request body cap, applied to multipart uploads too
    pub max_upload_bytes: usize,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,

            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "./cafe.db".to_string()),

            jwt_secret: env::var("JWT_SECRET")
                // In production, this MUST be set via environment variable
                .unwrap_or_else(|_| DEV_JWT_SECRET.to_string()),

            jwt_admin_secret: env::var("JWT_ADMIN_SECRET")
                .unwrap_or_else(|_| DEV_JWT_ADMIN_SECRET.to_string()),

            jwt_user_lifetime_secs: env::var("JWT_USER_LIFETIME_SECS")
                .unwrap_or_else(|_| "86400".to_string()) // 1 day
                .parse()
                .map_err(|_| ConfigError::InvalidValue("JWT_USER_LIFETIME_SECS".to_string()))?,

            jwt_admin_lifetime_secs: env::var("JWT_ADMIN_LIFETIME_SECS")
                .unwrap_or_else(|_| "86400".to_string()) // 24 hours
                .parse()
                .map_err(|_| ConfigError::InvalidValue("JWT_ADMIN_LIFETIME_SECS".to_string()))?,

            app_env: parse_app_env(env::var("APP_ENV").ok().as_deref())?,

            upload_dir: env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads".to_string())
                .into(),

            tax_rate_bps: env::var("TAX_RATE_BPS")
                .unwrap_or_else(|_| DEFAULT_TAX_RATE_BPS.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("TAX_RATE_BPS".to_string()))?,

            delivery_fee_cents: env::var("DELIVERY_FEE_CENTS")
                .unwrap_or_else(|_| DEFAULT_DELIVERY_FEE_CENTS.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DELIVERY_FEE_CENTS".to_string()))?,

            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| (5 * 1024 * 1024).to_string()) // 5 MiB
                .parse()
                .map_err(|_| ConfigError::InvalidValue("MAX_UPLOAD_BYTES".to_string()))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field rules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if self.jwt_admin_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_ADMIN_SECRET".to_string()));
        }
        if self.jwt_secret == self.jwt_admin_secret {
            return Err(ConfigError::SharedSecret);
        }
        if self.delivery_fee_cents < 0 {
            return Err(ConfigError::InvalidValue("DELIVERY_FEE_CENTS".to_string()));
        }
        Ok(())
    }

    /// True when either token secret is still the built-in fallback.
    pub fn uses_dev_secrets(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET || self.jwt_admin_secret == DEV_JWT_ADMIN_SECRET
    }

    /// Tax and delivery fee as used by checkout.
    pub fn pricing(&self) -> PricingPolicy {
        PricingPolicy::new(
            TaxRate::from_bps(self.tax_rate_bps),
            Money::from_cents(self.delivery_fee_cents),
        )
    }

    /// Configuration for tests: in-memory database, fixed secrets, defaults
    /// everywhere else.
    pub fn for_tests() -> Self {
        ApiConfig {
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-user-secret".to_string(),
            jwt_admin_secret: "test-admin-secret".to_string(),
            jwt_user_lifetime_secs: 86_400,
            jwt_admin_lifetime_secs: 86_400,
            app_env: AppEnv::Development,
            upload_dir: env::temp_dir().join("cafe-api-test-uploads"),
            tax_rate_bps: DEFAULT_TAX_RATE_BPS,
            delivery_fee_cents: DEFAULT_DELIVERY_FEE_CENTS,
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

fn parse_app_env(value: Option<&str>) -> Result<AppEnv, ConfigError> {
    let Some(value) = value else {
        return Ok(AppEnv::Production);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "development" | "dev" => Ok(AppEnv::Development),
        "production" | "prod" => Ok(AppEnv::Production),
        _ => Err(ConfigError::InvalidValue("APP_ENV".to_string())),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("JWT_SECRET and JWT_ADMIN_SECRET must differ")]
    SharedSecret,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_secret_rejected() {
        let mut config = ApiConfig::for_tests();
        assert!(config.validate().is_ok());

        config.jwt_admin_secret = config.jwt_secret.clone();
        assert!(matches!(config.validate(), Err(ConfigError::SharedSecret)));
    }

    #[test]
    fn test_parse_app_env() {
        assert_eq!(parse_app_env(Some("Production")).unwrap(), AppEnv::Production);
        assert_eq!(parse_app_env(Some("dev")).unwrap(), AppEnv::Development);
        assert!(parse_app_env(Some("staging")).is_err());
    }

    #[test]
    fn test_unset_app_env_is_production() {
        let env = parse_app_env(None).unwrap();
        assert_eq!(env, AppEnv::Production);
        assert!(!env.is_development());
    }

    #[test]
    fn test_dev_secrets_detected() {
        let mut config = ApiConfig::for_tests();
        assert!(!config.uses_dev_secrets());

        config.jwt_admin_secret = DEV_JWT_ADMIN_SECRET.to_string();
        assert!(config.uses_dev_secrets());
    }

    #[test]
    fn test_pricing_from_config() {
        let mut config = ApiConfig::for_tests();
        config.tax_rate_bps = 1_800;
        config.delivery_fee_cents = 2_500;

        let pricing = config.pricing();
        assert_eq!(pricing.tax_rate.bps(), 1_800);
        assert_eq!(pricing.delivery_fee.cents(), 2_500);
    }
}
