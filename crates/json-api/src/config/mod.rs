//! Server configuration module

use clap::Parser;
use storefront::{money::AmountError, pricing::PricingError};
use storefront_app::context::AppConfig;
use thiserror::Error;

use crate::config::{
    db::DatabaseConfig, observability::LoggingConfig, payments::PaymentsConfig,
    pricing::PricingConfig, server::ServerRuntimeConfig,
};

pub(crate) mod db;
pub(crate) mod observability;
pub(crate) mod payments;
pub(crate) mod pricing;
pub(crate) mod server;

/// Raised when configuration values parse but do not form a usable setup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configured amount has sub-cent digits or is out of range.
    #[error("invalid amount for {setting}: {source}")]
    Amount {
        /// Environment variable holding the amount.
        setting: &'static str,

        /// Conversion failure.
        #[source]
        source: AmountError,
    },

    /// The pricing settings were rejected.
    #[error("invalid pricing configuration: {0}")]
    Pricing(#[from] PricingError),
}

/// Storefront JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "storefront-json", about = "Storefront JSON API Server", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Application database settings.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// Store pricing rules.
    #[command(flatten)]
    pub pricing: PricingConfig,

    /// Payment processor settings.
    #[command(flatten)]
    pub payments: PaymentsConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }

    /// Settings for building the application services.
    ///
    /// # Errors
    ///
    /// Returns an error when the pricing settings are invalid.
    pub fn app_config(&self) -> Result<AppConfig, ConfigError> {
        Ok(AppConfig {
            database_url: self.database.database_url.clone(),
            max_connections: self.database.max_connections,
            pricing: self.pricing.policy()?,
            payments: self.payments.stripe_config(),
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;

    const REQUIRED: [&str; 7] = [
        "storefront-json",
        "--database-url",
        "postgres://localhost/storefront",
        "--payment-secret-key",
        "sk_test_123",
        "--payment-publishable-key",
        "pk_test_123",
    ];

    #[test]
    fn defaults_match_store_policy() -> TestResult {
        let config = ServerConfig::try_parse_from(REQUIRED)?;
        let app = config.app_config()?;

        assert_eq!(config.socket_addr(), "0.0.0.0:8698");
        assert_eq!(app.max_connections, 10);
        assert_eq!(app.pricing.currency().iso_alpha_code, "USD");
        assert_eq!(app.pricing.free_shipping_threshold(), 10_000);
        assert_eq!(app.pricing.flat_shipping_fee(), 1_000);
        assert_eq!(app.pricing.tax_rate(), Decimal::new(10, 2));
        assert_eq!(app.payments.publishable_key, "pk_test_123");
        assert_eq!(app.payments.timeout.as_secs(), 10);

        Ok(())
    }

    #[test]
    fn pricing_settings_are_read_in_major_units() -> TestResult {
        let args = REQUIRED.into_iter().chain([
            "--store-currency",
            "EUR",
            "--free-shipping-threshold",
            "50",
            "--flat-shipping-fee",
            "4.95",
            "--tax-rate",
            "0.2",
        ]);

        let app = ServerConfig::try_parse_from(args)?.app_config()?;

        assert_eq!(app.pricing.currency().iso_alpha_code, "EUR");
        assert_eq!(app.pricing.free_shipping_threshold(), 5_000);
        assert_eq!(app.pricing.flat_shipping_fee(), 495);
        assert_eq!(app.pricing.tax_rate(), Decimal::new(2, 1));

        Ok(())
    }

    #[test]
    fn sub_cent_shipping_fee_is_rejected() -> TestResult {
        let args = REQUIRED
            .into_iter()
            .chain(["--flat-shipping-fee", "4.999"]);

        let result = ServerConfig::try_parse_from(args)?.app_config();

        assert!(
            matches!(
                result,
                Err(ConfigError::Amount {
                    setting: "FLAT_SHIPPING_FEE",
                    ..
                })
            ),
            "expected amount error, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn zero_decimal_currency_is_rejected() -> TestResult {
        let args = REQUIRED.into_iter().chain(["--store-currency", "JPY"]);

        let result = ServerConfig::try_parse_from(args)?.app_config();

        assert!(
            matches!(result, Err(ConfigError::Pricing(_))),
            "expected pricing error, got {result:?}"
        );

        Ok(())
    }
}
