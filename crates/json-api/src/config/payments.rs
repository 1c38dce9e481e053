//! Payments Config

use std::{fmt, time::Duration};

use clap::Args;
use storefront_app::domain::payments::StripeConfig;
use zeroize::Zeroizing;

/// Payment processor settings.
#[derive(Args)]
pub struct PaymentsConfig {
    /// Processor API base URL
    #[arg(long, env = "PAYMENT_API_BASE", default_value = "https://api.stripe.com")]
    pub payment_api_base: String,

    /// Secret processor API key
    #[arg(long, env = "PAYMENT_SECRET_KEY", hide_env_values = true)]
    pub payment_secret_key: String,

    /// Publishable key handed to browsers
    #[arg(long, env = "PAYMENT_PUBLISHABLE_KEY")]
    pub payment_publishable_key: String,

    /// Upper bound for each processor call, in seconds
    #[arg(long, env = "PAYMENT_TIMEOUT_SECONDS", default_value_t = 10_u64)]
    pub payment_timeout_seconds: u64,
}

impl fmt::Debug for PaymentsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentsConfig")
            .field("payment_api_base", &self.payment_api_base)
            .field("payment_secret_key", &"**redacted**")
            .field("payment_publishable_key", &self.payment_publishable_key)
            .field("payment_timeout_seconds", &self.payment_timeout_seconds)
            .finish()
    }
}

impl PaymentsConfig {
    pub(crate) fn stripe_config(&self) -> StripeConfig {
        StripeConfig {
            api_base: self.payment_api_base.clone(),
            secret_key: Zeroizing::new(self.payment_secret_key.clone()),
            publishable_key: self.payment_publishable_key.clone(),
            timeout: Duration::from_secs(self.payment_timeout_seconds),
        }
    }
}
