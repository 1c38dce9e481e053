//! Pricing Config

use clap::Args;
use rust_decimal::Decimal;
use storefront::{
    money::{find_currency, to_minor},
    pricing::{PricingError, PricingPolicy},
};

use super::ConfigError;

/// Store-wide pricing rules. Amounts are given in major units.
#[derive(Debug, Args)]
pub struct PricingConfig {
    /// ISO 4217 currency every price is expressed in
    #[arg(long, env = "STORE_CURRENCY", default_value = "USD")]
    pub store_currency: String,

    /// Orders whose items total exceeds this ship for free
    #[arg(long, env = "FREE_SHIPPING_THRESHOLD", default_value = "100.00")]
    pub free_shipping_threshold: Decimal,

    /// Shipping fee below the free shipping threshold
    #[arg(long, env = "FLAT_SHIPPING_FEE", default_value = "10.00")]
    pub flat_shipping_fee: Decimal,

    /// Tax rate as a fraction of the items total
    #[arg(long, env = "TAX_RATE", default_value = "0.10")]
    pub tax_rate: Decimal,
}

impl PricingConfig {
    pub(crate) fn policy(&self) -> Result<PricingPolicy, ConfigError> {
        let currency = find_currency(&self.store_currency).map_err(PricingError::from)?;

        let threshold = to_minor(self.free_shipping_threshold).map_err(|source| {
            ConfigError::Amount {
                setting: "FREE_SHIPPING_THRESHOLD",
                source,
            }
        })?;

        let fee = to_minor(self.flat_shipping_fee).map_err(|source| ConfigError::Amount {
            setting: "FLAT_SHIPPING_FEE",
            source,
        })?;

        Ok(PricingPolicy::new(currency, threshold, fee, self.tax_rate)?)
    }
}
