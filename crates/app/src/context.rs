//! App Context

use std::sync::Arc;

use storefront::pricing::PricingPolicy;
use thiserror::Error;

use crate::{
    auth::{AuthService, PgAuthService},
    database::{self, Db},
    domain::{
        orders::{OrdersService, PgOrdersService},
        payments::{PaymentGateway, PaymentGatewayError, StripeConfig, StripeGateway},
        products::{PgProductsService, ProductsService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to configure payment gateway")]
    Payments(#[source] PaymentGatewayError),
}

/// Everything needed to build the application services.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub pricing: PricingPolicy,
    pub payments: StripeConfig,
}

#[derive(Clone)]
pub struct AppContext {
    pub orders: Arc<dyn OrdersService>,
    pub products: Arc<dyn ProductsService>,
    pub payments: Arc<dyn PaymentGateway>,
    pub auth: Arc<dyn AuthService>,
}

impl AppContext {
    /// Build application context from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection or building
    /// the payment client fails.
    pub async fn from_config(config: AppConfig) -> Result<Self, AppInitError> {
        let pool = database::connect(&config.database_url, config.max_connections)
            .await
            .map_err(AppInitError::Database)?;

        let payments = StripeGateway::new(config.payments).map_err(AppInitError::Payments)?;

        let db = Db::new(pool.clone());

        Ok(Self {
            orders: Arc::new(PgOrdersService::new(db.clone(), config.pricing)),
            products: Arc::new(PgProductsService::new(db)),
            payments: Arc::new(payments),
            auth: Arc::new(PgAuthService::new(pool)),
        })
    }
}
