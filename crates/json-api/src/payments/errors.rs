//! Payment Errors

use salvo::{
    http::{StatusError, header::RETRY_AFTER},
    prelude::Response,
};
use tracing::{error, warn};

use storefront_app::domain::payments::PaymentGatewayError;

/// Seconds a client should wait before retrying after a processor timeout.
const RETRY_AFTER_SECONDS: &str = "5";

/// Map a gateway failure to an HTTP error. Timeouts also set `Retry-After`
/// on `res`.
pub(crate) fn into_status_error(error: PaymentGatewayError, res: &mut Response) -> StatusError {
    match error {
        PaymentGatewayError::AmountInvalid(amount) => {
            warn!(amount, "refused to request a non-positive payment");

            StatusError::unprocessable_entity().brief("Payment amount must be positive")
        }
        PaymentGatewayError::InvalidIntentId => {
            StatusError::bad_request().brief("Invalid payment intent id")
        }
        PaymentGatewayError::UpstreamTimeout => {
            warn!("payment processor timed out");

            if let Err(source) = res.add_header(RETRY_AFTER, RETRY_AFTER_SECONDS, true) {
                error!("failed to set retry-after header: {source}");
            }

            StatusError::service_unavailable().brief("Payment processor unavailable, try again")
        }
        PaymentGatewayError::Upstream { status: 402, message } => StatusError::payment_required()
            .brief("Payment declined")
            .detail(message),
        PaymentGatewayError::Upstream { status: 404, .. } => {
            StatusError::not_found().brief("Payment intent not found")
        }
        PaymentGatewayError::Upstream { status, message } => {
            error!(status, "payment processor error: {message}");

            StatusError::bad_gateway()
        }
        PaymentGatewayError::Http(source) => {
            error!("payment processor request failed: {source}");

            StatusError::bad_gateway()
        }
    }
}
