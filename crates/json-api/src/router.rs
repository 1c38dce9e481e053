//! App Router

use salvo::Router;

use crate::{auth, healthcheck, observability, orders, payments, reviews};

/// Every API route. Routes before the auth group are public.
pub(crate) fn app_router() -> Router {
    Router::new()
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(Router::with_path("metrics").get(observability::metrics_handler))
        .push(Router::with_path("payments/config").get(payments::config::handler))
        .push(Router::with_path("products/{product}/reviews").get(reviews::index::handler))
        .push(
            Router::new()
                .hoop(auth::middleware::handler)
                .push(
                    Router::with_path("orders")
                        .get(orders::index::handler)
                        .post(orders::create::handler)
                        .push(Router::with_path("mine").get(orders::mine::handler))
                        .push(
                            Router::with_path("{order}")
                                .get(orders::get::handler)
                                .push(Router::with_path("pay").put(orders::pay::handler))
                                .push(Router::with_path("status").put(orders::status::handler)),
                        ),
                )
                .push(
                    Router::with_path("payments/create-payment-intent")
                        .post(payments::create_intent::handler),
                )
                .push(
                    Router::with_path("products/{product}/reviews")
                        .post(reviews::create::handler),
                ),
        )
}
