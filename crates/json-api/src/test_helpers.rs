//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{affix_state::inject, prelude::*};
use storefront::{
    checkout::{PaymentMethod, ShippingAddress},
    orders::{OrderStatus, Role},
    pricing::{PricingError, PricingPolicy, derive},
};
use storefront_app::{
    auth::{Actor, MockAuthService, UserUuid},
    context::AppContext,
    domain::{
        orders::{
            MockOrdersService,
            models::{Order, OrderItem, OrderUuid},
        },
        payments::MockPaymentGateway,
        products::{MockProductsService, models::ProductUuid},
    },
};
use uuid::Uuid;

use crate::{extensions::*, state::State};

pub(crate) const TEST_CUSTOMER_UUID: UserUuid = UserUuid::from_uuid(Uuid::nil());
pub(crate) const TEST_ADMIN_UUID: UserUuid = UserUuid::from_uuid(Uuid::max());

/// One mock per service; any call without a matching expectation panics.
#[derive(Default)]
pub(crate) struct Mocks {
    pub(crate) orders: MockOrdersService,
    pub(crate) products: MockProductsService,
    pub(crate) payments: MockPaymentGateway,
    pub(crate) auth: MockAuthService,
}

impl Mocks {
    pub(crate) fn into_state(self) -> Arc<State> {
        State::from_app_context(AppContext {
            orders: Arc::new(self.orders),
            products: Arc::new(self.products),
            payments: Arc::new(self.payments),
            auth: Arc::new(self.auth),
        })
    }
}

pub(crate) fn customer() -> Actor {
    Actor {
        user: TEST_CUSTOMER_UUID,
        name: "Test Customer".to_string(),
        role: Role::Customer,
    }
}

pub(crate) fn admin() -> Actor {
    Actor {
        user: TEST_ADMIN_UUID,
        name: "Test Admin".to_string(),
        role: Role::Admin,
    }
}

#[salvo::handler]
pub(crate) async fn inject_customer(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_actor(customer());
    ctrl.call_next(req, depot, res).await;
}

#[salvo::handler]
pub(crate) async fn inject_admin(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_actor(admin());
    ctrl.call_next(req, depot, res).await;
}

/// Route under an authenticated customer.
pub(crate) fn customer_service(mocks: Mocks, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(mocks.into_state()))
            .hoop(inject_customer)
            .push(route),
    )
}

/// Route under an authenticated admin.
pub(crate) fn admin_service(mocks: Mocks, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(mocks.into_state()))
            .hoop(inject_admin)
            .push(route),
    )
}

/// Route with no authenticated caller.
pub(crate) fn anonymous_service(mocks: Mocks, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(mocks.into_state()))
            .push(route),
    )
}

/// A pending, unpaid order for `user`: 3 × 25.00 shipped to London.
pub(crate) fn make_order(uuid: OrderUuid, user: UserUuid) -> Result<Order, PricingError> {
    let items = vec![OrderItem {
        product: ProductUuid::from_uuid(Uuid::nil()),
        name: "Mug".to_string(),
        image: "/images/mug.jpg".to_string(),
        unit_price: 2_500,
        quantity: 3,
    }];

    let pricing = derive(&PricingPolicy::default(), &items)?;

    Ok(Order {
        uuid,
        user,
        submission: Uuid::nil(),
        items,
        shipping_address: ShippingAddress {
            address: "1 High Street".to_string(),
            city: "London".to_string(),
            postal_code: "N1 1AA".to_string(),
            country: "GB".to_string(),
        },
        payment_method: PaymentMethod::Card,
        pricing,
        status: OrderStatus::Pending,
        is_paid: false,
        paid_at: None,
        payment_reference: None,
        tracking_number: None,
        delivered_at: None,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    })
}
