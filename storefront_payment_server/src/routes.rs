//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every database and provider call is therefore async, and calls to
//! Paystack and the push service are bounded by their configured timeouts.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use storefront_payment_engine::{
    db_types::{OrderReference, PaymentStatus},
    helpers::FeeSchedule,
    settlement_objects::{EventProvenance, SettlementOutcome},
    traits::{PaymentProvider, PushNotifier, StorefrontDatabase},
    CheckoutApi,
    PaymentApi,
    SettlementApi,
};

use crate::{
    config::ServerOptions,
    data_objects::{
        CheckoutRequest,
        CheckoutResponse,
        FeeQuery,
        InitializePaymentRequest,
        VerifyPaymentRequest,
        VerifyPaymentResponse,
    },
    errors::ServerError,
    helpers::with_request_details,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Fees  ----------------------------------------------------
/// Prices a product. Storefront admin tools call this when a product is saved and embed the result in the product's
/// pricing snapshot.
#[get("/fees")]
pub async fn fees(query: web::Query<FeeQuery>, schedule: web::Data<FeeSchedule>) -> Result<HttpResponse, ServerError> {
    let price = query.into_inner().price;
    trace!("💻️ GET fees for {price}");
    let breakdown = schedule.calculate(price)?;
    Ok(HttpResponse::Ok().json(breakdown))
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/checkout" impl StorefrontDatabase);
/// Creates a pending order from a cart. The response carries the order reference used for the payment.
pub async fn checkout<B: StorefrontDatabase>(
    body: web::Json<CheckoutRequest>,
    api: web::Data<CheckoutApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST checkout for store #{} ({})", request.admin_id, request.customer_email);
    let order = api.create_order(request.into_new_order(&options.currency)).await?;
    let order_reference = order.order_reference.clone();
    Ok(HttpResponse::Ok().json(CheckoutResponse { order, order_reference }))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(initialize_payment => Post "/payments/initialize" impl StorefrontDatabase, PaymentProvider);
/// Starts a hosted-checkout payment for a pending order.
///
/// Responds with the provider's `authorization_url` and a `redirect_url` deep link that lets the customer contact the
/// merchant. If the provider cannot be reached or rejects the request, the order stays pending and the response is a
/// 502.
pub async fn initialize_payment<B, P>(
    body: web::Json<InitializePaymentRequest>,
    api: web::Data<PaymentApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase,
    P: PaymentProvider,
{
    let request = body.into_inner();
    debug!("💻️ POST initialize payment for order {}", request.order_id);
    let session = api.initiate(request.into()).await?;
    Ok(HttpResponse::Ok().json(session))
}

route!(verify_payment => Post "/payments/verify" impl StorefrontDatabase, PaymentProvider, PushNotifier);
/// Confirms a payment with the provider after the customer returns from the hosted checkout.
///
/// The provider's answer is applied through the same settlement path as webhooks, so it does not matter which of the
/// two arrives first.
pub async fn verify_payment<B, P, N>(
    req: HttpRequest,
    body: web::Json<VerifyPaymentRequest>,
    payments: web::Data<PaymentApi<B, P>>,
    settlement: web::Data<SettlementApi<B, N>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase,
    P: PaymentProvider,
    N: PushNotifier,
{
    let reference = OrderReference::from(body.into_inner().reference.trim());
    debug!("💻️ POST verify payment for order {reference}");
    let Some(event) = payments.fetch_payment_event(&reference).await? else {
        let order = payments
            .fetch_order(&reference)
            .await?
            .ok_or_else(|| ServerError::OrderNotFound(reference.to_string()))?;
        return Ok(HttpResponse::Ok().json(VerifyPaymentResponse {
            reference: reference.to_string(),
            payment_status: order.payment_status,
            outcome: "pending".into(),
        }));
    };
    let provenance = with_request_details(EventProvenance::verification(), &req, &options);
    let outcome = settlement.apply(event, provenance).await?;
    info!("💻️ Verification of {reference}: {outcome}");
    let (order, label) = match outcome {
        SettlementOutcome::UnknownReference(r) => return Err(ServerError::OrderNotFound(r.to_string())),
        SettlementOutcome::AmountMismatch { received, received_currency, .. } => {
            return Err(ServerError::PaymentFailed(format!(
                "The amount paid ({received_currency} {received}) does not match the order total"
            )))
        },
        SettlementOutcome::Settled(order) => (order, "completed"),
        SettlementOutcome::Failed(order) => (order, "failed"),
        SettlementOutcome::Duplicate(order) => (order, "duplicate"),
    };
    if order.payment_status == PaymentStatus::Failed {
        return Err(ServerError::PaymentFailed(format!("Order {reference} was not paid")));
    }
    Ok(HttpResponse::Ok().json(VerifyPaymentResponse {
        reference: reference.to_string(),
        payment_status: order.payment_status,
        outcome: label.into(),
    }))
}
