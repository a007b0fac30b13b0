//! # Storefront payment server
//! This crate hosts the HTTP surface of the storefront payment gateway. It is responsible for:
//! * Pricing products and creating pending orders at checkout.
//! * Starting Paystack hosted-checkout payments, with the merchant's subaccount split attached.
//! * Receiving signed Paystack webhooks and settling orders exactly once.
//! * Confirming payments when the customer returns from the hosted checkout.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/fees`: Fee breakdown for a product price.
//! * `/api/checkout`: Creates a pending order.
//! * `/api/payments/initialize`: Starts a payment for a pending order.
//! * `/api/payments/verify`: Confirms a payment with Paystack and settles the order.
//! * `/webhooks/paystack`: Signed webhook deliveries from Paystack.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod webhook_routes;

#[cfg(test)]
mod endpoint_tests;
