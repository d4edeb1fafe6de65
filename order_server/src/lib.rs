//! # Order server
//! This crate hosts the HTTP surface of the order lifecycle engine. It is responsible for:
//! * Authenticating callers with bearer tokens, and gating role-restricted routes.
//! * Translating requests into calls on the [`order_engine::OrderFlowApi`].
//! * Mapping engine errors onto HTTP status codes with JSON error bodies.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/orders/...`: The order routes. See [routes](routes/index.html). All of them require an access token.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
