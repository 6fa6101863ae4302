//! Request handlers.
//!
//! Handlers parse and validate the request, delegate to
//! [`MonitorService`](sentinel_core::service::MonitorService) and map errors
//! via [`AppError`](crate::error::AppError).

pub mod patient;
