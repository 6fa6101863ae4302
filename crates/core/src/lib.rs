//! Heart-rate sentinel domain core.
//!
//! - [`store`]: per-patient, append-only reading series behind the
//!   [`PatientStore`](store::PatientStore) contract, with an in-memory backend.
//! - [`classifier`]: age-banded tachycardia thresholds.
//! - [`query`]: latest status, history, average and interval average.
//! - [`gate`]: post-write tachycardia notification hook.
//! - [`service`]: the facade the request layer calls.
//!
//! All logic here is free of transport and storage concerns so it can be
//! tested in isolation.

pub mod classifier;
pub mod error;
pub mod gate;
pub mod patient;
pub mod query;
pub mod service;
pub mod store;
pub mod types;
