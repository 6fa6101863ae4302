//! Outbound notification channels for the heart-rate sentinel.
//!
//! Each channel implements [`sentinel_core::gate::Notifier`]:
//!
//! - [`EmailNotifier`]: SMTP delivery via `lettre`.
//! - [`WebhookNotifier`]: JSON POST with exponential-backoff retry.
//! - [`TracingNotifier`]: logs the message; the fallback when no external
//!   channel is configured.
//!
//! [`notifier_from_env`] picks one based on the environment.

use std::sync::Arc;
use std::time::Duration;

use sentinel_core::gate::Notifier;

pub mod email;
pub mod log;
pub mod webhook;

pub use email::{EmailConfig, EmailNotifier};
pub use log::TracingNotifier;
pub use webhook::{WebhookConfig, WebhookNotifier};

/// Build the notifier selected by the environment.
///
/// Preference order: SMTP (`SMTP_HOST`), webhook (`NOTIFY_WEBHOOK_URL`),
/// then the tracing fallback. `notify_timeout` is the bound the gate puts on
/// each delivery; a webhook whose retry schedule exceeds it is logged.
pub fn notifier_from_env(notify_timeout: Duration) -> Arc<dyn Notifier> {
    if let Some(config) = EmailConfig::from_env() {
        tracing::info!(smtp_host = %config.smtp_host, "Using SMTP notifier");
        return Arc::new(EmailNotifier::new(config));
    }
    if let Some(config) = WebhookConfig::from_env() {
        let budget = config.retry_budget();
        if budget > notify_timeout {
            tracing::warn!(
                ?budget,
                ?notify_timeout,
                "Webhook retry schedule exceeds NOTIFY_TIMEOUT_SECS, late retries will be cancelled"
            );
        }
        tracing::info!(url = %config.url, "Using webhook notifier");
        return Arc::new(WebhookNotifier::new(config));
    }
    tracing::warn!("No notification channel configured, alerts will only be logged");
    Arc::new(TracingNotifier)
}
