use async_trait::async_trait;
use sentinel_core::gate::{Notifier, NotifyError};

/// Notifier that only records the message in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, contact: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        tracing::info!(to = contact, subject, body, "Notification (log only)");
        Ok(())
    }
}
