//! Post-write notification hook for tachycardic readings.
//!
//! [`NotificationGate`] runs after every successful append. It classifies the
//! readings it has not evaluated yet, applies the configured [`NotifyPolicy`],
//! and hands the messages to an injected [`Notifier`] on a spawned task. Delivery is
//! best-effort: failures and timeouts are logged and never reach the caller,
//! and no store lock is held while the notifier runs.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

use crate::error::CoreError;
use crate::classifier::is_tachycardic;
use crate::patient::{Patient, Reading};
use crate::types::PatientId;

/// Default upper bound on a single notifier call, retries included.
///
/// Must cover the slowest channel's full retry schedule, or later attempts
/// are cancelled before they run.
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Notifier contract
// ---------------------------------------------------------------------------

/// Error type for notification delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The transport rejected or failed to deliver the message.
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    /// The notifier did not finish within the gate's bound.
    #[error("Notification timed out after {0:?}")]
    Timeout(Duration),
}

/// One-way capability to deliver a message to a contact address.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, contact: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// When a tachycardic reading produces a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotifyPolicy {
    /// Every append whose latest status is tachycardic notifies.
    #[default]
    EveryReading,
    /// Only the first tachycardic reading of an episode notifies; a
    /// non-tachycardic reading ends the episode.
    OncePerEpisode,
}

impl FromStr for NotifyPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "every_reading" => Ok(Self::EveryReading),
            "once_per_episode" => Ok(Self::OncePerEpisode),
            other => Err(CoreError::InvalidArgument(format!(
                "unknown notify policy '{other}' (expected every_reading or once_per_episode)"
            ))),
        }
    }
}

impl fmt::Display for NotifyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EveryReading => f.write_str("every_reading"),
            Self::OncePerEpisode => f.write_str("once_per_episode"),
        }
    }
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// A message the gate decided to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub patient_id: PatientId,
    pub contact: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    fn tachycardia_alert(patient: &Patient, reading: &Reading) -> Self {
        Self {
            patient_id: patient.patient_id.clone(),
            contact: patient.attending_email.clone(),
            subject: format!("Tachycardia alert for patient {}", patient.patient_id),
            body: format!(
                "Patient {} (age {}) recorded a tachycardic heart rate of {} bpm at {}.",
                patient.patient_id, patient.user_age, reading.heart_rate, reading.timestamp
            ),
        }
    }
}

/// Per-patient progress through the reading series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Tracking {
        /// Number of readings already evaluated.
        seen: usize,
        /// Whether the last evaluated reading was tachycardic.
        in_episode: bool,
    },
    /// The patient was removed; snapshots still in flight are ignored
    /// until the id is registered again.
    Removed,
}

impl Cursor {
    const FRESH: Cursor = Cursor::Tracking {
        seen: 0,
        in_episode: false,
    };

    /// Cursor for a patient the gate has never seen, such as one loaded
    /// from a persistent store after a restart. Only the newest reading is
    /// left to evaluate; history is not replayed.
    fn resume(patient: &Patient) -> Self {
        let seen = patient.readings.len().saturating_sub(1);
        let in_episode = seen
            .checked_sub(1)
            .and_then(|i| patient.readings.get(i))
            .is_some_and(|r| is_tachycardic(patient.user_age, r.heart_rate));
        Cursor::Tracking { seen, in_episode }
    }
}

pub struct NotificationGate {
    notifier: Arc<dyn Notifier>,
    policy: NotifyPolicy,
    timeout: Duration,
    /// Evaluation progress per patient.
    cursors: Mutex<HashMap<PatientId, Cursor>>,
    /// In-flight delivery tasks, awaited on shutdown.
    tasks: TaskTracker,
}

impl NotificationGate {
    pub fn new(notifier: Arc<dyn Notifier>, policy: NotifyPolicy, timeout: Duration) -> Self {
        Self {
            notifier,
            policy,
            timeout,
            cursors: Mutex::new(HashMap::new()),
            tasks: TaskTracker::new(),
        }
    }

    /// Decide which notifications a freshly appended snapshot produces.
    ///
    /// Every reading is evaluated exactly once and in series order, whatever
    /// order concurrent appends reach the gate in. A snapshot that is not
    /// longer than what was already evaluated is stale and yields nothing.
    pub async fn evaluate(&self, patient: &Patient) -> Vec<Notification> {
        let mut cursors = self.cursors.lock().await;
        let cursor = cursors
            .entry(patient.patient_id.clone())
            .or_insert_with(|| Cursor::resume(patient));

        let Cursor::Tracking { seen, in_episode } = *cursor else {
            tracing::debug!(patient_id = %patient.patient_id, "Ignoring snapshot of removed patient");
            return Vec::new();
        };
        if patient.readings.len() <= seen {
            tracing::debug!(
                patient_id = %patient.patient_id,
                readings = patient.readings.len(),
                seen,
                "Ignoring stale snapshot"
            );
            return Vec::new();
        }

        let mut in_episode = in_episode;
        let mut alerts = Vec::new();
        for reading in &patient.readings[seen..] {
            let tachycardic = is_tachycardic(patient.user_age, reading.heart_rate);
            let notify = match self.policy {
                NotifyPolicy::EveryReading => tachycardic,
                NotifyPolicy::OncePerEpisode => tachycardic && !in_episode,
            };
            if notify {
                alerts.push(Notification::tachycardia_alert(patient, reading));
            } else if tachycardic {
                tracing::debug!(
                    patient_id = %patient.patient_id,
                    "Tachycardia episode already notified, suppressing"
                );
            }
            in_episode = tachycardic;
        }

        *cursor = Cursor::Tracking {
            seen: patient.readings.len(),
            in_episode,
        };
        alerts
    }

    /// Evaluate the freshly appended patient and dispatch any notifications.
    ///
    /// Returns the handle of the spawned delivery task so callers may await
    /// it; dropping the handle leaves delivery running in the background.
    pub async fn evaluate_and_notify(&self, patient: &Patient) -> Option<JoinHandle<()>> {
        let notifications = self.evaluate(patient).await;
        if notifications.is_empty() {
            return None;
        }
        Some(self.dispatch(notifications))
    }

    /// Start tracking a newly registered patient from an empty series.
    pub async fn track(&self, patient_id: &str) {
        let mut cursors = self.cursors.lock().await;
        let cursor = cursors
            .entry(patient_id.to_string())
            .or_insert(Cursor::FRESH);
        if *cursor == Cursor::Removed {
            *cursor = Cursor::FRESH;
        }
    }

    /// Mark a patient as removed so late snapshots of it are ignored.
    pub async fn forget(&self, patient_id: &str) {
        self.cursors
            .lock()
            .await
            .insert(patient_id.to_string(), Cursor::Removed);
    }

    /// Stop accepting deliveries and wait up to `grace` for in-flight ones.
    ///
    /// Returns `false` if some deliveries were still running at the deadline.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.tasks.close();
        tokio::time::timeout(grace, self.tasks.wait()).await.is_ok()
    }

    /// Number of deliveries still running.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    fn dispatch(&self, notifications: Vec<Notification>) -> JoinHandle<()> {
        let notifier = Arc::clone(&self.notifier);
        let timeout = self.timeout;

        self.tasks.spawn(async move {
            for notification in notifications {
                let delivery = notifier.notify(
                    &notification.contact,
                    &notification.subject,
                    &notification.body,
                );
                let result = match tokio::time::timeout(timeout, delivery).await {
                    Ok(result) => result,
                    Err(_) => Err(NotifyError::Timeout(timeout)),
                };

                match result {
                    Ok(()) => tracing::info!(
                        patient_id = %notification.patient_id,
                        contact = %notification.contact,
                        "Tachycardia notification sent"
                    ),
                    Err(e) => tracing::warn!(
                        patient_id = %notification.patient_id,
                        contact = %notification.contact,
                        error = %e,
                        "Tachycardia notification failed"
                    ),
                }
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::types::Timestamp;

    #[derive(Default)]
    struct CountingNotifier {
        sent: AtomicUsize,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn notify(&self, _contact: &str, _subject: &str, _body: &str) -> Result<(), NotifyError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(&self, _contact: &str, _subject: &str, _body: &str) -> Result<(), NotifyError> {
            Err(NotifyError::Delivery("smtp down".to_string()))
        }
    }

    struct StalledNotifier;

    #[async_trait]
    impl Notifier for StalledNotifier {
        async fn notify(&self, _contact: &str, _subject: &str, _body: &str) -> Result<(), NotifyError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    fn patient(age: u32, rates: &[u32]) -> Patient {
        Patient {
            patient_id: "P1".to_string(),
            attending_email: "doc@duke.edu".to_string(),
            user_age: age,
            readings: rates
                .iter()
                .map(|&heart_rate| Reading {
                    heart_rate,
                    timestamp: Timestamp::now(),
                })
                .collect(),
        }
    }

    fn gate(notifier: Arc<dyn Notifier>, policy: NotifyPolicy) -> NotificationGate {
        NotificationGate::new(notifier, policy, Duration::from_millis(200))
    }

    #[test]
    fn policy_parses_from_config_strings() {
        assert_eq!("every_reading".parse::<NotifyPolicy>().unwrap(), NotifyPolicy::EveryReading);
        assert_eq!(
            " ONCE_PER_EPISODE ".parse::<NotifyPolicy>().unwrap(),
            NotifyPolicy::OncePerEpisode
        );
        assert!("sometimes".parse::<NotifyPolicy>().is_err());
        assert_eq!(NotifyPolicy::OncePerEpisode.to_string(), "once_per_episode");
    }

    #[tokio::test]
    async fn normal_reading_does_not_notify() {
        let g = gate(Arc::new(CountingNotifier::default()), NotifyPolicy::EveryReading);
        assert!(g.evaluate(&patient(21, &[90])).await.is_empty());
        assert!(g.evaluate(&patient(21, &[])).await.is_empty());
    }

    #[tokio::test]
    async fn tachycardic_reading_builds_alert() {
        let g = gate(Arc::new(CountingNotifier::default()), NotifyPolicy::EveryReading);
        let alerts = g.evaluate(&patient(21, &[90, 110])).await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].contact, "doc@duke.edu");
        assert_eq!(alerts[0].subject, "Tachycardia alert for patient P1");
        assert!(alerts[0].body.contains("110 bpm"));
    }

    #[tokio::test]
    async fn every_reading_policy_repeats() {
        let notifier = Arc::new(CountingNotifier::default());
        let g = gate(notifier.clone(), NotifyPolicy::EveryReading);

        for rates in [&[110][..], &[110, 120][..]] {
            g.evaluate_and_notify(&patient(21, rates)).await.unwrap().await.unwrap();
        }
        assert_eq!(notifier.sent.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn once_per_episode_suppresses_until_recovery() {
        let g = gate(Arc::new(CountingNotifier::default()), NotifyPolicy::OncePerEpisode);

        assert_eq!(g.evaluate(&patient(21, &[110])).await.len(), 1);
        assert!(g.evaluate(&patient(21, &[110, 120])).await.is_empty());
        assert!(g.evaluate(&patient(21, &[110, 120, 80])).await.is_empty());
        assert_eq!(g.evaluate(&patient(21, &[110, 120, 80, 130])).await.len(), 1);
    }

    #[tokio::test]
    async fn out_of_order_snapshots_keep_episode_state() {
        let g = gate(Arc::new(CountingNotifier::default()), NotifyPolicy::OncePerEpisode);
        g.track("P1").await;

        // The later append reaches the gate first and covers both readings.
        let alerts = g.evaluate(&patient(21, &[110, 80])).await;
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].body.contains("110 bpm"));

        // The earlier snapshot arrives late and must not reopen the episode.
        assert!(g.evaluate(&patient(21, &[110])).await.is_empty());

        let alerts = g.evaluate(&patient(21, &[110, 80, 130])).await;
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].body.contains("130 bpm"));
    }

    #[tokio::test]
    async fn out_of_order_snapshots_notify_each_reading_once() {
        let g = gate(Arc::new(CountingNotifier::default()), NotifyPolicy::EveryReading);
        g.track("P1").await;

        assert_eq!(g.evaluate(&patient(21, &[110, 120])).await.len(), 2);
        assert!(g.evaluate(&patient(21, &[110])).await.is_empty());
    }

    #[tokio::test]
    async fn unknown_patient_resumes_from_latest_reading() {
        let g = gate(Arc::new(CountingNotifier::default()), NotifyPolicy::OncePerEpisode);

        // History is not replayed, and an episode already under way stays quiet.
        assert!(g.evaluate(&patient(21, &[150, 150, 120])).await.is_empty());
        assert!(g.evaluate(&patient(21, &[150, 150, 120, 80])).await.is_empty());
        assert_eq!(g.evaluate(&patient(21, &[150, 150, 120, 80, 130])).await.len(), 1);
    }

    #[tokio::test]
    async fn removed_patient_ignores_late_snapshots_until_registered_again() {
        let g = gate(Arc::new(CountingNotifier::default()), NotifyPolicy::OncePerEpisode);
        g.track("P1").await;
        assert_eq!(g.evaluate(&patient(21, &[110])).await.len(), 1);

        g.forget("P1").await;
        assert!(g.evaluate(&patient(21, &[110, 120])).await.is_empty());

        g.track("P1").await;
        assert_eq!(g.evaluate(&patient(21, &[130])).await.len(), 1);
    }

    #[tokio::test]
    async fn track_keeps_existing_progress() {
        let g = gate(Arc::new(CountingNotifier::default()), NotifyPolicy::EveryReading);
        assert_eq!(g.evaluate(&patient(21, &[110])).await.len(), 1);

        g.track("P1").await;
        assert!(g.evaluate(&patient(21, &[110])).await.is_empty());
    }

    #[tokio::test]
    async fn delivery_failure_is_contained() {
        let g = gate(Arc::new(FailingNotifier), NotifyPolicy::EveryReading);
        let handle = g.evaluate_and_notify(&patient(21, &[150])).await.unwrap();
        assert!(handle.await.is_ok());
    }

    #[tokio::test]
    async fn drain_waits_for_in_flight_deliveries() {
        let notifier = Arc::new(CountingNotifier::default());
        let g = gate(notifier.clone(), NotifyPolicy::EveryReading);
        drop(g.evaluate_and_notify(&patient(21, &[150])).await);

        assert!(g.drain(Duration::from_secs(5)).await);
        assert_eq!(g.in_flight(), 0);
        assert_eq!(notifier.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn drain_gives_up_at_deadline() {
        let g = NotificationGate::new(
            Arc::new(StalledNotifier),
            NotifyPolicy::EveryReading,
            Duration::from_secs(60),
        );
        drop(g.evaluate_and_notify(&patient(21, &[150])).await);

        assert!(!g.drain(Duration::from_millis(50)).await);
        assert_eq!(g.in_flight(), 1);
    }

    #[tokio::test]
    async fn stalled_notifier_is_bounded_by_timeout() {
        let g = gate(Arc::new(StalledNotifier), NotifyPolicy::EveryReading);
        let handle = g.evaluate_and_notify(&patient(21, &[150])).await.unwrap();
        let finished = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(finished.is_ok());
    }
}
