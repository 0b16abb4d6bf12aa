//! Buffered confirmation-email queue with a retrying delivery worker.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::{ConfirmationEmail, MailTransport};
use crate::config::SmtpConfig;
use crate::AppError;

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Delivery limits for the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPolicy {
    /// Attempts per message before it is dropped.
    pub max_attempts: u32,
    /// Upper bound on a single attempt.
    pub attempt_timeout: Duration,
    /// Delay before the first retry; doubles up to 30 s.
    pub initial_backoff: Duration,
    /// Pending messages the queue holds before refusing new ones.
    pub queue_capacity: usize,
}

impl DispatchPolicy {
    /// Policy taken from the `[smtp]` config section.
    #[must_use]
    pub fn from_config(config: &SmtpConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            attempt_timeout: config.attempt_timeout(),
            initial_backoff: config.retry_delay(),
            queue_capacity: config.queue_capacity.max(1),
        }
    }
}

/// Cheap, cloneable handle used to request confirmation emails.
///
/// A disabled notifier (no mail transport configured) refuses every
/// request.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    queue_tx: Option<mpsc::Sender<ConfirmationEmail>>,
}

impl Notifier {
    /// A notifier that never sends anything.
    #[must_use]
    pub fn disabled() -> Self {
        Self { queue_tx: None }
    }

    /// Whether a delivery worker is attached.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.queue_tx.is_some()
    }

    /// Queue `email` for delivery without waiting.
    ///
    /// Returns `false` when notifications are disabled, the queue is full,
    /// or the worker has stopped. Delivery failures after queuing are only
    /// logged.
    #[must_use]
    pub fn notify(&self, email: ConfirmationEmail) -> bool {
        let Some(queue_tx) = &self.queue_tx else {
            warn!(recipient = %email.recipient, "mail transport not configured; confirmation email skipped");
            return false;
        };

        match queue_tx.try_send(email) {
            Ok(()) => true,
            Err(TrySendError::Full(email)) => {
                warn!(recipient = %email.recipient, "notification queue full; confirmation email dropped");
                false
            }
            Err(TrySendError::Closed(email)) => {
                warn!(recipient = %email.recipient, "notification worker stopped; confirmation email dropped");
                false
            }
        }
    }
}

/// Background delivery worker.
pub struct NotificationService;

impl NotificationService {
    /// Spawn the delivery worker and return the handle that feeds it.
    ///
    /// The worker runs until `cancel` fires or every [`Notifier`] clone is
    /// dropped.
    #[must_use]
    pub fn start(
        transport: Arc<dyn MailTransport>,
        policy: DispatchPolicy,
        cancel: CancellationToken,
    ) -> (Notifier, JoinHandle<()>) {
        let (queue_tx, queue_rx) = mpsc::channel(policy.queue_capacity);
        let worker = Self::spawn_worker(transport, policy, queue_rx, cancel);
        info!(
            max_attempts = policy.max_attempts,
            capacity = policy.queue_capacity,
            "notification worker started"
        );
        (
            Notifier {
                queue_tx: Some(queue_tx),
            },
            worker,
        )
    }

    fn spawn_worker(
        transport: Arc<dyn MailTransport>,
        policy: DispatchPolicy,
        mut queue_rx: mpsc::Receiver<ConfirmationEmail>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let email = tokio::select! {
                    () = cancel.cancelled() => {
                        info!("notification worker shutting down");
                        break;
                    }
                    maybe_email = queue_rx.recv() => {
                        if let Some(email) = maybe_email { email } else {
                            info!("notification queue closed");
                            break;
                        }
                    }
                };

                deliver(transport.as_ref(), &email, policy, &cancel).await;
            }
        })
    }
}

/// Try to deliver `email` until it succeeds, attempts run out, or `cancel`
/// fires. An `Undeliverable` error ends delivery at once. Returns whether
/// it was delivered.
async fn deliver(
    transport: &dyn MailTransport,
    email: &ConfirmationEmail,
    policy: DispatchPolicy,
    cancel: &CancellationToken,
) -> bool {
    let mut backoff = policy.initial_backoff;
    for attempt in 1..=policy.max_attempts {
        match timeout(policy.attempt_timeout, transport.send(email)).await {
            Ok(Ok(())) => {
                info!(recipient = %email.recipient, attempt, "confirmation email delivered");
                return true;
            }
            Ok(Err(err @ AppError::Undeliverable(_))) => {
                error!(recipient = %email.recipient, attempt, %err, "confirmation email rejected; not retrying");
                return false;
            }
            Ok(Err(err)) => {
                warn!(recipient = %email.recipient, attempt, %err, "confirmation email failed");
            }
            Err(_) => {
                warn!(recipient = %email.recipient, attempt, timeout = ?policy.attempt_timeout, "confirmation email timed out");
            }
        }

        if attempt == policy.max_attempts {
            break;
        }

        tokio::select! {
            () = cancel.cancelled() => {
                warn!(recipient = %email.recipient, "shutdown during retry backoff; email abandoned");
                return false;
            }
            () = sleep(backoff) => {}
        }
        backoff = (backoff * 2).min(MAX_RETRY_DELAY);
    }

    error!(
        recipient = %email.recipient,
        attempts = policy.max_attempts,
        "giving up on confirmation email"
    );
    false
}
