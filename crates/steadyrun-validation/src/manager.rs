//! Validation manager: validator registry, queue binding, and the
//! cancellable background worker that drains the queue.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace, warn};

use steadyrun_core::ReceivedMessage;

use crate::error::ValidationError;
use crate::queue::{FileQueue, ResponseQueue};
use crate::validator::MessageValidator;

/// Pause between validated items while the run is still measuring, so the
/// worker cannot contend with the send path.
const THROTTLE_PAUSE: Duration = Duration::from_millis(500);

/// Flags shared between the worker and its callers. One lock guards them
/// all; readers on the measurement side poll without holding it across
/// waits.
struct SessionState {
    finished: bool,
    all_valid: bool,
    enabled: bool,
    fast_forward: bool,
}

impl SessionState {
    fn new() -> Self {
        Self {
            finished: true,
            all_valid: true,
            enabled: false,
            fast_forward: false,
        }
    }
}

/// Manages response validators and drives asynchronous validation.
///
/// Responses captured on the send path are appended to a durable queue
/// and validated by exactly one background worker per session, on a
/// schedule decoupled from measurement.
///
/// # Example
///
/// ```ignore
/// use steadyrun_validation::ValidatorManager;
///
/// let manager = ValidatorManager::new()?;
/// manager.add_validator("ok-check", Arc::new(MyValidator));
///
/// manager.start_validation();
/// // ... run finishes, captured responses keep arriving ...
/// manager.wait_for_validation().await;
/// assert!(manager.all_messages_valid());
/// ```
pub struct ValidatorManager {
    validators: RwLock<BTreeMap<String, Arc<dyn MessageValidator>>>,
    queue: RwLock<Arc<dyn ResponseQueue>>,
    session: Arc<RwLock<SessionState>>,
    shutdown_tx: Mutex<Option<watch::Sender<bool>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ValidatorManager {
    /// Create a manager with the default durable queue binding, a file
    /// queue at a unique path under the system temp directory.
    ///
    /// Failing to establish the binding is fatal: the manager cannot
    /// exist without a working queue.
    pub fn new() -> Result<Self, ValidationError> {
        let path = std::env::temp_dir().join(format!("steadyrun-{}.queue", uuid::Uuid::now_v7()));
        let queue = FileQueue::new(path)?;
        Ok(Self::with_queue(Arc::new(queue)))
    }

    /// Create a manager over an explicit queue binding.
    pub fn with_queue(queue: Arc<dyn ResponseQueue>) -> Self {
        Self {
            validators: RwLock::new(BTreeMap::new()),
            queue: RwLock::new(queue),
            session: Arc::new(RwLock::new(SessionState::new())),
            shutdown_tx: Mutex::new(None),
            worker: Mutex::new(None),
        }
    }

    /// Register a validator under the given id. A later registration
    /// under an existing id overwrites the earlier one.
    pub fn add_validator(&self, id: impl Into<String>, validator: Arc<dyn MessageValidator>) {
        self.validators.write().insert(id.into(), validator);
    }

    /// Look up a validator by id.
    pub fn get_validator(&self, id: &str) -> Option<Arc<dyn MessageValidator>> {
        self.validators.read().get(id).cloned()
    }

    /// Registered validator ids, key-sorted.
    pub fn validator_ids(&self) -> Vec<String> {
        self.validators.read().keys().cloned().collect()
    }

    /// Rebind the backing queue. Permitted only while no session is
    /// running; the binding is never replaced mid-session.
    pub fn set_queue(&self, queue: Arc<dyn ResponseQueue>) -> Result<(), ValidationError> {
        if !self.is_finished() {
            return Err(ValidationError::ValidationRunning);
        }
        *self.queue.write() = queue;
        Ok(())
    }

    /// Append a captured response for later validation.
    ///
    /// Safe to call concurrently with a draining worker; never blocks on
    /// the consumer.
    pub fn add_to_result_messages(&self, message: ReceivedMessage) -> Result<(), ValidationError> {
        self.queue.read().push(message)
    }

    /// Number of responses waiting for validation. May be approximate
    /// under concurrent access.
    pub fn get_size(&self) -> usize {
        self.queue.read().len()
    }

    /// Start the validation session. Idempotent: a no-op while a worker
    /// is already active.
    #[instrument(skip(self))]
    pub fn start_validation(&self) {
        let mut worker = self.worker.lock();
        {
            let mut session = self.session.write();
            if !session.finished {
                debug!("Validation is already running");
                return;
            }
            session.finished = false;
            session.all_valid = true;
            session.fast_forward = false;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        *self.shutdown_tx.lock() = Some(shutdown_tx);

        let validators = self.validators.read().clone();
        let queue = Arc::clone(&self.queue.read());
        let session = Arc::clone(&self.session);

        *worker = Some(tokio::spawn(run_worker(
            validators,
            queue,
            session,
            shutdown_rx,
        )));
    }

    /// Block until the worker finishes draining the queue.
    ///
    /// Disables the throttling pause for the remainder of the run so the
    /// backlog is gone through quickly. Returns immediately if no worker
    /// was ever started. Worker failures are not delivered here; callers
    /// detect them through [`is_finished`](Self::is_finished) and
    /// [`get_size`](Self::get_size).
    pub async fn wait_for_validation(&self) {
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            self.session.write().fast_forward = true;
            if let Err(e) = handle.await {
                error!("Validation worker task failed: {e}");
            }
        }
    }

    /// Request cooperative cancellation of an active worker. Best-effort:
    /// the queue is not guaranteed to drain and unprocessed responses
    /// stay queued.
    pub fn terminate_now(&self) {
        if let Some(shutdown_tx) = self.shutdown_tx.lock().as_ref() {
            let _ = shutdown_tx.send(true);
        }
    }

    /// Whether the validation session finished (or was never started).
    pub fn is_finished(&self) -> bool {
        self.session.read().finished
    }

    /// Whether validation is enabled.
    pub fn is_enabled(&self) -> bool {
        self.session.read().enabled
    }

    /// Whether every validated response has passed so far.
    pub fn all_messages_valid(&self) -> bool {
        self.session.read().all_valid
    }

    /// Enable or disable validation.
    ///
    /// Enabling is always permitted. Disabling while a session is running
    /// is a programming error and panics; check
    /// [`is_finished`](Self::is_finished) first.
    pub fn set_enabled(&self, enabled: bool) {
        let mut session = self.session.write();
        assert!(
            enabled || session.finished,
            "validation cannot be disabled while the validation is in progress"
        );
        session.enabled = enabled;
    }
}

/// The validation worker: drains the queue until empty or cancelled.
async fn run_worker(
    validators: BTreeMap<String, Arc<dyn MessageValidator>>,
    queue: Arc<dyn ResponseQueue>,
    session: Arc<RwLock<SessionState>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    if validators.is_empty() {
        warn!("No validators set, nothing to validate");
        session.write().finished = true;
        return;
    }

    loop {
        if *shutdown_rx.borrow() {
            debug!("Validation worker cancelled");
            break;
        }

        let received = match queue.pop() {
            Ok(Some(received)) => received,
            Ok(None) => {
                debug!("Validation queue drained");
                break;
            }
            Err(e) => {
                // Deliberately leaves the session non-finished; callers
                // detect the stall through is_finished()/get_size().
                error!("Validation worker cannot read the queue: {e}");
                return;
            }
        };

        let mut message_valid = true;
        for validator_id in received.sent_message().validator_ids() {
            let valid = match validators.get(validator_id) {
                Some(validator) => {
                    let valid = validator.is_valid(received.sent_message(), received.response());
                    trace!(
                        validator_id,
                        response = received.response(),
                        valid,
                        "Validated response"
                    );
                    valid
                }
                None => {
                    // Fail closed so all_valid stays trustworthy.
                    warn!(validator_id, "Message declares an unknown validator");
                    false
                }
            };
            if !valid {
                warn!(
                    validator_id,
                    response = received.response(),
                    "Response failed validation"
                );
            }
            message_valid &= valid;
        }

        if !message_valid {
            session.write().all_valid = false;
        }

        // We do not want to influence the measurement; pause between
        // items unless the run asked to fast-forward through the backlog.
        if !session.read().fast_forward {
            tokio::select! {
                _ = tokio::time::sleep(THROTTLE_PAUSE) => {}
                _ = shutdown_rx.changed() => {
                    debug!("Validation worker cancelled during pause");
                    break;
                }
            }
        }
    }

    let mut state = session.write();
    state.finished = true;
    if state.all_valid {
        info!("The validation worker finished, all messages are valid");
    } else {
        info!("The validation worker finished, there were validation errors");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::InMemoryQueue;
    use steadyrun_core::Message;

    struct AcceptAll;

    impl MessageValidator for AcceptAll {
        fn is_valid(&self, _original: &Message, _response: &str) -> bool {
            true
        }
    }

    fn manager() -> ValidatorManager {
        ValidatorManager::with_queue(Arc::new(InMemoryQueue::new()))
    }

    #[test]
    fn test_new_manager_is_idle_and_disabled() {
        let manager = manager();
        assert!(manager.is_finished());
        assert!(!manager.is_enabled());
        assert!(manager.all_messages_valid());
        assert_eq!(manager.get_size(), 0);
    }

    #[test]
    fn test_registry_lookup_and_overwrite() {
        let manager = manager();
        assert!(manager.get_validator("v").is_none());

        let first: Arc<dyn MessageValidator> = Arc::new(AcceptAll);
        manager.add_validator("v", Arc::clone(&first));
        assert!(manager.get_validator("v").is_some());

        let second: Arc<dyn MessageValidator> = Arc::new(AcceptAll);
        manager.add_validator("v", Arc::clone(&second));
        let got = manager.get_validator("v").unwrap();
        assert!(Arc::ptr_eq(&got, &second));
    }

    #[test]
    fn test_validator_ids_are_sorted() {
        let manager = manager();
        for id in ["zeta", "alpha", "mid"] {
            manager.add_validator(id, Arc::new(AcceptAll));
        }
        assert_eq!(manager.validator_ids(), ["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_queue_rebind_while_idle() {
        let manager = manager();
        manager
            .add_to_result_messages(ReceivedMessage::new(Message::new("a"), "1"))
            .unwrap();
        assert_eq!(manager.get_size(), 1);

        manager.set_queue(Arc::new(InMemoryQueue::new())).unwrap();
        assert_eq!(manager.get_size(), 0);
    }

    #[test]
    fn test_enable_and_disable_while_idle() {
        let manager = manager();
        manager.set_enabled(true);
        assert!(manager.is_enabled());
        manager.set_enabled(false);
        assert!(!manager.is_enabled());
    }

    #[test]
    fn test_default_binding_is_durable() {
        let manager = ValidatorManager::new().unwrap();
        manager
            .add_to_result_messages(ReceivedMessage::new(Message::new("a"), "1"))
            .unwrap();
        assert_eq!(manager.get_size(), 1);
    }
}
