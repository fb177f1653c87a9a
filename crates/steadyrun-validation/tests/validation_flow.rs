//! End-to-end validation sessions: worker lifecycle, cancellation,
//! verdict accumulation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use steadyrun_core::{Message, ReceivedMessage};
use steadyrun_validation::{InMemoryQueue, MessageValidator, ValidatorManager};

/// Accepts exactly one payload and counts every invocation.
struct CountingValidator {
    accepts: &'static str,
    invocations: AtomicUsize,
}

impl CountingValidator {
    fn new(accepts: &'static str) -> Arc<Self> {
        Arc::new(Self {
            accepts,
            invocations: AtomicUsize::new(0),
        })
    }

    fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

impl MessageValidator for CountingValidator {
    fn is_valid(&self, _original: &Message, response: &str) -> bool {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        response == self.accepts
    }
}

/// Records the id it was registered under each time it runs.
struct OrderRecordingValidator {
    id: &'static str,
    order: Arc<Mutex<Vec<&'static str>>>,
}

impl MessageValidator for OrderRecordingValidator {
    fn is_valid(&self, _original: &Message, _response: &str) -> bool {
        self.order.lock().push(self.id);
        true
    }
}

fn manager() -> ValidatorManager {
    ValidatorManager::with_queue(Arc::new(InMemoryQueue::new()))
}

fn response_with(validator_id: &str, response: &str) -> ReceivedMessage {
    ReceivedMessage::new(Message::new("request").with_validator(validator_id), response)
}

#[test_log::test(tokio::test)]
async fn single_invalid_response_flips_all_valid_permanently() {
    let manager = manager();
    let validator = CountingValidator::new("OK");
    manager.add_validator("ok-check", Arc::clone(&validator) as Arc<dyn MessageValidator>);

    for response in ["OK", "OK", "FAIL"] {
        manager
            .add_to_result_messages(response_with("ok-check", response))
            .unwrap();
    }

    manager.start_validation();
    assert!(!manager.is_finished());
    manager.wait_for_validation().await;

    assert!(manager.is_finished());
    assert!(!manager.all_messages_valid());
    assert_eq!(validator.invocations(), 3);
    assert_eq!(manager.get_size(), 0);
}

#[test_log::test(tokio::test)]
async fn every_queued_item_is_processed_exactly_once() {
    let manager = manager();
    let validator = CountingValidator::new("OK");
    manager.add_validator("ok-check", Arc::clone(&validator) as Arc<dyn MessageValidator>);

    for _ in 0..20 {
        manager
            .add_to_result_messages(response_with("ok-check", "OK"))
            .unwrap();
    }

    manager.start_validation();
    manager.wait_for_validation().await;

    assert_eq!(validator.invocations(), 20);
    assert!(manager.all_messages_valid());
    assert_eq!(manager.get_size(), 0);
}

#[test_log::test(tokio::test)]
async fn validators_run_in_declaration_order_not_registry_order() {
    let manager = manager();
    let order = Arc::new(Mutex::new(Vec::new()));
    for id in ["alpha", "zeta"] {
        manager.add_validator(
            id,
            Arc::new(OrderRecordingValidator {
                id,
                order: Arc::clone(&order),
            }),
        );
    }

    // Declared zeta first; the registry sorts keys but invocation must
    // follow the declaration on the message.
    let message = Message::new("request")
        .with_validator("zeta")
        .with_validator("alpha");
    manager
        .add_to_result_messages(ReceivedMessage::new(message, "anything"))
        .unwrap();

    manager.start_validation();
    manager.wait_for_validation().await;

    assert_eq!(*order.lock(), ["zeta", "alpha"]);
}

#[test_log::test(tokio::test)]
async fn empty_registry_exits_immediately_without_draining() {
    let manager = manager();
    for _ in 0..2 {
        manager
            .add_to_result_messages(response_with("nobody", "x"))
            .unwrap();
    }

    manager.start_validation();
    manager.wait_for_validation().await;

    assert!(manager.is_finished());
    assert!(manager.all_messages_valid());
    assert_eq!(manager.get_size(), 2);
}

#[test_log::test(tokio::test)]
async fn wait_without_a_started_worker_returns_immediately() {
    let manager = manager();
    manager.wait_for_validation().await;
    assert!(manager.is_finished());
}

#[test_log::test(tokio::test)]
async fn terminate_now_is_best_effort_and_not_an_error() {
    let manager = manager();
    let validator = CountingValidator::new("OK");
    manager.add_validator("ok-check", Arc::clone(&validator) as Arc<dyn MessageValidator>);

    for _ in 0..5 {
        manager
            .add_to_result_messages(response_with("ok-check", "OK"))
            .unwrap();
    }

    manager.start_validation();
    // Let the worker get into the throttling pause after the first item.
    tokio::time::sleep(Duration::from_millis(100)).await;
    manager.terminate_now();
    manager.wait_for_validation().await;

    assert!(manager.is_finished());
    // Cancellation is silent and leaves the backlog queued.
    assert!(manager.get_size() >= 1);
    assert!(manager.all_messages_valid());
}

#[test_log::test(tokio::test)]
async fn start_validation_is_idempotent() {
    let manager = manager();
    let validator = CountingValidator::new("OK");
    manager.add_validator("ok-check", Arc::clone(&validator) as Arc<dyn MessageValidator>);

    for _ in 0..3 {
        manager
            .add_to_result_messages(response_with("ok-check", "OK"))
            .unwrap();
    }

    manager.start_validation();
    manager.start_validation();
    manager.wait_for_validation().await;

    assert_eq!(validator.invocations(), 3);
}

#[test_log::test(tokio::test)]
async fn items_added_while_running_are_picked_up() {
    let manager = manager();
    let validator = CountingValidator::new("OK");
    manager.add_validator("ok-check", Arc::clone(&validator) as Arc<dyn MessageValidator>);

    manager
        .add_to_result_messages(response_with("ok-check", "OK"))
        .unwrap();
    manager.start_validation();

    // The worker pauses between items; appends during the pause land in
    // the same session.
    manager
        .add_to_result_messages(response_with("ok-check", "OK"))
        .unwrap();
    manager.wait_for_validation().await;

    assert_eq!(validator.invocations(), 2);
    assert_eq!(manager.get_size(), 0);
}

#[test_log::test(tokio::test)]
async fn unknown_validator_id_counts_as_invalid() {
    let manager = manager();
    manager.add_validator("present", CountingValidator::new("OK"));

    manager
        .add_to_result_messages(response_with("missing", "OK"))
        .unwrap();

    manager.start_validation();
    manager.wait_for_validation().await;

    assert!(!manager.all_messages_valid());
}

#[test_log::test(tokio::test)]
async fn queue_rebind_is_rejected_while_running() {
    let manager = manager();
    let validator = CountingValidator::new("OK");
    manager.add_validator("ok-check", Arc::clone(&validator) as Arc<dyn MessageValidator>);

    for _ in 0..3 {
        manager
            .add_to_result_messages(response_with("ok-check", "OK"))
            .unwrap();
    }

    manager.start_validation();
    let result = manager.set_queue(Arc::new(InMemoryQueue::new()));
    assert!(result.is_err());

    manager.wait_for_validation().await;
    assert!(manager.set_queue(Arc::new(InMemoryQueue::new())).is_ok());
}

#[test_log::test(tokio::test)]
#[should_panic(expected = "cannot be disabled")]
async fn disabling_while_running_is_a_contract_violation() {
    let manager = manager();
    manager.add_validator("ok-check", CountingValidator::new("OK"));
    for _ in 0..3 {
        manager
            .add_to_result_messages(response_with("ok-check", "OK"))
            .unwrap();
    }

    manager.start_validation();
    manager.set_enabled(false);
}

#[test_log::test(tokio::test)]
async fn restarting_after_a_session_resets_the_verdict() {
    let manager = manager();
    let validator = CountingValidator::new("OK");
    manager.add_validator("ok-check", Arc::clone(&validator) as Arc<dyn MessageValidator>);

    manager
        .add_to_result_messages(response_with("ok-check", "FAIL"))
        .unwrap();
    manager.start_validation();
    manager.wait_for_validation().await;
    assert!(!manager.all_messages_valid());

    manager
        .add_to_result_messages(response_with("ok-check", "OK"))
        .unwrap();
    manager.start_validation();
    manager.wait_for_validation().await;
    assert!(manager.all_messages_valid());
}
