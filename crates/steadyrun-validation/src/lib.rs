//! Asynchronous response validation, decoupled from the measurement path.
//!
//! Every captured response is appended to a durable FIFO queue on the
//! send path (fire-and-forget, never blocking on the consumer) and later
//! validated by a single cancellable background worker that drains the
//! queue at a throttled pace so validation cost cannot bias timing
//! results.
//!
//! ```text
//! send path ──▶ add_to_result_messages ──▶ ResponseQueue (durable FIFO)
//!                                               │ pop
//!                                               ▼
//!                                     validation worker (tokio task)
//!                                      resolves validator ids, AND-
//!                                      reduces verdicts, 500 ms pause
//!                                      between items unless fast-forward
//! ```

pub mod error;
pub mod manager;
pub mod queue;
pub mod validator;

pub use error::ValidationError;
pub use manager::ValidatorManager;
pub use queue::{FileQueue, InMemoryQueue, ResponseQueue};
pub use validator::MessageValidator;
