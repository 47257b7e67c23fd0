//! Test infrastructure for graphmark
//!
//! Provides in-memory runners, failure injection and a fixed resource probe,
//! so the harness pipeline can be exercised without a live database.

pub mod shared_state;
pub mod mock_runner;
pub mod failing_runner;
pub mod helpers;

pub use shared_state::{Call, CallLog};
pub use mock_runner::MockRunner;
pub use failing_runner::FailingRunner;
pub use helpers::{batch_size, fast_settings, tiny_scale, FixedProbe};
