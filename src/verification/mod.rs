//! Verification module - Checkpoint scoring and completion tracking
//!
//! - engine: scores submissions and writes the attempt log
//! - tracker: monotonic per-user completion state

mod engine;
mod tracker;

pub use engine::{
    feedback_message, Verdict, VerificationEngine, ALREADY_PASSED_CORRECT, ALREADY_PASSED_INCORRECT,
    INCORRECT_TRY_AGAIN,
};
pub use tracker::CompletionTracker;
