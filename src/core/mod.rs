//! Core types shared by every operation.
//!
//! - [`error`]: the [`AggregateError`] taxonomy, [`ErrorContext`] and
//!   [`user_friendly_error`], which turn any failure into a report with a
//!   suggestion on how to move forward.
//! - [`execution_context`]: the [`ExecutionContext`] threaded through a run,
//!   holding output preferences and the external command and prompt
//!   capabilities.

pub mod error;
pub mod execution_context;

pub use error::{AggregateError, ErrorContext, user_friendly_error};
pub use execution_context::{Answer, ExecutionContext, Prompter, StdinPrompter};
