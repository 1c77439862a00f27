//! # System Interaction Layer
//!
//! Everything that touches processes and interpreters lives here, behind small types that
//! the project operations can be tested against.
//!
//! ## Modules
//!
//! - **`executor`**: spawns external commands, either streaming to the terminal or buffering
//!   their output behind a spinner, and turns non-zero exits into `ExecutionError`s.
//! - **`environment`**: describes the host interpreter or a project virtual environment and
//!   builds invocations that run inside it.
//! - **`progress`**: the spinner shown while output is buffered.
//! - **`prompt`**: the `Prompter` seam every menu and question goes through.

pub mod environment;
pub mod executor;
pub mod progress;
pub mod prompt;

#[cfg(test)]
pub(crate) mod testing;
