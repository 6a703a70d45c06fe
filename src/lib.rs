// Library surface for the typing-trial core, shared by the TUI binary and tests.
// The terminal front-end (app.rs, ui.rs) stays in the binary.
pub mod app_dirs;
pub mod config;
pub mod controller;
pub mod error;
pub mod rating;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod stats;
pub mod surface;
pub mod util;
pub mod word_generator;

pub use error::{TrialError, TrialResult};
