//! Binary-side orchestration: settings resolution, progress UI, exit codes.

pub(crate) mod exit_handler;
pub(crate) mod progress;
pub(crate) mod settings;
pub(crate) mod terminal;
