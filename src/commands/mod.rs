//! CLI command handlers.

mod accounts;
mod action;
mod decode;

pub use accounts::run_accounts_command;
pub use action::run_action_command;
pub use decode::run_decode_command;
