//! Gadget bot server.
//!
//! Receives Slack Events API and slash command webhooks, routes them
//! through the `gadget-core` dispatcher and runs the built-in plugins:
//! - group management and permission-denied replies
//! - user lookup, dice, magic 8-ball and help

pub mod api;
pub mod config;
pub mod error;
pub mod plugins;

pub use config::Config;
pub use error::{ApiError, AppError, AppResult};
pub use plugins::{register_all, PluginContext};
