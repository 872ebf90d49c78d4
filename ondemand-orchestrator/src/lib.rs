// Core lifecycle logic for the on-demand instance: status derivation, start-on-demand,
// address (re)association and URL publication. Every entry point is a stateless
// invocation that re-reads provider truth.

pub mod address_binder;
pub mod address_binder_job;
pub mod capacity_controller;
pub mod clock;
pub mod config;
pub mod error;
pub mod logger;
pub mod notifier;
pub mod provider_manager;
pub mod services;
pub mod status_reconciler;
pub mod url_publisher;

pub use config::Config;
pub use error::ControlError;
pub use services::Services;
