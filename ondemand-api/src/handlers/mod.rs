// Handlers module - one file per trigger
pub mod events;
pub mod start;
pub mod status;
pub mod urls;
