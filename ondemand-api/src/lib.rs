// Library entry point for tests and the binary.

pub mod api_docs;
pub mod app;
pub mod handlers;
pub mod routes;

pub use app::AppState;
