//! Web interface module
//!
//! Maps `GET /`, `GET /{key}` and `PUT /{key}` onto the store and renders
//! the results as HTTP responses.

mod server;
mod handlers;

pub use handlers::AppState;
pub use server::{router, run_web_server};
