//! HTTP surface for the chat pipeline.
//!
//! Two endpoints: `POST /v1/chat` streams a grounded answer as
//! server-sent events, `POST /v1/search` returns a JSON result set.

pub mod error;
pub mod routes;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use routes::{create_router, AppState};
pub use server::run;
