//! HTTP/REST API adapter.
//!
//! Inbound adapter exposing the market API, session context and the quote
//! stream upgrade under `/api/markets`.

mod controller;
mod error;
mod request;
mod response;
mod server;

pub use controller::{AppState, create_router};
pub use error::ApiError;
pub use request::*;
pub use response::*;
pub use server::{HttpServer, ServerError};
