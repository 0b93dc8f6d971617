//! HTTP surface of the service.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use server::{AppState, new_router, serve};
