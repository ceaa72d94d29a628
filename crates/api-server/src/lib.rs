#![warn(clippy::unwrap_used)]

pub mod error;
pub mod rest;
pub mod server;
pub mod swagger;

pub use error::ApiError;
pub use server::{router, ApiServer};
pub use swagger::ApiDoc;
