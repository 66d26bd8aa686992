//! HTTP surface: configuration, router, middleware, error rendering and
//! shutdown control.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod module;
pub mod shutdown;

pub use config::*;
pub use error::{HttpError, HttpResult};
pub use handlers::AppState;
pub use module::{router, NetworkModule};
pub use shutdown::*;
