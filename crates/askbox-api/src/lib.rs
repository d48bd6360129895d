pub mod auth;
pub mod error;
pub mod middleware;
pub mod oauth;
pub mod questions;
pub mod relay_auth;
pub mod routes;
pub mod state;
pub mod users;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, AppStateInner};
