//! HTTP front door over the session store.

pub mod routes;

pub use routes::{ApiState, session_routes};
