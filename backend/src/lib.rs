//! Task and analytics REST API.
//!
//! Requests flow router → [`validation`] middleware → [`handlers`] →
//! [`service`] → [`repository`] → [`store`]. Errors travel back up the same
//! path and are turned into HTTP responses only in [`error`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod repository;
pub mod routes;
pub mod seed;
pub mod service;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod validation;

pub use config::AppConfig;
pub use routes::{app, router};
pub use state::AppState;
