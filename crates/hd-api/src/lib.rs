//! # hd-api
//!
//! HTTP portal for the campus helpdesk.
//!
//! Public pages let students file and search tickets. Staff pages sit behind
//! session guards that consult the [`hd_core::SessionGate`] before a handler
//! runs.

pub mod auth;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod sessions;
pub mod state;
pub mod web;

pub use error::ApiError;
pub use server::{ApiServer, ApiServerConfig};
pub use sessions::PortalSessionStore;
pub use state::{AppState, GateSettings};
