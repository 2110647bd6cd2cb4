//! Integration test modules.

pub mod access_tests;
pub mod auth_tests;
pub mod common;
pub mod ticket_tests;
