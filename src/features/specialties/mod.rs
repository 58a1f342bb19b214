//! Fixed registry of medical specialties that prompts and reports are keyed by.

pub mod handlers;
pub mod registry;
pub mod routes;
