//! Specialty-keyed prompt templates.
//!
//! System prompts (no owner) are shared and admin-managed; user prompts are
//! private to their author. Each scope has at most one default per specialty.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::PromptService;
