pub mod auth;
pub mod generation;
pub mod prompts;
pub mod reports;
pub mod specialties;
pub mod transcription;
pub mod users;
