pub mod generation_service;
pub mod relay;

pub use generation_service::{GenerationService, PromptResolver};
pub use relay::{GenerationEvent, ReportSink};
