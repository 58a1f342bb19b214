pub mod generation_handler;

pub use generation_handler::{__path_generate_report, generate_report};
