pub mod transcription_handler;

pub use transcription_handler::{__path_transcribe_audio, transcribe_audio};
