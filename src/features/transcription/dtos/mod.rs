pub mod transcription_dto;

pub use transcription_dto::{CorrectionDto, TranscribeAudioDto, TranscriptionResponseDto};
