pub mod prompt_dto;

pub use prompt_dto::{
    CreatePromptDto, PromptQueryParams, PromptResponseDto, PromptScope, UpdatePromptDto,
};
