pub mod user_dto;

pub use user_dto::{UpdateProfileDto, UpdateUserRoleDto, UserQueryParams, UserResponseDto};
