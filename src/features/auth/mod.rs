mod validator;

pub mod dtos;
pub mod guards;
pub mod handlers;
pub mod model;
pub mod routes;
pub mod services;

pub use services::{AuthService, TokenService};
pub use validator::JwtValidator;
