//! User accounts.
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | PATCH | `/api/users/me` | Update own display name |
//! | GET | `/api/admin/users` | List users (admin) |
//! | PATCH | `/api/admin/users/{id}/role` | Change a user's role (admin) |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::UserService;
