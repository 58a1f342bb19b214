//! Generated clinical reports, owned by the user who created them.
//!
//! | Method | Path                        | Notes                      |
//! |--------|-----------------------------|----------------------------|
//! | GET    | /api/reports                | caller's reports, paged    |
//! | POST   | /api/reports                | explicit save              |
//! | GET    | /api/reports/{id}           | owner or admin             |
//! | PUT    | /api/reports/{id}           | partial update             |
//! | DELETE | /api/reports/{id}           | hard delete                |
//! | GET    | /api/reports/{id}/export    | markdown, text or html     |
//! | POST   | /api/reports/{id}/refine    | LLM rewrite of the content |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::ReportService;
