pub mod specialty_handler;

pub use specialty_handler::{__path_list_specialties, list_specialties};
