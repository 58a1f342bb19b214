pub mod user_handler;

pub use user_handler::{
    __path_list_users, __path_update_me, __path_update_user_role, list_users, update_me,
    update_user_role,
};
