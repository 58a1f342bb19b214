pub mod report_handler;

pub use report_handler::{
    __path_create_report, __path_delete_report, __path_export_report, __path_get_report,
    __path_list_reports, __path_refine_report, __path_update_report, create_report,
    delete_report, export_report, get_report, list_reports, refine_report, update_report,
};
