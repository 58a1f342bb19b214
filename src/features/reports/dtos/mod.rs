pub mod report_dto;

pub use report_dto::{
    CreateReportDto, ExportFormat, ExportQueryParams, RefineReportDto, ReportQueryParams,
    ReportResponseDto, ReportSortField, SortDirection, UpdateReportDto,
};
