/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

/// Interval between SSE keep-alive comments on generation streams
pub const SSE_KEEP_ALIVE_SECS: u64 = 15;

/// Buffered events between the upstream pump and the client stream
pub const GENERATION_CHANNEL_CAPACITY: usize = 64;

/// Longest report title derived from generated content
pub const MAX_DERIVED_TITLE_CHARS: usize = 120;

/// Upper bound on a prompt template body
pub const MAX_PROMPT_CONTENT_CHARS: u64 = 50_000;

/// Upper bound on a report body
pub const MAX_REPORT_CONTENT_CHARS: u64 = 200_000;
