pub mod log_sink;
pub mod portal_service;
pub mod record_filter;
pub mod selectors;

pub use log_sink::{FileLogSink, LogEntry, LogSink, MemoryLogSink};
pub use portal_service::{AbsenceForm, PortalService};
pub use record_filter::{is_admitted, RecordFilter};
