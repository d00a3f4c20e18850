pub mod lesson;
pub mod loaders;
pub mod outcome;
pub mod progress;
pub mod record;
pub mod source;

pub use lesson::{LessonItem, LessonOutcome, LessonResult};
pub use loaders::{open_record_source, TomlRecordSource, XlsxRecordSource};
pub use outcome::{RecordOutcome, RecordStatus, RunSummary};
pub use progress::{progress_channel, ProgressEvent, ProgressReceiver, ProgressSender};
pub use record::{format_portal_date, parse_date_text, Record};
pub use source::{InMemoryRecordSource, RecordSource, SourceRow};
