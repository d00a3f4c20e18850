pub mod lesson_ctx;
pub mod lesson_flow;

pub use lesson_ctx::LessonCtx;
pub use lesson_flow::{classify_marker, LessonFlow, MarkerDecision};
