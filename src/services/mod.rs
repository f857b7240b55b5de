pub mod context_store;
pub mod readiness;
pub mod scorm_reporter;
pub mod timer;

pub use context_store::{
    context_id, ActionHistory, ContextStore, ContextTtl, JsonFileContextStore, MemoryContextStore,
};
pub use readiness::{wait_until, PollOutcome, PollPolicy};
pub use scorm_reporter::ScormReporter;
pub use timer::{format_timer, QuizTimer, TickOutcome, TimerMode};
