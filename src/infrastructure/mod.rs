pub mod lms_bridge;
pub mod memory_quiz;
pub mod quiz_adapter;

pub use lms_bridge::{LmsBridge, MemoryLms, ScormVersion};
pub use memory_quiz::{AnswerView, MemoryQuiz};
pub use quiz_adapter::QuizAdapter;
