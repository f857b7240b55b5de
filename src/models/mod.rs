pub mod action;
pub mod document;
pub mod loaders;
pub mod message;
pub mod scenario;
pub mod score;
pub mod state;
pub mod trigger;

pub use action::{Action, Condition, ParseError, RawInvocation};
pub use document::{QuestionSpec, ScenarioDocument};
pub use loaders::{load_all_scenario_documents, load_scenario_document};
pub use message::{MessageBoard, MessageRange};
pub use scenario::{RawScenario, RawScenarioTable, ScenarioTable, Step};
pub use score::Score;
pub use state::{ColorMode, WidgetState};
pub use trigger::Button;
