pub mod action_registry;
pub mod quiz_widget;
pub mod scenario_runner;
pub mod widget_ctx;

pub use action_registry::{ActionHandler, ActionRegistry, ActionScope, Flow};
pub use quiz_widget::QuizWidget;
pub use scenario_runner::{RunReport, ScenarioInterpreter};
pub use widget_ctx::WidgetContext;
