pub mod toml_loader;

pub use toml_loader::{load_all_scenario_documents, load_scenario_document};
