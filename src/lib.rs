//! `VacAIgent` - trip planning with a crew of LLM agents
//!
//! A trip request (origin, destination, dates, interests) is turned into three
//! chained tasks: pick the city, gather local knowledge, build the itinerary.
//! Each task runs against a hosted chat model, optionally backed by web search
//! and page scraping, and the final task's answer is the itinerary.

pub mod agents;
pub mod api;
pub mod config;
pub mod crew;
pub mod error;
pub mod http_client;
pub mod llm;
pub mod models;
pub mod planner;
pub mod settings;
pub mod tasks;
pub mod telemetry;
pub mod tools;
pub mod ui;
pub mod web;

// Re-export core types for public API
pub use agents::{Agent, TripAgents};
pub use api::AppState;
pub use config::VacaigentConfig;
pub use crew::{Crew, CrewOutput, TaskOutput};
pub use error::VacaigentError;
pub use llm::{ChatModel, ChatRequest, ModelSpec, Provider};
pub use models::{CrewEvent, DateRange, TripPlan, TripRequest, TripResponse};
pub use planner::{CrewPlanner, FallbackPlanner, Planners, TripPlanner};
pub use settings::Settings;
pub use tasks::{Task, TripTasks};
pub use tools::Toolbox;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, VacaigentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
