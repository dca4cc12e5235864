//! Data models for the `VacAIgent` service
//!
//! - Trip: request/response envelopes and the validated travel window
//! - Progress: events emitted while a crew is running

pub mod progress;
pub mod trip;

// Re-export all public types for convenient access
pub use progress::{CrewEvent, ProgressSender, print_progress, report};
pub use trip::{DateRange, ResponseStatus, TripPlan, TripRequest, TripResponse};
