use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::VacaigentError;

/// Trip parameters as submitted by a client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRequest {
    /// Where the traveler currently is, e.g. "Bangalore, India"
    pub origin: String,
    /// Destination city and country, e.g. "Krabi, Thailand"
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Interests and trip details in free text
    pub interests: String,
}

/// A validated travel window; `end` is strictly after `start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, VacaigentError> {
        if end <= start {
            return Err(VacaigentError::validation(
                "End date must be after start date",
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of nights between the two dates
    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Everything the crew needs for one run
#[derive(Debug, Clone)]
pub struct TripPlan {
    pub origin: String,
    pub destination: String,
    pub dates: DateRange,
    pub interests: String,
}

impl TryFrom<TripRequest> for TripPlan {
    type Error = VacaigentError;

    fn try_from(request: TripRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            dates: DateRange::new(request.start_date, request.end_date)?,
            origin: request.origin,
            destination: request.destination,
            interests: request.interests,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Envelope returned by the plan-trip endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripResponse {
    pub status: ResponseStatus,
    pub message: String,
    pub itinerary: Option<String>,
    pub error: Option<String>,
}

impl TripResponse {
    pub fn success(itinerary: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: "Trip plan generated successfully".to_string(),
            itinerary: Some(itinerary.into()),
            error: None,
        }
    }

    pub fn failure(error: impl fmt::Display) -> Self {
        let mut text = error.to_string();
        if text.trim().is_empty() {
            text = "Unknown error".to_string();
        }
        Self {
            status: ResponseStatus::Error,
            message: "Failed to generate trip plan".to_string(),
            itinerary: None,
            error: Some(text),
        }
    }
}
