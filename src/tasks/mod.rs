//! Prompt templates for the three trip-planning tasks
//!
//! Templates live next to this module as markdown files with `{{ name }}`
//! placeholders and are rendered with MiniJinja. Values are inserted as data,
//! so placeholder-like text inside user input is never expanded.

use minijinja::{Environment, UndefinedBehavior, Value, context};

use crate::agents::{Agent, TripAgents};
use crate::models::TripPlan;
use crate::{Result, VacaigentError};

const IDENTIFY_TEMPLATE: &str = include_str!("templates/identify.md");
const GATHER_TEMPLATE: &str = include_str!("templates/gather.md");
const PLAN_TEMPLATE: &str = include_str!("templates/plan.md");

const TIP: &str = "If you do your BEST WORK, I'll tip you $100 and grant you any wish you want!";

/// One unit of work for the crew
#[derive(Debug, Clone)]
pub struct Task {
    /// Short human-readable name used in progress reports
    pub name: &'static str,
    pub description: String,
    pub expected_output: &'static str,
    pub agent: Agent,
    /// Key under which this task's output is made available to later tasks
    pub output_key: &'static str,
    pub depends_on: Vec<&'static str>,
    /// Web search query run before the task when the agent has tools
    pub research_query: Option<String>,
}

impl Task {
    pub fn with_research(mut self, query: impl Into<String>) -> Self {
        self.research_query = Some(query.into());
        self
    }
}

/// Builders for the identify → gather → plan chain
pub struct TripTasks;

impl TripTasks {
    fn validate_inputs(origin: &str, cities: &str, interests: &str, range: &str) -> Result<()> {
        if [origin, cities, interests, range]
            .iter()
            .any(|value| value.trim().is_empty())
        {
            return Err(VacaigentError::validation(
                "All input parameters must be provided",
            ));
        }
        Ok(())
    }

    pub fn identify_task(
        agent: Agent,
        origin: &str,
        cities: &str,
        interests: &str,
        range: &str,
    ) -> Result<Task> {
        Self::validate_inputs(origin, cities, interests, range)?;

        Ok(Task {
            name: "Identify the best city",
            description: render(
                IDENTIFY_TEMPLATE,
                context! { origin, cities, interests, range, tip => TIP },
            )?,
            expected_output: "A professional travel report recommending the best city, \
                with actual flight costs, daily weather forecast, cultural events, \
                specific attractions, hotel options, estimated budget, and reasoning.",
            agent,
            output_key: "chosen_city",
            depends_on: Vec::new(),
            research_query: None,
        })
    }

    pub fn gather_task(agent: Agent, origin: &str, interests: &str, range: &str) -> Result<Task> {
        Ok(Task {
            name: "Gather local insights",
            description: render(GATHER_TEMPLATE, context! { origin, interests, range, tip => TIP })?,
            expected_output: "A professional city guide with cultural insights, hidden gems, \
                food recommendations, events, transportation, budgeting, weather, and \
                practical travel tips.",
            agent,
            output_key: "city_guide",
            depends_on: vec!["chosen_city"],
            research_query: None,
        })
    }

    pub fn plan_task(agent: Agent, origin: &str, interests: &str, range: &str) -> Result<Task> {
        Ok(Task {
            name: "Build the itinerary",
            description: render(PLAN_TEMPLATE, context! { origin, interests, range, tip => TIP })?,
            expected_output: "A complete multi-day travel plan formatted in Markdown, with a \
                per-day schedule, weather forecasts, actual attractions, restaurants, hotels, \
                packing list, safety notes, and a detailed budget breakdown.",
            agent,
            output_key: "final_itinerary",
            depends_on: vec!["chosen_city", "city_guide"],
            research_query: None,
        })
    }

    /// The full task chain for a trip, in execution order
    pub fn for_trip(plan: &TripPlan) -> Result<Vec<Task>> {
        let range = plan.dates.to_string();

        let identify = Self::identify_task(
            TripAgents::city_selection_agent(),
            &plan.origin,
            &plan.destination,
            &plan.interests,
            &range,
        )?
        .with_research(format!(
            "{} weather, events and flights from {} {}",
            plan.destination, plan.origin, range
        ));

        let gather = Self::gather_task(
            TripAgents::local_expert(),
            &plan.origin,
            &plan.interests,
            &range,
        )?
        .with_research(format!(
            "{} hidden gems, local food and things to do for {}",
            plan.destination, plan.interests
        ));

        let itinerary = Self::plan_task(
            TripAgents::travel_concierge(),
            &plan.origin,
            &plan.interests,
            &range,
        )?
        .with_research(format!("{} hotels and average prices {}", plan.destination, range));

        Ok(vec![identify, gather, itinerary])
    }
}

/// Render a task template; unknown variables and syntax errors are rejected
fn render(template: &str, values: Value) -> Result<String> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);

    env.render_str(template, values)
        .map_err(|e| VacaigentError::general(format!("Invalid task template: {e}")))
}
