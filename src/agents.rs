//! The three crew members and the prompts that define them

use crate::tools::ToolKind;

/// One crew member: a persona plus the research tools it may use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
    pub tools: Vec<ToolKind>,
}

impl Agent {
    /// System instruction sent with every call made on behalf of this agent
    pub fn system_prompt(&self) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}\n\
             Answer with your final, complete result only. Do not describe your process.",
            self.role, self.backstory, self.goal
        )
    }

    pub fn has_tools(&self) -> bool {
        !self.tools.is_empty()
    }
}

/// Factory for the trip-planning crew
pub struct TripAgents;

impl TripAgents {
    pub fn city_selection_agent() -> Agent {
        Agent {
            role: "City Selection Expert",
            goal: "Select the best city based on weather, season, prices and traveler interests",
            backstory: "An expert in analyzing travel data to pick ideal destinations.",
            tools: vec![ToolKind::Search, ToolKind::Scrape],
        }
    }

    pub fn local_expert() -> Agent {
        Agent {
            role: "Local Expert at this city",
            goal: "Provide the BEST insights about the selected city",
            backstory: "A knowledgeable local guide with extensive information about the city, \
                        its attractions and customs.",
            tools: vec![ToolKind::Search, ToolKind::Scrape],
        }
    }

    pub fn travel_concierge() -> Agent {
        Agent {
            role: "Amazing Travel Concierge",
            goal: "Create the most amazing travel itineraries with budget and packing \
                   suggestions for the city",
            backstory: "Specialist in travel planning and logistics with decades of experience.",
            tools: vec![ToolKind::Search],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_carries_persona() {
        let agent = TripAgents::local_expert();
        let prompt = agent.system_prompt();
        assert!(prompt.starts_with("You are Local Expert at this city."));
        assert!(prompt.contains(agent.goal));
        assert!(prompt.contains(agent.backstory));
    }

    #[test]
    fn test_tool_assignment() {
        assert!(TripAgents::city_selection_agent().tools.contains(&ToolKind::Scrape));
        assert_eq!(TripAgents::travel_concierge().tools, vec![ToolKind::Search]);
    }
}
