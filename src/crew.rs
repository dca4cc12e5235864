//! Sequential crew runner
//!
//! Tasks run one after another against a single model. Each task sees the
//! outputs of the tasks it depends on, plus whatever its agent's research
//! tools turned up.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument};

use crate::llm::{ChatModel, ChatRequest};
use crate::models::{CrewEvent, ProgressSender, report};
use crate::tasks::Task;
use crate::tools::Toolbox;
use crate::{Result, VacaigentError};

/// Result of a single task
#[derive(Debug, Clone)]
pub struct TaskOutput {
    pub name: String,
    pub agent: String,
    pub output_key: String,
    pub raw: String,
}

/// Result of a whole crew run
#[derive(Debug, Clone)]
pub struct CrewOutput {
    pub model: String,
    pub tasks_output: Vec<TaskOutput>,
}

impl CrewOutput {
    /// Text of the final task
    pub fn raw(&self) -> &str {
        self.tasks_output
            .last()
            .map(|task| task.raw.as_str())
            .unwrap_or_default()
    }
}

impl fmt::Display for CrewOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw())
    }
}

pub struct Crew {
    model: Arc<dyn ChatModel>,
    tasks: Vec<Task>,
    toolbox: Toolbox,
}

impl Crew {
    pub fn new(model: Arc<dyn ChatModel>, tasks: Vec<Task>) -> Self {
        Self {
            model,
            tasks,
            toolbox: Toolbox::default(),
        }
    }

    pub fn with_toolbox(mut self, toolbox: Toolbox) -> Self {
        self.toolbox = toolbox;
        self
    }

    /// Every dependency must name a task that runs earlier
    fn validate_chain(&self) -> Result<()> {
        if self.tasks.is_empty() {
            return Err(VacaigentError::crew("Crew has no tasks"));
        }

        let mut seen = HashSet::new();
        for task in &self.tasks {
            if let Some(missing) = task.depends_on.iter().find(|key| !seen.contains(*key)) {
                return Err(VacaigentError::crew(format!(
                    "Task '{}' depends on '{}', which does not run before it",
                    task.name, missing
                )));
            }
            if !seen.insert(task.output_key) {
                return Err(VacaigentError::crew(format!(
                    "Duplicate task output key '{}'",
                    task.output_key
                )));
            }
        }
        Ok(())
    }

    /// Run all tasks in order and return their outputs
    #[instrument(skip_all, fields(model = self.model.name(), tasks = self.tasks.len()))]
    pub async fn kickoff(&self, progress: Option<&ProgressSender>) -> Result<CrewOutput> {
        self.validate_chain()?;

        let started = Instant::now();
        report(
            progress,
            CrewEvent::CrewStarted {
                model: self.model.name().to_string(),
                tasks: self.tasks.len(),
            },
        );

        let mut outputs: HashMap<&str, String> = HashMap::new();
        let mut tasks_output = Vec::with_capacity(self.tasks.len());

        for task in &self.tasks {
            info!("Executing task: {}", task.name);
            report(
                progress,
                CrewEvent::TaskStarted {
                    task: task.name.to_string(),
                    agent: task.agent.role.to_string(),
                },
            );

            let notes = match (&task.research_query, task.agent.has_tools()) {
                (Some(query), true) => {
                    self.toolbox
                        .research(&task.agent.tools, query, progress)
                        .await
                }
                _ => None,
            };

            let request = ChatRequest {
                system: task.agent.system_prompt(),
                prompt: build_prompt(task, &outputs, notes.as_deref()),
            };
            let raw = self.model.complete(&request).await?;

            report(
                progress,
                CrewEvent::TaskCompleted {
                    task: task.name.to_string(),
                    chars: raw.chars().count(),
                },
            );

            outputs.insert(task.output_key, raw.clone());
            tasks_output.push(TaskOutput {
                name: task.name.to_string(),
                agent: task.agent.role.to_string(),
                output_key: task.output_key.to_string(),
                raw,
            });
        }

        info!(
            "Crew finished {} tasks in {:.1}s",
            tasks_output.len(),
            started.elapsed().as_secs_f64()
        );

        Ok(CrewOutput {
            model: self.model.name().to_string(),
            tasks_output,
        })
    }
}

fn build_prompt(task: &Task, outputs: &HashMap<&str, String>, notes: Option<&str>) -> String {
    let mut prompt = task.description.trim_end().to_string();
    prompt.push_str("\n\nThis is the expected criteria for your final answer: ");
    prompt.push_str(task.expected_output);

    let context: Vec<&str> = task
        .depends_on
        .iter()
        .filter_map(|key| outputs.get(key).map(String::as_str))
        .collect();
    if !context.is_empty() {
        prompt.push_str("\n\nThis is the context you're working with:\n");
        prompt.push_str(&context.join("\n\n----------\n\n"));
    }

    if let Some(notes) = notes {
        prompt.push_str("\n\nResearch notes gathered for this task:\n");
        prompt.push_str(notes);
    }

    prompt
}
