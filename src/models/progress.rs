use std::fmt;
use std::io::{self, Write};

use serde::Serialize;
use tokio::sync::mpsc;

/// Per-run channel for progress events
pub type ProgressSender = mpsc::UnboundedSender<CrewEvent>;

/// Something worth telling the user while a crew is running
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrewEvent {
    CrewStarted { model: String, tasks: usize },
    TaskStarted { task: String, agent: String },
    ToolUsed { tool: String, input: String },
    ToolFailed { tool: String, error: String },
    TaskCompleted { task: String, chars: usize },
    ProviderSwitched { from: String, to: String, reason: String },
}

impl fmt::Display for CrewEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrewEvent::CrewStarted { model, tasks } => {
                write!(f, "🚀 Crew started with {tasks} tasks on {model}")
            }
            CrewEvent::TaskStarted { task, agent } => {
                write!(f, "🧠 {agent} is working on '{task}'")
            }
            CrewEvent::ToolUsed { tool, input } => write!(f, "🔎 {tool}: {input}"),
            CrewEvent::ToolFailed { tool, error } => {
                write!(f, "⚠️ {tool} failed, continuing without it: {error}")
            }
            CrewEvent::TaskCompleted { task, chars } => {
                write!(f, "📝 Finished '{task}' ({chars} characters)")
            }
            CrewEvent::ProviderSwitched { from, to, reason } => {
                write!(f, "🪄 {from} failed ({reason}); switching to {to}")
            }
        }
    }
}

/// Send an event if anyone is listening. A closed channel is not an error.
pub fn report(progress: Option<&ProgressSender>, event: CrewEvent) {
    tracing::debug!(%event, "crew progress");
    if let Some(sender) = progress {
        let _ = sender.send(event);
    }
}

/// Write each event on its own line until every sender is gone
pub async fn print_progress<W: Write>(
    mut progress: mpsc::UnboundedReceiver<CrewEvent>,
    mut out: W,
) -> io::Result<W> {
    while let Some(event) = progress.recv().await {
        writeln!(out, "{event}")?;
    }
    out.flush()?;
    Ok(out)
}
