//! Progress streaming over SSE and WebSocket

use std::convert::Infallible;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::{
        Response,
        sse::{Event, KeepAlive, Sse},
    },
    Json,
};
use futures::{Sink, SinkExt, Stream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::{AppState, validate_request};
use crate::Result;
use crate::models::{TripPlan, TripRequest};
use crate::planner::TripPlanner;

/// Canned messages replayed on `/ws/stream`
pub const WS_MESSAGES: [&str; 6] = [
    "🔍 Querying travel recommendations...",
    "🧠 Analyzing your preferences...",
    "📅 Optimizing itinerary...",
    "💰 Estimating budget...",
    "🏖️ Selecting top experiences...",
    "✅ Plan ready to deliver!",
];

pub(super) async fn stream_trip(
    State(state): State<AppState>,
    Json(request): Json<TripRequest>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let trip = validate_request(&state.settings, request)?;
    let delay = Duration::from_millis(state.stream.sse_step_delay_ms);

    Ok(Sse::new(progress_events(state.planner.clone(), trip, delay))
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

/// `Event::data` rejects carriage returns
fn data_event(text: &str) -> Event {
    Event::default().data(text.replace('\r', ""))
}

/// Aborts the spawned run when the owning stream is dropped
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Preamble lines, crew progress, the itinerary and a final `done` event.
/// Failures are reported inline; the stream always ends with `done`.
/// Dropping the stream (client disconnect) cancels the crew run.
pub fn progress_events(
    planner: Arc<dyn TripPlanner>,
    trip: TripPlan,
    step_delay: Duration,
) -> impl Stream<Item = std::result::Result<Event, Infallible>> {
    async_stream::stream! {
        let preamble = [
            "🤖 Initializing trip planning system...".to_string(),
            format!("🌍 Gathering information for {}...", trip.destination),
            "🧭 Analyzing preferences and constraints...".to_string(),
            "✈️ Generating optimized itinerary using AI agents...".to_string(),
        ];
        for line in &preamble {
            yield Ok(data_event(line));
            tokio::time::sleep(step_delay).await;
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let run = tokio::spawn(async move { planner.plan(&trip, Some(&tx)).await });
        let mut run = AbortOnDrop(run);

        // Ends once the run drops its sender
        while let Some(event) = rx.recv().await {
            yield Ok(data_event(&event.to_string()));
        }

        match (&mut run.0).await {
            Ok(Ok(output)) => {
                yield Ok(data_event("✅ Trip planning complete!"));
                yield Ok(data_event(&output.to_string()));
            }
            Ok(Err(e)) => {
                error!("Streamed trip planning failed: {}", e);
                yield Ok(data_event(&format!("❌ Error: {e}")));
            }
            Err(e) => {
                error!("Trip planning task aborted: {}", e);
                yield Ok(data_event(&format!("❌ Error: {e}")));
            }
        }

        yield Ok(Event::default().event("done").data("[DONE]"));
    }
}

pub(super) async fn ws_stream(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let interval = Duration::from_millis(state.stream.ws_interval_ms);
    ws.on_upgrade(move |socket: WebSocket| replay_progress(socket, interval))
}

/// Send the canned messages one per `interval`, then close
pub async fn replay_progress<S>(mut sink: S, interval: Duration)
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let mut failure = None;
    for text in WS_MESSAGES {
        if let Err(e) = sink.send(Message::Text(text.into())).await {
            failure = Some(e.to_string());
            break;
        }
        tokio::time::sleep(interval).await;
    }

    if let Some(e) = failure {
        warn!("WebSocket send failed: {}", e);
        let _ = sink
            .send(Message::Text(format!("❌ WebSocket error: {e}").into()))
            .await;
    }

    let _ = sink.send(Message::Close(None)).await;
    if let Err(e) = sink.close().await {
        debug!("WebSocket close: {}", e);
    }
}
