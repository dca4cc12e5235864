//! Trip planners: build and run a crew for one trip, optionally with a
//! second model to fall back on.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::config::VacaigentConfig;
use crate::crew::{Crew, CrewOutput};
use crate::llm::{self, ModelSpec};
use crate::models::{CrewEvent, ProgressSender, TripPlan, report};
use crate::settings::Settings;
use crate::tasks::TripTasks;
use crate::tools::Toolbox;
use crate::{Result, VacaigentError};

#[async_trait]
pub trait TripPlanner: Send + Sync {
    /// Model handle, e.g. `gemini/gemini-2.5-flash`
    fn name(&self) -> &str;

    async fn plan(&self, trip: &TripPlan, progress: Option<&ProgressSender>) -> Result<CrewOutput>;
}

/// Runs the identify → gather → plan crew against one model
pub struct CrewPlanner {
    spec: ModelSpec,
    handle: String,
    settings: Arc<Settings>,
    config: Arc<VacaigentConfig>,
}

impl CrewPlanner {
    pub fn new(spec: ModelSpec, settings: Arc<Settings>, config: Arc<VacaigentConfig>) -> Self {
        Self {
            handle: spec.to_string(),
            spec,
            settings,
            config,
        }
    }
}

#[async_trait]
impl TripPlanner for CrewPlanner {
    fn name(&self) -> &str {
        &self.handle
    }

    #[instrument(skip_all, fields(model = %self.handle, destination = %trip.destination))]
    async fn plan(&self, trip: &TripPlan, progress: Option<&ProgressSender>) -> Result<CrewOutput> {
        let tasks = TripTasks::for_trip(trip)?;
        let model = llm::build_model(&self.spec, &self.settings, &self.config.llm)?;
        let toolbox = Toolbox::from_settings(&self.settings, &self.config.tools)?;

        Crew::new(model, tasks)
            .with_toolbox(toolbox)
            .kickoff(progress)
            .await
    }
}

/// Tries `primary`, then the whole run once more on `secondary`
pub struct FallbackPlanner {
    primary: Arc<dyn TripPlanner>,
    secondary: Arc<dyn TripPlanner>,
}

impl FallbackPlanner {
    pub fn new(primary: Arc<dyn TripPlanner>, secondary: Arc<dyn TripPlanner>) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl TripPlanner for FallbackPlanner {
    fn name(&self) -> &str {
        self.primary.name()
    }

    async fn plan(&self, trip: &TripPlan, progress: Option<&ProgressSender>) -> Result<CrewOutput> {
        let primary_err = match self.primary.plan(trip, progress).await {
            Ok(output) => return Ok(output),
            Err(e) => e,
        };

        warn!(
            "{} failed: {}. Retrying with {}",
            self.primary.name(),
            primary_err,
            self.secondary.name()
        );
        report(
            progress,
            CrewEvent::ProviderSwitched {
                from: self.primary.name().to_string(),
                to: self.secondary.name().to_string(),
                reason: primary_err.to_string(),
            },
        );

        match self.secondary.plan(trip, progress).await {
            Ok(output) => {
                info!("Fallback model {} succeeded", self.secondary.name());
                Ok(output)
            }
            Err(fallback_err) => Err(VacaigentError::Fallback {
                primary_model: self.primary.name().to_string(),
                fallback_model: self.secondary.name().to_string(),
                primary: Box::new(primary_err),
                fallback: Box::new(fallback_err),
            }),
        }
    }
}

/// Planners used by the service: the primary model alone, and the primary
/// backed by the fallback model
pub struct Planners {
    pub primary: Arc<dyn TripPlanner>,
    pub with_fallback: Arc<dyn TripPlanner>,
}

impl Planners {
    pub fn from_config(settings: Arc<Settings>, config: Arc<VacaigentConfig>) -> Result<Self> {
        let primary_spec: ModelSpec = config.llm.primary_model.parse()?;
        let fallback_spec: ModelSpec = config.llm.fallback_model.parse()?;

        let primary: Arc<dyn TripPlanner> = Arc::new(CrewPlanner::new(
            primary_spec,
            settings.clone(),
            config.clone(),
        ));
        let secondary: Arc<dyn TripPlanner> =
            Arc::new(CrewPlanner::new(fallback_spec, settings, config));

        Ok(Self {
            with_fallback: Arc::new(FallbackPlanner::new(primary.clone(), secondary)),
            primary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crew::TaskOutput;
    use crate::models::DateRange;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    struct StubPlanner {
        name: &'static str,
        answer: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl StubPlanner {
        fn ok(name: &'static str, answer: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                answer: Some(answer),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                answer: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TripPlanner for StubPlanner {
        fn name(&self) -> &str {
            self.name
        }

        async fn plan(&self, _trip: &TripPlan, _progress: Option<&ProgressSender>) -> Result<CrewOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.answer {
                Some(raw) => Ok(CrewOutput {
                    model: self.name.to_string(),
                    tasks_output: vec![TaskOutput {
                        name: "plan".into(),
                        agent: "Amazing Travel Concierge".into(),
                        output_key: "itinerary".into(),
                        raw: raw.to_string(),
                    }],
                }),
                None => Err(VacaigentError::llm(self.name, "rate limited")),
            }
        }
    }

    fn trip() -> TripPlan {
        TripPlan {
            origin: "Bangalore".into(),
            destination: "Krabi".into(),
            dates: DateRange::new(
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 7).unwrap(),
            )
            .unwrap(),
            interests: "beaches".into(),
        }
    }

    #[tokio::test]
    async fn test_primary_success_skips_secondary() {
        let primary = StubPlanner::ok("gemini/a", "from primary");
        let secondary = StubPlanner::ok("openai/b", "from secondary");
        let planner = FallbackPlanner::new(primary.clone(), secondary.clone());

        let output = planner.plan(&trip(), None).await.unwrap();
        assert_eq!(output.to_string(), "from primary");
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_primary_failure_uses_secondary() {
        let primary = StubPlanner::failing("gemini/a");
        let secondary = StubPlanner::ok("openai/b", "from secondary");
        let planner = FallbackPlanner::new(primary.clone(), secondary.clone());

        let (tx, mut rx) = mpsc::unbounded_channel();
        let output = planner.plan(&trip(), Some(&tx)).await.unwrap();
        assert_eq!(output.to_string(), "from secondary");
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 1);

        match rx.recv().await {
            Some(CrewEvent::ProviderSwitched { from, to, .. }) => {
                assert_eq!(from, "gemini/a");
                assert_eq!(to, "openai/b");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_both_failures_name_both_models() {
        let planner = FallbackPlanner::new(
            StubPlanner::failing("gemini/a"),
            StubPlanner::failing("openai/b"),
        );

        let err = planner.plan(&trip(), None).await.unwrap_err();
        assert!(matches!(err, VacaigentError::Fallback { .. }));
        let text = err.to_string();
        assert!(text.contains("gemini/a"));
        assert!(text.contains("openai/b"));
    }

    #[tokio::test]
    async fn test_crew_planner_without_keys_fails() {
        let planner = CrewPlanner::new(
            "gemini/gemini-2.5-flash".parse().unwrap(),
            Arc::new(Settings::default()),
            Arc::new(VacaigentConfig::default()),
        );
        assert_eq!(planner.name(), "gemini/gemini-2.5-flash");
        let err = planner.plan(&trip(), None).await.unwrap_err();
        assert!(matches!(err, VacaigentError::MissingKeys { .. }));
    }

    #[test]
    fn test_planners_from_default_config() {
        let planners = Planners::from_config(
            Arc::new(Settings::default()),
            Arc::new(VacaigentConfig::default()),
        )
        .unwrap();
        assert_eq!(planners.primary.name(), "gemini/gemini-2.5-flash");
        assert_eq!(planners.with_fallback.name(), "gemini/gemini-2.5-flash");
    }
}
