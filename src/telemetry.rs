//! Tracing subscriber and optional OTLP export

use anyhow::{Context, Result};
use opentelemetry::{KeyValue, trace::TracerProvider as _};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, logs::SdkLoggerProvider, trace::SdkTracerProvider};
use opentelemetry_semantic_conventions::{SCHEMA_URL, resource::SERVICE_VERSION};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

use crate::VERSION;
use crate::config::LoggingConfig;

const SERVICE_NAME: &str = "vacaigent";

/// Keeps the OTLP providers alive; flushes them on drop
#[derive(Default)]
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
    logger_provider: Option<SdkLoggerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("Failed to shut down tracer provider: {e}");
            }
        }
        if let Some(provider) = self.logger_provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("Failed to shut down logger provider: {e}");
            }
        }
    }
}

fn resource() -> Resource {
    Resource::builder()
        .with_service_name(SERVICE_NAME)
        .with_schema_url([KeyValue::new(SERVICE_VERSION, VERSION)], SCHEMA_URL)
        .build()
}

/// `RUST_LOG` wins over the configured level
fn env_filter(config: &LoggingConfig, verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { config.level.as_str() };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{level},hyper=warn,h2=warn,reqwest=warn,opentelemetry=warn"))
    })
}

fn init_tracer_provider(endpoint: &str) -> Result<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(format!("{}/v1/traces", endpoint.trim_end_matches('/')))
        .build()
        .context("Failed to build OTLP span exporter")?;

    Ok(SdkTracerProvider::builder()
        .with_resource(resource())
        .with_batch_exporter(exporter)
        .build())
}

fn init_logger_provider(endpoint: &str) -> Result<SdkLoggerProvider> {
    let exporter = opentelemetry_otlp::LogExporter::builder()
        .with_http()
        .with_endpoint(format!("{}/v1/logs", endpoint.trim_end_matches('/')))
        .build()
        .context("Failed to build OTLP log exporter")?;

    Ok(SdkLoggerProvider::builder()
        .with_resource(resource())
        .with_batch_exporter(exporter)
        .build())
}

/// Install the global subscriber. Call once, early in `main`.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<TelemetryGuard> {
    let mut guard = TelemetryGuard::default();

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    layers.push(match config.format.as_str() {
        "json" => fmt::layer().json().with_target(true).boxed(),
        _ => fmt::layer().with_target(true).boxed(),
    });

    if let Some(endpoint) = config.otlp_endpoint.as_deref() {
        let tracer_provider = init_tracer_provider(endpoint)?;
        let logger_provider = init_logger_provider(endpoint)?;

        layers.push(
            tracing_opentelemetry::layer()
                .with_tracer(tracer_provider.tracer(SERVICE_NAME))
                .boxed(),
        );
        layers.push(OpenTelemetryTracingBridge::new(&logger_provider).boxed());

        opentelemetry::global::set_tracer_provider(tracer_provider.clone());
        guard.tracer_provider = Some(tracer_provider);
        guard.logger_provider = Some(logger_provider);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter(config, verbose))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(endpoint) = config.otlp_endpoint.as_deref() {
        tracing::info!("Exporting traces and logs to {}", endpoint);
    }

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_verbose_overrides_configured_level() {
        let config = LoggingConfig::default();
        if std::env::var("RUST_LOG").is_err() {
            assert_eq!(
                env_filter(&config, true).max_level_hint(),
                Some(LevelFilter::DEBUG)
            );
            assert_eq!(
                env_filter(&config, false).max_level_hint(),
                Some(LevelFilter::INFO)
            );
        }
    }
}
