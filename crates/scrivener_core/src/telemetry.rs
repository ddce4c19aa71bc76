//! Tracing subscriber setup, with optional OpenTelemetry span export.

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Boxed error returned by subscriber initialization.
pub type TelemetryError = Box<dyn std::error::Error + Send + Sync>;

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` is used as the filter
/// directive. Logs go to stderr so stdout stays free for event output.
/// With the `otel` feature, spans are also exported to stdout through
/// OpenTelemetry.
///
/// # Errors
///
/// Returns error if a global subscriber is already installed.
pub fn init_tracing(level: &str) -> Result<(), TelemetryError> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_filter(filter(level));

    #[cfg(feature = "otel")]
    {
        use opentelemetry::trace::TracerProvider as _;
        use opentelemetry_sdk::{
            Resource,
            trace::{RandomIdGenerator, Sampler, TracerProvider},
        };

        let provider = TracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .with_id_generator(RandomIdGenerator::default())
            .with_sampler(Sampler::AlwaysOn)
            .with_resource(Resource::default())
            .build();
        let tracer = provider.tracer("scrivener");
        opentelemetry::global::set_tracer_provider(provider);

        let otel_layer = tracing_opentelemetry::layer()
            .with_tracer(tracer)
            .with_filter(filter(level));

        tracing_subscriber::registry()
            .with(otel_layer)
            .with(fmt_layer)
            .try_init()?;
    }

    #[cfg(not(feature = "otel"))]
    tracing_subscriber::registry().with(fmt_layer).try_init()?;

    Ok(())
}

/// Flush pending spans before exit. A no-op without the `otel` feature.
pub fn shutdown_tracing() {
    #[cfg(feature = "otel")]
    opentelemetry::global::shutdown_tracer_provider();
}
