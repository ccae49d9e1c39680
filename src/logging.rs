use crate::app_env;
use anyhow::Context;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use opentelemetry::trace::TracerProvider;
use opentelemetry::{KeyValue, global};
use opentelemetry_http::HeaderExtractor;
use opentelemetry_otlp::{MetricExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::Tracer;
use opentelemetry_sdk::{Resource, runtime};
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing::{Span, debug, debug_span, field};
use tracing_opentelemetry::{MetricsLayer, OpenTelemetryLayer, OpenTelemetrySpanExt};
use tracing_subscriber::{EnvFilter, prelude::*, registry};

const SERVICE_NAME: &str = "task-board";

/// Span and metric exporters, present only when OTLP endpoints are configured
pub struct OtelExporters {
    pub tracer: Tracer,
    pub meter: SdkMeterProvider,
}

/// Wraps every request in a debug-level `http_request` span. The span joins the caller's trace
/// when a `traceparent` header is present, and records the response status once it is known.
pub fn attach_tracing_http<T>(router: Router<T>) -> Router<T>
where
    T: Clone + Send + Sync + 'static,
{
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            let span = debug_span!(
                "http_request",
                method = request.method().as_str(),
                path = request.uri().path(),
                status = field::Empty,
            );
            let caller_context = global::get_text_map_propagator(|propagator| {
                propagator.extract(&HeaderExtractor(request.headers()))
            });
            span.set_parent(caller_context);

            span
        })
        .on_response(|response: &Response<Body>, latency: Duration, span: &Span| {
            span.record("status", field::display(response.status()));
            debug!(latency_ms = latency.as_millis() as u64, "request finished");
        });

    router.layer(trace_layer)
}

/// Builds OTLP/gRPC exporters for spans and metrics, both tagged with this service's name
pub fn init_exporters(
    otlp_traces_endpoint: &str,
    otlp_metrics_endpoint: &str,
) -> anyhow::Result<OtelExporters> {
    let resource = Resource::new([KeyValue::new("service.name", SERVICE_NAME)]);

    let span_exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(otlp_traces_endpoint)
        .build()
        .context("failed to build span exporter")?;
    let tracer = opentelemetry_sdk::trace::TracerProvider::builder()
        .with_batch_exporter(span_exporter, runtime::Tokio)
        .with_resource(resource.clone())
        .build()
        .tracer(SERVICE_NAME);

    let metric_exporter = MetricExporter::builder()
        .with_tonic()
        .with_endpoint(otlp_metrics_endpoint)
        .build()
        .context("failed to build metric exporter")?;
    let meter = SdkMeterProvider::builder()
        .with_reader(PeriodicReader::builder(metric_exporter, runtime::Tokio).build())
        .with_resource(resource)
        .build();

    Ok(OtelExporters { tracer, meter })
}

/// Reads per-module log directives from [app_env::LOG_LEVEL], defaulting to "info"
pub fn init_env_filter() -> anyhow::Result<EnvFilter> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(app_env::LOG_LEVEL)
        .from_env()
        .with_context(|| format!("{} holds an invalid filter", app_env::LOG_LEVEL))?;

    Ok(filter)
}

/// Installs the global subscriber. JSON logs go to stdout through [env_filter]; when exporters are
/// given, everything at debug and above is also shipped over OTLP.
pub fn setup_logging_and_tracing(env_filter: EnvFilter, otel_exporters: Option<OtelExporters>) {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let (span_layer, metric_layer) = match otel_exporters {
        Some(exporters) => (
            Some(OpenTelemetryLayer::new(exporters.tracer)),
            Some(MetricsLayer::new(exporters.meter)),
        ),
        None => (None, None),
    };

    registry()
        .with(LevelFilter::DEBUG)
        .with(span_layer)
        .with(metric_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_filter(env_filter),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use tower::ServiceExt;

    #[tokio::test]
    async fn traced_router_still_answers() {
        let router = attach_tracing_http(Router::new().route("/ping", get(|| async { "pong" })));

        let response = router
            .oneshot(
                Request::get("/ping")
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("router should respond");
        assert_eq!(StatusCode::OK, response.status());
    }
}
