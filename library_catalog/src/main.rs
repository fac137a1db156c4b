use std::sync::Arc;

use actix_web::{App, HttpServer};
use anyhow::Context;
use opentelemetry::global;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::runtime::TokioCurrentThread;
use paperclip::actix::{web, OpenApiExt};
use tracing_actix_web::TracingLogger;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

use library_catalog::app_config::{config_app, error_handlers, json_config, path_config};
use library_catalog::catalog_repository::{
    CatalogRepository, InMemoryCatalogRepository, PostgresCatalogRepository,
};
use library_catalog::catalog_service::CatalogService;
use library_catalog::settings::Settings;

// Based on https://github.com/LukeMathWalker/tracing-actix-web/blob/main/examples/opentelemetry/src/main.rs#L15
fn init_telemetry() {
    let app_name = "library_catalog";

    // Spans are exported to Jaeger in batches
    global::set_text_map_propagator(TraceContextPropagator::new());
    #[allow(deprecated)]
    let tracer = opentelemetry_jaeger::new_agent_pipeline()
        .with_service_name(app_name)
        .install_batch(TokioCurrentThread)
        .expect("Failed to install OpenTelemetry tracer.");

    // Tunable via `RUST_LOG` env variable
    let env_filter = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info"));
    let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);
    let formatting_layer = BunyanFormattingLayer::new(app_name.into(), std::io::stdout);
    let subscriber = Registry::default()
        .with(env_filter)
        .with(telemetry)
        .with(JsonStorageLayer)
        .with(formatting_layer);
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to install `tracing` subscriber.")
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_telemetry();

    let settings = Settings::from_env().context("Failed to read settings")?;

    let repository: Arc<dyn CatalogRepository> = if settings.use_in_memory_db {
        tracing::warn!("Using in memory catalog, data will be lost on restart");
        Arc::new(InMemoryCatalogRepository::default())
    } else {
        // Unreachable database at startup is fatal
        Arc::new(
            PostgresCatalogRepository::init(settings.repository_config())
                .await
                .context("Failed to init postgres")?,
        )
    };
    let catalog_service = web::Data::new(CatalogService::new(repository));

    tracing::info!(
        "starting HTTP server at http://0.0.0.0:{}",
        settings.http_port
    );

    HttpServer::new(move || {
        App::new()
            .wrap_api()
            .app_data(catalog_service.clone())
            .app_data(json_config())
            .app_data(path_config())
            .wrap(error_handlers())
            .wrap(TracingLogger::default())
            .configure(config_app)
            .with_json_spec_at("/apispec/v2")
            .build()
    })
    .bind(("0.0.0.0", settings.http_port))?
    .run()
    .await?;

    global::shutdown_tracer_provider();
    Ok(())
}
