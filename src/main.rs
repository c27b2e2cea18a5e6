// Web server entry point
use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use classify_server::config::Config;
use classify_server::error::StartupError;
use classify_server::labels::LabelList;
use classify_server::models::onnx::OnnxClassifier;
use classify_server::models::InferenceEngine;
use classify_server::state::AppState;
use classify_server::{api, logging};
use log::{info, warn};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    logging::init(&config.format);

    let model = OnnxClassifier::load(&config.model_path).context("failed to initialize model")?;
    let labels = LabelList::load(&config.labels_path).context("failed to initialize labels")?;
    info!("loaded {} labels from {}", labels.len(), config.labels_path.display());

    let classes = model.descriptor().num_classes();
    if classes != labels.len() {
        warn!(
            "model has {} output classes but {} labels were loaded",
            classes,
            labels.len()
        );
    }

    let state = web::Data::new(AppState::new(
        Arc::new(model),
        labels,
        config.max_upload_bytes,
    ));

    let addr = config.bind_addr();
    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .service(api::classify)
    });
    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }
    let server = server
        .bind(&addr)
        .map_err(|source| StartupError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!("listening on {}", addr);
    server.run().await.context("server terminated with an error")
}
