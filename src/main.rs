use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use log::info;

use recipe_traffic::config::Config;
use recipe_traffic::handlers;
use recipe_traffic::inference::{OnnxForest, TrafficModel};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    // Without a model there is nothing to serve, so a bad artifact is fatal.
    let model: Arc<dyn TrafficModel> = Arc::new(
        OnnxForest::load(&config.model_path).context("could not start prediction service")?,
    );
    info!("Model loaded from {}", config.model_path.display());

    let model = web::Data::from(model);
    let bind_address = config.bind_address();
    info!("Server running at http://{}", bind_address);

    let mut server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(model.clone())
            .configure(handlers::configure)
            .default_service(web::route().to(handlers::not_found))
    });
    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }

    server.bind(&bind_address)?.run().await?;
    Ok(())
}
