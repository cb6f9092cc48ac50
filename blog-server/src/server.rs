use std::sync::Arc;

use crate::application::post_service::PostService;
use crate::data::post_repository::PostgresPostRepository;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::storage::S3ImageStore;
use crate::presentation::handlers;
use crate::presentation::middleware::{RequestIdMiddleware, TimingMiddleware};
use actix_multipart::form::MultipartFormConfig;
use actix_web::middleware::DefaultHeaders;
use actix_web::{App, HttpServer, web};
use sqlx::PgPool;
use tracing::info;

/// Registers every route; shared by the server and the handler tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::health::health)
        .service(handlers::post::index)
        .service(handlers::post::list_posts)
        .service(handlers::post::create_post)
        .service(handlers::post::delete_post)
        .service(handlers::post::edit_form)
        .service(handlers::post::edit_post);
}

pub async fn start_server(config: AppConfig, pool: PgPool) -> anyhow::Result<()> {
    let post_service = PostService::new(
        Arc::new(PostgresPostRepository::new(pool)),
        Arc::new(S3ImageStore::new(&config.storage).await),
    );
    let upload_limit = config.upload_limit_bytes;

    info!(
        host = %config.host,
        port = config.port,
        upload_limit,
        "HTTP server starting"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Referrer-Policy", "no-referrer")),
            )
            .app_data(
                MultipartFormConfig::default()
                    .total_limit(upload_limit)
                    .memory_limit(upload_limit),
            )
            .app_data(web::Data::new(post_service.clone()))
            .configure(configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
    .map_err(anyhow::Error::new)?;

    Ok(())
}
