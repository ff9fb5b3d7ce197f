mod config;
mod label;
mod qr;
mod record_store;
mod services;

use crate::config::AppConfig;
use crate::record_store::{NotionRecordStore, RecordStore};
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use env_logger::Env;
use include_dir::{include_dir, Dir};
use log::info;
use mime_guess::from_path;
use std::fs;
use std::sync::Arc;

static STATIC_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/static");

async fn serve_embedded(req: HttpRequest) -> HttpResponse {
    let path = req.path().trim_start_matches('/');
    let file_path = if path.is_empty() { "index.html" } else { path };

    match STATIC_DIR.get_file(file_path) {
        Some(file) => {
            let mime = from_path(file_path).first_or_octet_stream();
            HttpResponse::Ok()
                .content_type(mime.as_ref())
                .body(file.contents().to_vec())
        }
        None => match STATIC_DIR.get_file("index.html") {
            Some(index) => HttpResponse::Ok()
                .content_type("text/html; charset=utf-8")
                .body(index.contents().to_vec()),
            None => HttpResponse::NotFound().body("Not Found"),
        },
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {}", err);
            std::process::exit(1);
        }
    };

    // Generated labels land here; the template is expected alongside them.
    fs::create_dir_all(&config.upload_dir)?;

    let store: Arc<dyn RecordStore> = Arc::new(NotionRecordStore::new(&config.record_store));
    let port = config.port;

    info!("Server is running on port {}", port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::from(store.clone()))
            .service(services::jobs::configure_routes())
            .service(services::labels::configure_routes())
            .default_service(web::route().to(serve_embedded))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
