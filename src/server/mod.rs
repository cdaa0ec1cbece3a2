//! # HTTP front-end
//!
//! `POST /analyze` accepts `{"text": "..."}` and returns the predicted sentiment with the
//! probability of each class. The model is built once by the caller and shared by every
//! worker through [`AppState`].
//!
//! ```no_run
//! use sentiment_api::pipelines::sentiment::SentimentModel;
//! use sentiment_api::server::{startup, AppState, ServerConfig};
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let model = SentimentModel::new(Default::default())?;
//! let config = ServerConfig {
//!     host: "127.0.0.1".to_string(),
//!     port: 8000,
//!     workers: None,
//! };
//! actix_web::rt::System::new().block_on(startup(config, AppState::new(Arc::new(model))))?;
//! # Ok(())
//! # }
//! ```

pub mod io_struct;
mod state;

pub use state::{AppState, Classifier};

use crate::SentimentError;
use actix_cors::Cors;
use actix_web::error::{BlockingError, InternalError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::{middleware, web, App, HttpResponse, HttpServer, ResponseError};
use io_struct::{ErrorResponse, SentimentResponse, TextInput};
use log::{debug, info};
use std::io::Write;

/// Largest accepted request body.
pub const MAX_PAYLOAD_SIZE: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Number of HTTP workers, actix defaults to the number of physical cores
    pub workers: Option<usize>,
}

/// Failure while serving a well-formed request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Inference(#[from] SentimentError),

    #[error("inference task failed: {0}")]
    Blocking(#[from] BlockingError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        log::error!("analyze failed: {}", self);
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            detail: self.to_string(),
        })
    }
}

/// `POST /analyze`
pub async fn analyze(
    input: web::Json<TextInput>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let TextInput { text } = input.into_inner();
    let classifier = app_state.classifier.clone();

    let (text, sentiment) = web::block(move || {
        let sentiment = classifier.classify(&text);
        (text, sentiment)
    })
    .await?;
    let sentiment = sentiment?;
    debug!(
        "classified {} chars as {}",
        text.chars().count(),
        sentiment.polarity
    );

    Ok(HttpResponse::Ok().json(SentimentResponse::new(text, sentiment)))
}

/// JSON extractor settings: body size limit and `{"detail": ...}` error bodies.
/// Wrong content type maps to 415, oversized bodies to 413, anything else to 422.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_PAYLOAD_SIZE)
        .error_handler(|err, _req| {
            let status = match &err {
                JsonPayloadError::ContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
                    StatusCode::PAYLOAD_TOO_LARGE
                }
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            };
            let response = HttpResponse::build(status).json(ErrorResponse {
                detail: err.to_string(),
            });
            InternalError::from_response(err, response).into()
        })
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse {
        detail: "Not Found".to_string(),
    })
}

/// Any origin, method and header, with credentials. The request origin is echoed back.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
}

/// Registers the routes and the JSON extractor configuration. Other methods on `/analyze`
/// get a 405, unknown paths a 404.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(web::resource("/analyze").route(web::post().to(analyze)))
        .default_service(web::to(not_found));
}

/// Installs the process-wide logger, timestamped lines filtered at `level`.
pub fn init_logging(level: log::LevelFilter) {
    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .init();
}

pub async fn startup(server_config: ServerConfig, app_state: AppState) -> std::io::Result<()> {
    let app_state = web::Data::new(app_state);

    info!(
        "Starting server at {}:{}",
        server_config.host, server_config.port
    );

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(cors())
            .wrap(middleware::Logger::default())
            .app_data(app_state.clone())
            .configure(configure)
    });
    if let Some(workers) = server_config.workers {
        server = server.workers(workers);
    }

    server
        .bind((server_config.host.as_str(), server_config.port))?
        .run()
        .await
}
