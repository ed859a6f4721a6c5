use axum::http::header;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;

use crate::cli::ServeArgs;
use crate::core::component::ComponentRecord;
use crate::export::dpv::{generate_now, ExportOptions};
use crate::matching::association::{AssociationEngine, AssociationReport};
use crate::matching::resolver::{AssociationConfig, MarkingReport, MarkingResolver};
use crate::parsing::positions::parse_positions_text;
use crate::parsing::stations::{parse_stations, StationFormat};
use crate::utils::validation::{validate_upload, UploadKind, ValidationError};

/// Security configuration constants to prevent `DoS` attacks
pub const MAX_MULTIPART_FIELDS: usize = 10;
pub const MAX_FILE_FIELD_SIZE: usize = 16 * 1024 * 1024; // 16MB
pub const MAX_TEXT_FIELD_SIZE: usize = 1024 * 1024; // 1MB
pub const MAX_CLASSIFY_MARKINGS: usize = 10_000;

/// Name given to exported programs
pub const EXPORT_FILE_NAME: &str = "export.dpv";

/// Shared application state
pub struct AppState {
    /// Alias/ignore tables used when a request does not upload its own
    pub config: AssociationConfig,
}

/// Enhanced error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
    pub details: Option<String>,
}

#[derive(Deserialize)]
pub struct ClassifyRequest {
    pub markings: Vec<String>,
}

#[derive(Serialize)]
pub struct ClassifyResponse {
    pub results: Vec<MarkingReport>,
}

#[derive(Serialize)]
pub struct AssociateResponse {
    pub report: AssociationReport,
    pub station_count: usize,
    pub parts: Vec<ComponentRecord>,
}

/// One uploaded file, already validated
#[derive(Debug)]
struct Upload {
    text: String,
    filename: Option<String>,
}

/// Files and options from an associate/export form
#[derive(Debug, Default)]
struct AssociateForm {
    positions: Option<Upload>,
    stations: Option<Upload>,
    config: Option<Upload>,
    /// Discard assignments carried in the position file
    reset: bool,
}

/// Create a safe error response that prevents information disclosure
/// while logging detailed errors server-side for debugging
pub fn create_safe_error_response(
    error_type: &str,
    user_message: &str,
    internal_error: Option<&str>,
) -> ErrorResponse {
    if let Some(internal_msg) = internal_error {
        tracing::error!("Internal error ({}): {}", error_type, internal_msg);
    }

    ErrorResponse {
        error: user_message.to_string(),
        error_type: error_type.to_string(),
        details: None,
    }
}

fn error_response(
    status: StatusCode,
    error_type: &str,
    user_message: &str,
    internal_error: Option<&str>,
) -> Response {
    (
        status,
        Json(create_safe_error_response(
            error_type,
            user_message,
            internal_error,
        )),
    )
        .into_response()
}

/// Run the web server
///
/// # Errors
///
/// Returns an error if the tokio runtime cannot be created or the server fails to start.
pub fn run(args: ServeArgs) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move { run_server(args).await })
}

/// Routes and handlers over `state`, without the protective middleware
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/config", get(config_handler))
        .route("/api/classify", post(classify_handler))
        .route("/api/associate", post(associate_handler))
        .route("/api/export", post(export_handler))
        .with_state(state)
}

/// Create the application router with all routes and middleware configured.
///
/// # Errors
///
/// Returns an error if the embedded config cannot be loaded or the rate
/// limiter configuration is rejected.
pub fn create_router() -> anyhow::Result<Router> {
    let config = AssociationConfig::load_embedded()?;
    let state = Arc::new(AppState { config });

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(10) // 10 requests per second per IP
        .burst_size(50)
        .finish()
        .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?;

    let app = api_router(state).layer(
        ServiceBuilder::new()
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("x-content-type-options"),
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("x-frame-options"),
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("strict-transport-security"),
                HeaderValue::from_static("max-age=31536000; includeSubDomains"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("referrer-policy"),
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            ))
            // Per-IP rate limiting
            .layer(GovernorLayer {
                config: Arc::new(governor_conf),
            })
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(30),
            ))
            .layer(ConcurrencyLimitLayer::new(100))
            // Two files of MAX_FILE_FIELD_SIZE plus multipart overhead
            .layer(DefaultBodyLimit::max(2 * MAX_FILE_FIELD_SIZE + 1024 * 1024)),
    );

    Ok(app)
}

async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let app = create_router()?;

    let addr = format!("{}:{}", args.address, args.port);
    println!("Starting feeder-solver web server at http://{addr}");

    if args.open {
        open_browser(&format!("http://{addr}/api/config"), |url| open::that(url));
    }

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Hand `url` to the desktop opener. A failure is logged and the server keeps starting.
fn open_browser<F>(url: &str, opener: F) -> bool
where
    F: FnOnce(&str) -> std::io::Result<()>,
{
    match opener(url) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Could not open a browser at {}: {}", url, e);
            false
        }
    }
}

/// Active alias/ignore configuration
async fn config_handler(State(state): State<Arc<AppState>>) -> Json<AssociationConfig> {
    Json(state.config.clone())
}

/// Resolve and classify a batch of markings
async fn classify_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ClassifyRequest>,
) -> Response {
    if request.markings.len() > MAX_CLASSIFY_MARKINGS {
        return error_response(
            StatusCode::BAD_REQUEST,
            "too_many_markings",
            "Too many markings in one request",
            None,
        );
    }

    let resolver = MarkingResolver::new(&state.config);
    let results = request
        .markings
        .iter()
        .map(|m| resolver.describe(m))
        .collect();

    Json(ClassifyResponse { results }).into_response()
}

/// Associate uploaded parts with uploaded stations
async fn associate_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Response {
    let form = match extract_form(&mut multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    let (engine, report) = match associate_form(&state, &form) {
        Ok(result) => result,
        Err(response) => return *response,
    };

    Json(AssociateResponse {
        report,
        station_count: engine.stations().len(),
        parts: engine.parts().to_vec(),
    })
    .into_response()
}

/// Associate uploaded files and return the DPV program as a download
async fn export_handler(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let form = match extract_form(&mut multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    let (engine, _) = match associate_form(&state, &form) {
        Ok(result) => result,
        Err(response) => return *response,
    };

    let pcb_file = form
        .positions
        .as_ref()
        .and_then(|u| u.filename.as_deref())
        .and_then(|name| Path::new(name).file_stem())
        .and_then(|stem| stem.to_str())
        .unwrap_or("board")
        .to_string();

    let options = ExportOptions {
        file_name: EXPORT_FILE_NAME.to_string(),
        pcb_file,
        ..ExportOptions::default()
    };

    match generate_now(engine.parts().iter(), engine.stations(), &options) {
        Ok(document) => (
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
                ),
            ],
            document.text,
        )
            .into_response(),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "export_failed",
            "Failed to generate the program",
            Some(&e.to_string()),
        ),
    }
}

/// Parse the uploads of a form and run the bulk association
fn associate_form(
    state: &AppState,
    form: &AssociateForm,
) -> Result<(AssociationEngine, AssociationReport), Box<Response>> {
    let missing = |field: &str| {
        Box::new(error_response(
            StatusCode::BAD_REQUEST,
            "missing_field",
            &format!("Missing '{field}' file"),
            None,
        ))
    };

    let positions = form
        .positions
        .as_ref()
        .ok_or_else(|| missing(UploadKind::Positions.field_name()))?;
    let stations = form
        .stations
        .as_ref()
        .ok_or_else(|| missing(UploadKind::Stations.field_name()))?;

    let config = match &form.config {
        Some(upload) => AssociationConfig::from_json(&upload.text).map_err(|e| {
            Box::new(error_response(
                StatusCode::BAD_REQUEST,
                "invalid_config",
                &e.to_string(),
                None,
            ))
        })?,
        None => state.config.clone(),
    };

    let parts = parse_positions_text(&positions.text).map_err(|e| {
        Box::new(error_response(
            StatusCode::BAD_REQUEST,
            "parse_error",
            &format!("Position file: {e}"),
            None,
        ))
    })?;

    let station_format = match stations.filename.as_deref() {
        Some(name) => match StationFormat::from_path(Path::new(name)) {
            StationFormat::Json => StationFormat::Json,
            StationFormat::Csv => StationFormat::sniff(&stations.text),
        },
        None => StationFormat::sniff(&stations.text),
    };
    let stations = parse_stations(&stations.text, station_format).map_err(|e| {
        Box::new(error_response(
            StatusCode::BAD_REQUEST,
            "parse_error",
            &format!("Station file: {e}"),
            None,
        ))
    })?;

    let mut engine = AssociationEngine::from_records(parts, stations, &config);
    if form.reset {
        engine.clear_assignments();
    }
    let report = engine.auto_associate_all();

    Ok((engine, report))
}

fn validation_error_response(error: &ValidationError) -> Response {
    match error {
        ValidationError::FilenameTooLong => error_response(
            StatusCode::BAD_REQUEST,
            "filename_too_long",
            "Filename exceeds maximum length limit",
            Some("Filename validation failed due to length constraints"),
        ),
        ValidationError::InvalidFilename | ValidationError::EmptyFilename => error_response(
            StatusCode::BAD_REQUEST,
            "invalid_filename",
            "Filename contains invalid or dangerous characters",
            Some("Filename validation failed due to invalid characters"),
        ),
        ValidationError::FormatValidationFailed => error_response(
            StatusCode::BAD_REQUEST,
            "format_mismatch",
            "File content does not match the expected format",
            Some("Format validation failed"),
        ),
        ValidationError::InvalidFileContent => error_response(
            StatusCode::BAD_REQUEST,
            "invalid_content",
            "File content appears malformed or corrupted",
            None,
        ),
    }
}

/// Read and validate one file field
async fn read_upload(
    field: axum::extract::multipart::Field<'_>,
    kind: UploadKind,
) -> Result<Upload, Response> {
    let filename = field.file_name().map(ToString::to_string);

    let bytes = field.bytes().await.map_err(|e| {
        error_response(
            StatusCode::BAD_REQUEST,
            "upload_error",
            "Failed to read uploaded file",
            Some(&e.to_string()),
        )
    })?;

    if bytes.len() > MAX_FILE_FIELD_SIZE {
        return Err(error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            "file_too_large",
            "File size exceeds limit",
            None,
        ));
    }

    let filename = validate_upload(filename.as_deref(), &bytes, kind)
        .map_err(|e| validation_error_response(&e))?;

    Ok(Upload {
        text: String::from_utf8_lossy(&bytes).into_owned(),
        filename,
    })
}

/// Collect the form fields, enforcing field count and size limits
async fn extract_form(multipart: &mut Multipart) -> Result<AssociateForm, Response> {
    let mut form = AssociateForm::default();
    let mut fields_received = 0usize;

    loop {
        if fields_received >= MAX_MULTIPART_FIELDS {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "field_limit_exceeded",
                "Too many form fields",
                None,
            ));
        }

        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    "multipart_error",
                    "Malformed form data",
                    Some(&e.to_string()),
                ));
            }
        };
        fields_received += 1;

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "positions" => form.positions = Some(read_upload(field, UploadKind::Positions).await?),
            "stations" => form.stations = Some(read_upload(field, UploadKind::Stations).await?),
            "config" => form.config = Some(read_upload(field, UploadKind::Config).await?),
            "reset" => {
                let text = field.text().await.unwrap_or_default();
                if text.len() > MAX_TEXT_FIELD_SIZE {
                    return Err(error_response(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        "field_too_large",
                        "Form field exceeds limit",
                        None,
                    ));
                }
                form.reset = matches!(text.trim(), "true" | "on" | "1");
            }
            other => {
                tracing::debug!("Ignoring unknown form field '{}'", other);
            }
        }
    }

    Ok(form)
}
