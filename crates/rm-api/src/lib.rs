use std::env;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{connect_info::ConnectInfo, DefaultBodyLimit, State},
    http::{
        header::{CONTENT_TYPE, HeaderName, HeaderValue},
        Method, Request,
    },
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use clap::Parser;
use dotenvy::dotenv;
use governor::{
    clock::DefaultClock, middleware::NoOpMiddleware, state::keyed::DashMapStateStore, Quota,
    RateLimiter,
};
use rm_common::encoder::EncoderConfig;
use rm_common::logging::{self, LogSettings};
use rm_common::matching::{HybridConfig, SparseConfig};
use rm_common::{ArtifactPaths, Artifacts, CatalogRow, Matcher, ReferenceCatalog};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

pub mod error;
pub mod handlers;

use error::ApiError;
use handlers::{health, occupations, predict};

const SHUTDOWN_DRAIN_GRACE: Duration = Duration::from_millis(200);
const BODY_LIMIT_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Parser)]
#[command(name = "rm-api", about = "HTTP API matching skill codes to occupations")]
struct Cli {
    /// Server port
    #[arg(long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Reference catalog (JSON array of skill/occupation rows)
    #[arg(long, env = "RM_CATALOG_PATH")]
    catalog_path: PathBuf,

    /// Prebuilt sparse bundle; derived from the catalog when absent
    #[arg(long, env = "RM_SPARSE_BUNDLE_PATH")]
    sparse_bundle_path: Option<PathBuf>,

    /// Profile encoder: hash | table
    #[arg(long, env = "RM_ENCODER", default_value = "hash")]
    encoder: String,

    /// Embedding tables for RM_ENCODER=table
    #[arg(long, env = "RM_ENCODER_WEIGHTS_PATH")]
    encoder_weights_path: Option<PathBuf>,

    /// Embedding dimension of the hash encoder
    #[arg(long, env = "RM_ENCODER_DIMENSION", default_value_t = 64)]
    encoder_dimension: usize,

    /// Comma separated list of allowed CORS origins
    #[arg(long, env = "RM_CORS_ORIGINS", default_value = "http://localhost:3000")]
    cors_origins: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub artifacts: ArtifactPaths,
    pub hybrid: HybridConfig,
    pub sparse: SparseConfig,
}

impl AppConfig {
    fn from_cli(cli: Cli) -> Result<Self, ApiError> {
        let cors_origins = cli
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect::<Vec<_>>();

        if cli.encoder_dimension == 0 {
            return Err(ApiError::Config("RM_ENCODER_DIMENSION must be positive".into()));
        }
        if cli.encoder == "table" && cli.encoder_weights_path.is_none() {
            return Err(ApiError::Config(
                "RM_ENCODER_WEIGHTS_PATH is required when RM_ENCODER=table".into(),
            ));
        }

        let hybrid = HybridConfig::from_env();
        hybrid.validate().map_err(ApiError::Config)?;
        let sparse = SparseConfig::from_env();
        sparse.validate().map_err(ApiError::Config)?;

        Ok(Self {
            port: cli.port,
            cors_origins,
            artifacts: ArtifactPaths {
                catalog: cli.catalog_path,
                sparse_bundle: cli.sparse_bundle_path,
                encoder_name: cli.encoder,
                encoder_weights: cli.encoder_weights_path,
                encoder: EncoderConfig {
                    dimension: cli.encoder_dimension,
                },
            },
            hybrid,
            sparse,
        })
    }

    pub fn for_tests() -> Self {
        Self {
            port: 8000,
            cors_origins: vec!["http://localhost:3000".into()],
            artifacts: ArtifactPaths {
                catalog: PathBuf::from(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/../../fixtures/catalog.json"
                )),
                sparse_bundle: None,
                encoder_name: "hash".into(),
                encoder_weights: None,
                encoder: EncoderConfig::default(),
            },
            hybrid: HybridConfig::default(),
            sparse: SparseConfig::default(),
        }
    }
}

type IpRateLimiter = RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock, NoOpMiddleware>;

#[derive(Clone)]
pub struct RateLimits {
    predict: Arc<IpRateLimiter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub per_sec: u32,
    pub burst: u32,
}

impl RateLimitConfig {
    fn parse_env_u32(name: &str) -> Option<u32> {
        env::var(name)
            .ok()
            .and_then(|value| value.trim().parse::<u32>().ok())
            .filter(|value| *value > 0)
    }

    fn from_env() -> Self {
        Self {
            per_sec: Self::parse_env_u32("RM_RATE_LIMIT_PER_SEC").unwrap_or(20),
            burst: Self::parse_env_u32("RM_RATE_LIMIT_BURST").unwrap_or(40),
        }
    }
}

fn build_ip_limiter(cfg: &RateLimitConfig) -> Arc<IpRateLimiter> {
    let per_sec = NonZeroU32::new(cfg.per_sec).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(cfg.burst).unwrap_or(per_sec);
    Arc::new(RateLimiter::keyed(Quota::per_second(per_sec).allow_burst(burst)))
}

pub fn default_rate_limits() -> RateLimits {
    RateLimits {
        predict: build_ip_limiter(&RateLimitConfig::from_env()),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub matcher: Arc<Matcher>,
    pub config: AppConfig,
    pub(crate) rate_limits: RateLimits,
    pub readiness: Arc<AtomicBool>,
}

pub type SharedState = Arc<AppState>;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

fn request_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
}

fn enforce_rate_limit(limiter: &IpRateLimiter, ip: Option<IpAddr>) -> Result<(), ApiError> {
    if let Some(client_ip) = ip {
        if limiter.check_key(&client_ip).is_err() {
            return Err(ApiError::TooManyRequests("rate limit exceeded".into()));
        }
    }
    Ok(())
}

async fn predict_rate_limit(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    enforce_rate_limit(&state.rate_limits.predict, request_ip(&req))?;
    Ok(next.run(req).await)
}

async fn attach_request_id_context(req: Request<Body>, next: Next) -> Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    error::with_request_id(request_id, next.run(req)).await
}

pub fn create_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let request_id_header = HeaderName::from_static("x-request-id");
    let trace_header = request_id_header.clone();

    let trace = TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(&trace_header)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    });

    let api_routes = Router::new()
        .route(
            "/predict",
            post(predict::predict).route_layer(middleware::from_fn_with_state(
                state.clone(),
                predict_rate_limit,
            )),
        )
        .route("/occupations", get(occupations::list_occupations))
        .route("/occupations/:code/skills", get(occupations::occupation_skills));

    Router::new()
        .route("/health", get(health::readyz))
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .nest("/api", api_routes)
        .layer(middleware::from_fn(attach_request_id_context))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuid,
        ))
        .layer(cors)
        .with_state(state)
}

/// Small in-memory catalog used by the router tests.
///
/// | occupation | skills          |
/// |------------|-----------------|
/// | H2913      | 101 102 103     |
/// | H2902      | 102 103 104     |
/// | K2111      | 201 202         |
pub fn fixture_catalog() -> ReferenceCatalog {
    let rows = [
        ("101", "Souder à l'arc", "H2913", "Soudeur"),
        ("102", "Lire un plan", "H2913", "Soudeur"),
        ("103", "Meuler une pièce", "H2913", "Soudeur"),
        ("102", "Lire un plan", "H2902", "Chaudronnier"),
        ("103", "Meuler une pièce", "H2902", "Chaudronnier"),
        ("104", "Plier une tôle", "H2902", "Chaudronnier"),
        ("201", "Animer une séance", "K2111", "Formateur"),
        ("202", "Évaluer des acquis", "K2111", "Formateur"),
    ]
    .into_iter()
    .map(|(skill, skill_label, occupation, occupation_label)| {
        CatalogRow::new(skill, Some(skill_label), occupation, Some(occupation_label))
    })
    .collect::<Vec<_>>();

    ReferenceCatalog::from_rows(&rows).expect("fixture catalog is valid")
}

pub fn test_state() -> SharedState {
    let config = AppConfig::for_tests();
    let artifacts = Artifacts::from_catalog(
        fixture_catalog(),
        "hash",
        config.artifacts.encoder.clone(),
        None,
    )
    .expect("fixture artifacts should build");
    let matcher = Matcher::new(&artifacts, config.hybrid.clone(), config.sparse.clone());

    Arc::new(AppState {
        matcher: Arc::new(matcher),
        config,
        rate_limits: default_rate_limits(),
        readiness: Arc::new(AtomicBool::new(true)),
    })
}

pub async fn run() -> Result<(), ApiError> {
    dotenv().ok();
    let log_settings = LogSettings::from_env();
    logging::init(env!("CARGO_PKG_NAME"), &log_settings);

    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli)?;

    let artifacts = Artifacts::load(&config.artifacts)?;
    let matcher = Matcher::new(&artifacts, config.hybrid.clone(), config.sparse.clone());
    matcher.warm_up();

    let state = Arc::new(AppState {
        matcher: Arc::new(matcher),
        config: config.clone(),
        rate_limits: default_rate_limits(),
        readiness: Arc::new(AtomicBool::new(true)),
    });

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let app = create_router(state.clone());

    info!(%addr, encoder = %config.artifacts.encoder_name, "rm-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    let service = app.into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(())
}

async fn shutdown_signal(state: SharedState) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            let _ = sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    state.readiness.store(false, Ordering::SeqCst);
    info!("shutdown requested; draining");

    tokio::time::sleep(SHUTDOWN_DRAIN_GRACE).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn sets_request_id_when_missing() {
        let app = create_router(test_state());

        let response = app
            .oneshot(Request::builder().uri("/livez").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[test]
    fn limiter_rejects_after_burst() {
        let limiter = build_ip_limiter(&RateLimitConfig { per_sec: 1, burst: 2 });
        let ip: IpAddr = [10, 0, 0, 1].into();

        assert!(enforce_rate_limit(&limiter, Some(ip)).is_ok());
        assert!(enforce_rate_limit(&limiter, Some(ip)).is_ok());
        assert!(matches!(
            enforce_rate_limit(&limiter, Some(ip)),
            Err(ApiError::TooManyRequests(_))
        ));
        assert!(enforce_rate_limit(&limiter, None).is_ok());
    }

    #[test]
    fn table_encoder_requires_weights() {
        let cli = Cli::parse_from([
            "rm-api",
            "--catalog-path",
            "catalog.json",
            "--encoder",
            "table",
        ]);

        assert!(matches!(AppConfig::from_cli(cli), Err(ApiError::Config(_))));
    }

    #[test]
    fn cli_splits_cors_origins() {
        let cli = Cli::parse_from([
            "rm-api",
            "--catalog-path",
            "catalog.json",
            "--cors-origins",
            "http://a.test, ,http://b.test",
        ]);

        let config = AppConfig::from_cli(cli).unwrap();
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.artifacts.encoder_name, "hash");
    }
}
