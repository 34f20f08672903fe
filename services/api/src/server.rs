use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryPostingBackend, RuleTableEvaluator, StaticCompanyVerification,
};
use crate::routes::with_wizard_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use jobpost_wizard::config::{AppConfig, BackendConfig};
use jobpost_wizard::error::AppError;
use jobpost_wizard::telemetry;
use jobpost_wizard::workflows::posting::{
    FileSnapshotStore, HttpPostingGateway, WizardServices, WizardSessions,
};
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let services = wizard_services(&config.backend, &config.wizard.draft_dir, &args.editor)?;
    let sessions = Arc::new(
        WizardSessions::new(services, config.wizard.settings())
            .with_idle_timeout(config.wizard.session_idle_timeout),
    );

    let app = with_wizard_routes(sessions)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, editor = %args.editor, "job posting wizard ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Wire the remote collaborators. Without a backend URL the service runs self-contained.
pub(crate) fn wizard_services(
    backend: &BackendConfig,
    draft_dir: &Path,
    editor: &str,
) -> Result<WizardServices, AppError> {
    let store = Arc::new(FileSnapshotStore::for_editor(draft_dir, editor));

    match &backend.base_url {
        Some(base_url) => {
            let gateway = Arc::new(HttpPostingGateway::new(base_url.as_str(), backend.timeout)?);
            info!(%base_url, "using remote recruitment backend");
            Ok(WizardServices {
                backend: gateway.clone(),
                verification: gateway.clone(),
                evaluator: gateway,
                store,
            })
        }
        None => {
            warn!("APP_BACKEND_URL not set; postings and visa rules are served in-process");
            Ok(WizardServices {
                backend: Arc::new(InMemoryPostingBackend::default()),
                verification: Arc::new(StaticCompanyVerification::verified()),
                evaluator: Arc::new(RuleTableEvaluator),
                store,
            })
        }
    }
}
