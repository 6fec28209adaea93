use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use fxmacro_core::auth::Authenticator;
use fxmacro_core::domain::record::{AnalysisRecord, AnalysisSummary, User};
use fxmacro_core::error::FxError;
use fxmacro_core::pipeline::{AnalysisOutcome, AnalysisRequest, AnalysisService};
use fxmacro_core::storage::{HistoryStore, PgHistoryStore, PgUserStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = fxmacro_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let pool = connect_pool(&settings).await;
    let history: Option<Arc<dyn HistoryStore>> = pool
        .clone()
        .map(|p| Arc::new(PgHistoryStore::new(p)) as Arc<dyn HistoryStore>);
    let auth = pool.map(|p| Authenticator::new(Arc::new(PgUserStore::new(p))));

    let service = AnalysisService::from_settings(&settings, history.clone())?;
    let state = AppState {
        service,
        history,
        auth,
    };

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port()));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// No database means degraded mode: analyses still run, login and history answer 503.
async fn connect_pool(settings: &fxmacro_core::config::Settings) -> Option<sqlx::PgPool> {
    let db_url = match settings.require_database_url() {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            return None;
        }
    };
    let pool = match fxmacro_core::storage::connect(db_url).await {
        Ok(pool) => pool,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "db connect failed; starting API in degraded mode");
            return None;
        }
    };
    match fxmacro_core::storage::migrate(&pool).await {
        Ok(()) => Some(pool),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
            None
        }
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/auth/login", post(login))
        .route("/analyses", post(create_analysis).get(list_analyses))
        .route("/analyses/:id", get(get_analysis).delete(delete_analysis))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    service: AnalysisService,
    history: Option<Arc<dyn HistoryStore>>,
    auth: Option<Authenticator>,
}

fn internal_error(e: anyhow::Error) -> StatusCode {
    sentry_anyhow::capture_anyhow(&e);
    tracing::error!(error = %format!("{e:#}"), "request failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<User>, StatusCode> {
    let Some(auth) = &state.auth else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    match auth.authenticate(&req.username, &req.password).await {
        Ok(user) => Ok(Json(user)),
        Err(e) if matches!(e.downcast_ref::<FxError>(), Some(FxError::AuthenticationFailed { .. })) => {
            Err(StatusCode::UNAUTHORIZED)
        }
        Err(e) => Err(internal_error(e)),
    }
}

#[derive(Debug, Serialize)]
struct ApiError {
    kind: &'static str,
    message: String,
}

impl From<&FxError> for ApiError {
    fn from(e: &FxError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiAnalysis {
    record: AnalysisRecord,
    persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    llm_error: Option<ApiError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    persistence_warning: Option<ApiError>,
}

impl From<AnalysisOutcome> for ApiAnalysis {
    fn from(o: AnalysisOutcome) -> Self {
        Self {
            llm_error: o.llm_error.as_ref().map(ApiError::from),
            persistence_warning: o.persistence_warning.as_ref().map(ApiError::from),
            persisted: o.persisted,
            record: o.record,
        }
    }
}

async fn create_analysis(
    State(state): State<AppState>,
    Json(req): Json<AnalysisRequest>,
) -> Result<Json<ApiAnalysis>, StatusCode> {
    if req.pairs.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let outcome = state
        .service
        .run_analysis(req)
        .await
        .map_err(internal_error)?;
    Ok(Json(outcome.into()))
}

#[derive(Debug, Deserialize)]
struct OwnerQuery {
    user_id: Uuid,
}

async fn list_analyses(
    State(state): State<AppState>,
    Query(q): Query<OwnerQuery>,
) -> Result<Json<Vec<AnalysisSummary>>, StatusCode> {
    let Some(history) = &state.history else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };
    let items = history.list(q.user_id).await.map_err(internal_error)?;
    Ok(Json(items))
}

/// Records owned by someone else answer 404, same as a missing id.
async fn get_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(q): Query<OwnerQuery>,
) -> Result<Json<AnalysisRecord>, StatusCode> {
    let Some(history) = &state.history else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };
    let record = history
        .get(id)
        .await
        .map_err(internal_error)?
        .filter(|r| r.user_id == Some(q.user_id))
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(record))
}

async fn delete_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(q): Query<OwnerQuery>,
) -> Result<StatusCode, StatusCode> {
    let Some(history) = &state.history else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };
    if history.delete(id, q.user_id).await.map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &fxmacro_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxmacro_core::aggregate::Aggregator;
    use fxmacro_core::config::Settings;
    use fxmacro_core::domain::record::AnalysisOptions;
    use fxmacro_core::storage::{MemoryHistoryStore, MemoryUserStore};

    fn state(with_db: bool) -> AppState {
        let aggregator = Aggregator::from_settings(&Settings::default()).unwrap();
        let history: Option<Arc<dyn HistoryStore>> =
            with_db.then(|| Arc::new(MemoryHistoryStore::new()) as Arc<dyn HistoryStore>);
        AppState {
            service: AnalysisService::new(aggregator, None, history.clone()),
            history,
            auth: with_db.then(|| Authenticator::new(Arc::new(MemoryUserStore::new()))),
        }
    }

    #[tokio::test]
    async fn degraded_mode_answers_503() {
        let s = state(false);
        let err = list_analyses(State(s.clone()), Query(OwnerQuery { user_id: Uuid::new_v4() }))
            .await
            .unwrap_err();
        assert_eq!(err, StatusCode::SERVICE_UNAVAILABLE);

        let err = login(
            State(s),
            Json(LoginRequest {
                username: "a".to_string(),
                password: "b".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn bad_credentials_answer_401() {
        let s = state(true);
        s.auth
            .as_ref()
            .unwrap()
            .register("marco", "pw", None)
            .await
            .unwrap();

        let err = login(
            State(s.clone()),
            Json(LoginRequest {
                username: "marco".to_string(),
                password: "wrong".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err, StatusCode::UNAUTHORIZED);

        let Json(user) = login(
            State(s),
            Json(LoginRequest {
                username: "marco".to_string(),
                password: "pw".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(user.username, "marco");
    }

    #[tokio::test]
    async fn created_analysis_can_be_listed_fetched_and_deleted() {
        let s = state(true);
        let user_id = Uuid::new_v4();
        let req = AnalysisRequest {
            pairs: vec!["EUR/USD".parse().unwrap()],
            options: AnalysisOptions {
                links: true,
                ..Default::default()
            },
            links: vec!["https://example.test".to_string()],
            user_id: Some(user_id),
        };
        let Json(created) = create_analysis(State(s.clone()), Json(req)).await.unwrap();
        assert!(created.persisted);
        let id = created.record.id;

        let Json(list) = list_analyses(State(s.clone()), Query(OwnerQuery { user_id }))
            .await
            .unwrap();
        assert_eq!(list.len(), 1);

        let Json(got) = get_analysis(State(s.clone()), Path(id), Query(OwnerQuery { user_id }))
            .await
            .unwrap();
        assert_eq!(got.data.payload.links, vec!["https://example.test"]);

        let other = Uuid::new_v4();
        let err = get_analysis(State(s.clone()), Path(id), Query(OwnerQuery { user_id: other }))
            .await
            .unwrap_err();
        assert_eq!(err, StatusCode::NOT_FOUND);
        let err = delete_analysis(State(s.clone()), Path(id), Query(OwnerQuery { user_id: other }))
            .await
            .unwrap_err();
        assert_eq!(err, StatusCode::NOT_FOUND);
        let ok = delete_analysis(State(s.clone()), Path(id), Query(OwnerQuery { user_id }))
            .await
            .unwrap();
        assert_eq!(ok, StatusCode::NO_CONTENT);
        let err = get_analysis(State(s), Path(id), Query(OwnerQuery { user_id }))
            .await
            .unwrap_err();
        assert_eq!(err, StatusCode::NOT_FOUND);
    }
}
