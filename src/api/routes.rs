//! REST endpoints for the session, the profile and the current view.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::session::{ProfileUpdate, SessionStore, SignUpRequest};
use crate::views::{Page, current_view, menu_items};

/// Shared state for the session routes.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<SessionStore>,
}

/// Build the session REST routes.
pub fn session_routes(store: Arc<SessionStore>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/session", get(get_session))
        .route("/api/session/sign-in", post(sign_in))
        .route("/api/session/sign-up", post(sign_up))
        .route("/api/session/sign-out", post(sign_out))
        .route("/api/profile", patch(update_profile))
        .route("/api/view", get(get_view))
        .layer(CorsLayer::permissive())
        .with_state(ApiState { store })
}

/// `SessionError` as an HTTP response.
struct ApiError(SessionError);

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SessionError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            SessionError::EmailAlreadyRegistered { .. } => StatusCode::CONFLICT,
            SessionError::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SessionError::StorageUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(error = %self.0, "Session request failed");
        }

        let mut body = serde_json::json!({ "error": self.0.to_string() });
        if let SessionError::ValidationFailed { field } = &self.0 {
            body["field"] = serde_json::json!(field);
        }
        (status, Json(body)).into_response()
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "freelance-hub"
    }))
}

async fn get_session(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.store.snapshot().await)
}

#[derive(Deserialize)]
struct SignInRequest {
    email: String,
    password: SecretString,
}

async fn sign_in(
    State(state): State<ApiState>,
    Json(req): Json<SignInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, profile) = state.store.sign_in(&req.email, &req.password).await?;
    Ok(Json(serde_json::json!({ "user": user, "profile": profile })))
}

async fn sign_up(
    State(state): State<ApiState>,
    Json(req): Json<SignUpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, profile) = state.store.sign_up(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "user": user, "profile": profile })),
    ))
}

async fn sign_out(State(state): State<ApiState>) -> impl IntoResponse {
    state.store.sign_out().await;
    Json(state.store.snapshot().await)
}

async fn update_profile(
    State(state): State<ApiState>,
    Json(update): Json<ProfileUpdate>,
) -> Response {
    match state.store.update_profile(update).await {
        Some(profile) => Json(profile).into_response(),
        None => {
            debug!("PATCH /api/profile without a session");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

#[derive(Deserialize)]
struct ViewQuery {
    #[serde(default)]
    page: Option<String>,
}

/// GET /api/view?page=orders
///
/// The view the session calls for, plus the role menu once signed in.
async fn get_view(
    State(state): State<ApiState>,
    Query(query): Query<ViewQuery>,
) -> impl IntoResponse {
    let page = query.page.as_deref().map(Page::from_id).unwrap_or_default();
    let view = current_view(&state.store, page).await;
    let menu = state
        .store
        .identity()
        .await
        .map(|identity| menu_items(identity.role))
        .unwrap_or_default();
    Json(serde_json::json!({ "view": view, "menu": menu }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::ServiceExt;

    use super::*;
    use crate::session::MockAuthenticator;
    use crate::store::MemoryStorage;

    async fn app() -> (Router, Arc<SessionStore>) {
        let store = SessionStore::open(
            Arc::new(MemoryStorage::new()),
            Arc::new(MockAuthenticator::new()),
        )
        .await;
        (session_routes(store.clone()), store)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn patch_without_session_is_no_content() {
        let (app, store) = app().await;
        let response = app
            .oneshot(json_request("PATCH", "/api/profile", serde_json::json!({"bio": "x"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(store.profile().await.is_none());
    }

    #[tokio::test]
    async fn validation_error_is_422_with_field() {
        let response = ApiError(SessionError::validation("companyName")).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["field"], "companyName");
    }

    #[tokio::test]
    async fn error_statuses() {
        let cases = [
            (SessionError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (
                SessionError::EmailAlreadyRegistered {
                    email: "a@b.c".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                SessionError::StorageUnavailable("gone".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn view_tracks_sign_up_and_onboarding() {
        let (app, store) = app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/session/sign-up",
                serde_json::json!({
                    "email": "ana@example.com",
                    "password": "pw",
                    "firstName": "Ana",
                    "lastName": "Silva",
                    "country": "Brazil",
                    "role": "client"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["profile"]["onboardingCompleted"], false);

        let response = app
            .clone()
            .oneshot(Request::get("/api/view").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await["view"]["view"], "onboarding_client");

        store
            .update_profile(ProfileUpdate {
                onboarding_completed: Some(true),
                ..Default::default()
            })
            .await;
        let response = app
            .oneshot(Request::get("/api/view?page=connections").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["view"]["page"], "connections");
        assert_eq!(body["menu"][0]["label"], "Explore Freelancers");
    }
}
