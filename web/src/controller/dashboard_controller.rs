use crate::controller::{remote, ApiResponse};
use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::dashboard;
use log::*;
use service::config::ApiVersion;

/// GET an overview of every meeting the caller hosted or joined
#[utoipa::path(
    get,
    path = "/dashboard",
    params(ApiVersion),
    responses(
        (status = 200, description = "Successfully summarized the caller's meetings", body = domain::dashboard::DashboardSummary),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn read(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let session = user.session();
    debug!("GET Dashboard for user {}", session.user_id);

    let summary = dashboard::summary(remote(&app_state).as_ref(), &session).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), summary)))
}
