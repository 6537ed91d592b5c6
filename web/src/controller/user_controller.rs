use crate::controller::ApiResponse;
use crate::params::user::ConfirmParams;
use crate::{AppState, Error};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::user::{self as UserApi, SignUp};
use domain::Session;
use log::*;
use serde_json::json;

/// POST register a new account
#[utoipa::path(
    post,
    path = "/signup",
    request_body = domain::user::SignUp,
    responses(
        (status = 201, description = "Successfully created the account"),
        (status = 409, description = "An account with this email already exists"),
        (status = 422, description = "Malformed email or password shorter than 6 characters"),
        (status = 503, description = "Service temporarily unavailable")
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    Json(params): Json<SignUp>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST sign up {:?}", params.email);

    let user = UserApi::sign_up(app_state.db_conn_ref(), &app_state.config, params).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            StatusCode::CREATED.into(),
            json!({
                "user": Session::from(&user),
                "email_confirmation_required": !user.is_confirmed(),
            }),
        )),
    ))
}

/// GET confirm an email address with the token from the confirmation link
#[utoipa::path(
    get,
    path = "/signup/confirm",
    params(ConfirmParams),
    responses(
        (status = 200, description = "Email address confirmed, the account can log in"),
        (status = 404, description = "Unknown confirmation token"),
        (status = 503, description = "Service temporarily unavailable")
    )
)]
pub async fn confirm(
    State(app_state): State<AppState>,
    Query(params): Query<ConfirmParams>,
) -> Result<impl IntoResponse, Error> {
    let user = UserApi::confirm(app_state.db_conn_ref(), &params.token).await?;
    info!("User {} confirmed their email address", user.id);

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        Session::from(&user),
    )))
}
