use crate::{
    controller::health_check_controller, middleware::auth::require_auth, params, protect,
    sse::handler::sse_handler, AppState,
};
use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::services::ServeDir;

use crate::controller::{
    action_item_controller, dashboard_controller, export_controller, meeting_controller,
    mind_map_controller, participant_controller, recording_controller, transcript_controller,
    user_controller, user_session_controller,
};

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI document. To be a part
// of the rendered document, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Meeting Hub API"
        ),
        paths(
            health_check_controller::health_check,
            user_controller::create,
            user_controller::confirm,
            user_session_controller::login,
            user_session_controller::delete,
            dashboard_controller::read,
            meeting_controller::create,
            meeting_controller::schedule,
            meeting_controller::read,
            meeting_controller::join,
            meeting_controller::leave,
            participant_controller::update_me,
            transcript_controller::index,
            transcript_controller::create,
            action_item_controller::index,
            action_item_controller::create,
            action_item_controller::update,
            action_item_controller::toggle,
            mind_map_controller::index,
            mind_map_controller::create,
            mind_map_controller::add_node,
            recording_controller::index,
            recording_controller::create,
            export_controller::transcript,
            export_controller::action_items,
            export_controller::mind_map,
            export_controller::meeting,
        ),
        components(
            schemas(
                domain::action_items::Model,
                domain::meetings::Model,
                domain::mind_maps::Model,
                domain::participants::Model,
                domain::recordings::Model,
                domain::transcripts::Model,
                domain::users::Model,
                domain::user::Credentials,
                domain::user::SignUp,
                domain::remote::ParticipantChanges,
                domain::remote::NewActionItem,
                domain::remote::ActionItemChanges,
                domain::dashboard::DashboardSummary,
                domain::dashboard::MeetingSummary,
                meeting_controller::RoomView,
                params::meeting::CreateParams,
                params::meeting::ScheduleParams,
                params::meeting::JoinParams,
                params::mind_map::CreateParams,
                params::mind_map::NodeParams,
                params::transcript::CreateParams,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "meeting_hub", description = "Meeting collaboration API")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Defines our cookie session based authentication requirement for gaining access to our
// API endpoints for OpenAPI.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "id",
                    "Session id value returned from successful login via Set-Cookie header",
                ))),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(signup_routes(app_state.clone()))
        .merge(user_session_routes())
        .merge(user_session_protected_routes(app_state.clone()))
        .merge(dashboard_routes(app_state.clone()))
        .merge(lobby_routes(app_state.clone()))
        .merge(call_routes(app_state.clone()))
        .merge(export_routes(app_state.clone()))
        // **** FIXME: protect the OpenAPI web UI
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
        .fallback_service(static_routes())
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn signup_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/signup", post(user_controller::create))
        .route("/signup/confirm", get(user_controller::confirm))
        .with_state(app_state)
}

pub fn user_session_routes() -> Router {
    Router::new().route("/login", post(user_session_controller::login))
}

pub fn user_session_protected_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/user_sessions", delete(user_session_controller::delete))
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

fn dashboard_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/dashboard", get(dashboard_controller::read))
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

/// Creating, scheduling, looking up and joining meetings: anyone signed in
/// who holds the join code.
fn lobby_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/meetings", post(meeting_controller::create))
        .route("/meetings/schedule", post(meeting_controller::schedule))
        .route("/meetings/:code", get(meeting_controller::read))
        .route("/meetings/:code/join", post(meeting_controller::join))
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

/// The call page: limited to people who joined the meeting.
fn call_routes(app_state: AppState) -> Router {
    let max_recording_bytes = app_state.config.max_recording_bytes;
    Router::new()
        .route("/meetings/:code/leave", post(meeting_controller::leave))
        .route(
            "/meetings/:code/participants/me",
            put(participant_controller::update_me),
        )
        .route(
            "/meetings/:code/transcripts",
            get(transcript_controller::index).post(transcript_controller::create),
        )
        .route(
            "/meetings/:code/action_items",
            get(action_item_controller::index).post(action_item_controller::create),
        )
        .route(
            "/meetings/:code/action_items/:id",
            put(action_item_controller::update),
        )
        .route(
            "/meetings/:code/action_items/:id/toggle",
            put(action_item_controller::toggle),
        )
        .route(
            "/meetings/:code/mind_maps",
            get(mind_map_controller::index).post(mind_map_controller::create),
        )
        .route(
            "/meetings/:code/mind_maps/:id/nodes",
            post(mind_map_controller::add_node),
        )
        .route(
            "/meetings/:code/recordings",
            get(recording_controller::index).post(recording_controller::create),
        )
        .route("/meetings/:code/events", get(sse_handler))
        .layer(DefaultBodyLimit::max(max_recording_bytes))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            protect::meetings::participant,
        ))
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

fn export_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/meetings/:code/exports/transcript",
            get(export_controller::transcript),
        )
        .route(
            "/meetings/:code/exports/action_items",
            get(export_controller::action_items),
        )
        .route(
            "/meetings/:code/exports/mind_map",
            get(export_controller::mind_map),
        )
        .route(
            "/meetings/:code/exports/meeting",
            get(export_controller::meeting),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            protect::meetings::participant,
        ))
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

// Serves static files for paths no route matches
pub fn static_routes() -> ServeDir {
    ServeDir::new("./")
}
