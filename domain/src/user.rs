use crate::error::{EntityErrorKind, Error};
use crate::{users, Id};
use email_address::EmailAddress;
use log::*;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use service::config::Config;
use utoipa::ToSchema;

pub use entity_api::user::{find_by_email, find_by_id, AuthSession, Backend, Credentials};

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[schema(as = domain::user::SignUp)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

fn validate(params: &SignUp) -> Result<(), Error> {
    if !EmailAddress::is_valid(params.email.trim()) {
        warn!("Rejecting sign-up with malformed email address");
        return Err(Error::entity(EntityErrorKind::Invalid));
    }
    if params.password.chars().count() < MIN_PASSWORD_LENGTH {
        warn!("Rejecting sign-up with a password shorter than {MIN_PASSWORD_LENGTH}");
        return Err(Error::entity(EntityErrorKind::Invalid));
    }
    Ok(())
}

/// Registers an account. When the config asks for email confirmation the
/// account stays locked until the logged confirmation link is visited.
pub async fn sign_up(
    db: &DatabaseConnection,
    config: &Config,
    params: SignUp,
) -> Result<users::Model, Error> {
    validate(&params)?;

    let now = chrono::Utc::now();
    let user = entity_api::user::create(
        db,
        users::Model {
            id: Id::nil(),
            email: params.email,
            display_name: params
                .display_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            password: params.password,
            email_confirmed_at: None,
            confirmation_token: None,
            created_at: now.into(),
            updated_at: now.into(),
        },
        !config.require_email_confirmation,
    )
    .await?;

    match &user.confirmation_token {
        Some(token) => info!(
            "User {} must confirm their email address: {}",
            user.id,
            config.confirmation_url(token)
        ),
        None => info!("User {} signed up", user.id),
    }

    Ok(user)
}

pub async fn confirm(db: &DatabaseConnection, token: &str) -> Result<users::Model, Error> {
    Ok(entity_api::user::confirm_email(db, token).await?)
}
