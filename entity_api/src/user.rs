use super::error::{EntityApiErrorKind, Error};
use async_trait::async_trait;
use axum_login::{AuthnBackend, UserId};
use chrono::Utc;

use entity::users::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use rand::{distributions::Alphanumeric, Rng};
use sea_orm::{entity::prelude::*, ConnectionTrait, DatabaseConnection, Set, TryIntoModel};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

const CONFIRMATION_TOKEN_LENGTH: usize = 32;

/// Inserts a new account. When `confirmed` is false the account receives a
/// confirmation token and cannot log in until [`confirm_email`] is called.
pub async fn create(
    db: &impl ConnectionTrait,
    user_model: Model,
    confirmed: bool,
) -> Result<Model, Error> {
    debug!("New User Model to be inserted: {}", user_model.email);

    if find_by_email(db, &user_model.email).await?.is_some() {
        return Err(Error {
            source: None,
            error_kind: EntityApiErrorKind::RecordAlreadyExists,
        });
    }

    let now = Utc::now();
    let (email_confirmed_at, confirmation_token) = if confirmed {
        (Some(now.into()), None)
    } else {
        (None, Some(generate_confirmation_token()))
    };

    let user_active_model: ActiveModel = ActiveModel {
        id: Set(Id::new_v4()),
        email: Set(user_model.email.trim().to_lowercase()),
        display_name: Set(user_model.display_name),
        password: Set(generate_hash(user_model.password)),
        email_confirmed_at: Set(email_confirmed_at),
        confirmation_token: Set(confirmation_token),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(user_active_model.insert(db).await?.try_into_model()?)
}

pub async fn find_by_email(db: &impl ConnectionTrait, email: &str) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

/// Marks the account owning `token` as confirmed and clears the token.
pub async fn confirm_email(db: &impl ConnectionTrait, token: &str) -> Result<Model, Error> {
    let user = Entity::find()
        .filter(Column::ConfirmationToken.eq(token))
        .one(db)
        .await?
        .ok_or_else(|| Error {
            source: None,
            error_kind: EntityApiErrorKind::RecordNotFound,
        })?;

    info!("Confirming email address for user {}", user.id);

    let now = Utc::now();
    let mut active_model: ActiveModel = user.into();
    active_model.email_confirmed_at = Set(Some(now.into()));
    active_model.confirmation_token = Set(None);
    active_model.updated_at = Set(now.into());

    Ok(active_model.update(db).await?.try_into_model()?)
}

pub fn generate_hash(password: String) -> String {
    password_auth::generate_hash(password)
}

fn generate_confirmation_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CONFIRMATION_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

fn authenticate_user(creds: Credentials, user: Model) -> Result<Option<Model>, Error> {
    if password_auth::verify_password(creds.password, &user.password).is_err() {
        return Err(Error {
            source: None,
            error_kind: EntityApiErrorKind::RecordUnauthenticated,
        });
    }

    if !user.is_confirmed() {
        return Err(Error {
            source: None,
            error_kind: EntityApiErrorKind::RecordUnconfirmed,
        });
    }

    Ok(Some(user))
}

#[derive(Debug, Clone)]
pub struct Backend {
    db: Arc<DatabaseConnection>,
}

#[derive(Debug, Clone, ToSchema, IntoParams, Deserialize)]
#[schema(as = domain::user::Credentials)] // OpenAPI schema
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

impl Backend {
    pub fn new(db: &Arc<DatabaseConnection>) -> Self {
        Self { db: Arc::clone(db) }
    }
}

#[async_trait]
impl AuthnBackend for Backend {
    type User = Model;
    type Credentials = Credentials;
    type Error = Error;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        match find_by_email(self.db.as_ref(), &creds.email).await? {
            Some(user) => authenticate_user(creds, user),
            None => Err(Error {
                source: None,
                error_kind: EntityApiErrorKind::RecordUnauthenticated,
            }),
        }
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        Ok(Entity::find_by_id(*user_id).one(self.db.as_ref()).await?)
    }
}

pub type AuthSession = axum_login::AuthSession<Backend>;
