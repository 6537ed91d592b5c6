use crate::Id;
use axum_login::AuthUser;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::users::Model)]
#[sea_orm(schema_name = "meeting_hub", table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[schema(value_type = Uuid)]
    pub id: Id,
    #[sea_orm(unique)]
    pub email: String,
    pub display_name: Option<String>,
    #[serde(skip_serializing)]
    pub password: String,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub email_confirmed_at: Option<DateTimeWithTimeZone>,
    #[serde(skip_serializing)]
    pub confirmation_token: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Name shown to other participants when none was typed in: the local part
    /// of the email address, or "Host" when that is empty.
    pub fn default_name(&self) -> String {
        if let Some(display_name) = self.display_name.as_ref().filter(|n| !n.trim().is_empty()) {
            return display_name.trim().to_string();
        }
        match self.email.split('@').next() {
            Some(local) if !local.is_empty() => local.to_string(),
            _ => "Host".to_string(),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::meetings::Entity")]
    Meetings,
    #[sea_orm(has_many = "super::participants::Entity")]
    Participants,
}

impl Related<super::meetings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Meetings.def()
    }
}

impl Related<super::participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl AuthUser for Model {
    type Id = Id;

    fn id(&self) -> Self::Id {
        self.id
    }

    // Changing the password hash invalidates every existing session.
    fn session_auth_hash(&self) -> &[u8] {
        self.password.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str, display_name: Option<&str>) -> Model {
        let now = chrono::Utc::now();
        Model {
            id: Id::new_v4(),
            email: email.to_string(),
            display_name: display_name.map(str::to_string),
            password: "hash".to_string(),
            email_confirmed_at: None,
            confirmation_token: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn default_name_prefers_display_name() {
        assert_eq!(user("jane@acme.io", Some("Jane D")).default_name(), "Jane D");
    }

    #[test]
    fn default_name_falls_back_to_email_local_part() {
        assert_eq!(user("jane@acme.io", None).default_name(), "jane");
        assert_eq!(user("@acme.io", None).default_name(), "Host");
    }
}
