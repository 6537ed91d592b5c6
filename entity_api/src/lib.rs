use chrono::Utc;
use log::*;
use sea_orm::DatabaseConnection;

pub use entity::{
    action_items, meetings, mind_maps, participants, recordings, transcripts, users, Id,
};

pub mod action_item;
pub mod error;
pub mod meeting;
pub mod mind_map;
pub mod mutate;
pub mod participant;
pub mod recording;
pub mod transcript;
pub mod user;

use entity::action_item_priority::Priority;
use entity::action_item_status::ActionItemStatus;
use entity::meeting_status::MeetingStatus;
use entity::mind_map_document::MindMapDocument;
use entity::presence_status::PresenceStatus;

/// Populates an empty database with two confirmed demo accounts and one
/// meeting that already carries a transcript, action items and a mind map.
pub async fn seed_database(db: &DatabaseConnection) -> Result<(), error::Error> {
    let now = Utc::now();

    let host = user::create(
        db,
        users::Model {
            id: Id::nil(),
            email: "host@meetinghub.dev".to_owned(),
            display_name: Some("Jane Host".to_owned()),
            password: "password".to_owned(),
            email_confirmed_at: None,
            confirmation_token: None,
            created_at: now.into(),
            updated_at: now.into(),
        },
        true,
    )
    .await?;

    let guest = user::create(
        db,
        users::Model {
            id: Id::nil(),
            email: "alice@meetinghub.dev".to_owned(),
            display_name: Some("Alice".to_owned()),
            password: "password".to_owned(),
            email_confirmed_at: None,
            confirmation_token: None,
            created_at: now.into(),
            updated_at: now.into(),
        },
        true,
    )
    .await?;

    let meeting = meeting::create(
        db,
        meetings::Model {
            id: Id::nil(),
            code: "demo0meeting0code000000000".to_owned(),
            title: "Q4 Planning".to_owned(),
            status: MeetingStatus::Waiting,
            host_id: host.id,
            scheduled_for: None,
            started_at: None,
            ended_at: None,
            created_at: now.into(),
            updated_at: now.into(),
        },
    )
    .await?;
    let meeting = meeting::update_status(db, meeting.id, MeetingStatus::Active).await?;

    for member in [&host, &guest] {
        participant::create(
            db,
            participants::Model {
                id: Id::nil(),
                meeting_id: meeting.id,
                user_id: member.id,
                name: member.default_name(),
                is_muted: false,
                is_video_on: true,
                is_speaking: false,
                status: PresenceStatus::Online,
                joined_at: now.into(),
                left_at: None,
            },
        )
        .await?;
    }

    for (speaker, content) in [
        (&host, "Welcome everyone, let's go through the Q4 goals."),
        (&guest, "I can take the metrics review."),
    ] {
        transcript::create(
            db,
            transcripts::Model {
                id: Id::nil(),
                meeting_id: meeting.id,
                speaker_name: speaker.default_name(),
                content: content.to_owned(),
                timestamp: Utc::now().into(),
                created_at: now.into(),
            },
        )
        .await?;
    }

    action_item::create(
        db,
        action_items::Model {
            id: Id::nil(),
            meeting_id: meeting.id,
            title: "Review metrics".to_owned(),
            description: Some("Pull the Q3 dashboard numbers".to_owned()),
            status: ActionItemStatus::Pending,
            priority: Priority::High,
            context: Some("Agreed during goal review".to_owned()),
            assigned_to: Some(guest.id),
            created_by: host.id,
            due_date: chrono::NaiveDate::from_ymd_opt(2024, 2, 15),
            created_at: now.into(),
            updated_at: now.into(),
        },
    )
    .await?;

    mind_map::create(
        db,
        mind_maps::Model {
            id: Id::nil(),
            meeting_id: meeting.id,
            title: "Q4 Goals".to_owned(),
            content: MindMapDocument::with_central_topic("Q4 Goals"),
            version: 1,
            created_by: host.id,
            created_at: now.into(),
            updated_at: now.into(),
        },
    )
    .await?;

    info!("Seeded demo meeting {} hosted by {}", meeting.code, host.email);

    Ok(())
}
