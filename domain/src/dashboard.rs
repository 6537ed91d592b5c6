//! Per-user overview across every meeting the user hosted or joined.

use crate::error::Error;
use crate::remote::Remote;
use crate::session::Session;
use crate::Id;
use entity::action_item_status::ActionItemStatus;
use entity::meeting_status::MeetingStatus;
use serde::Serialize;
use std::collections::HashSet;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct MeetingSummary {
    #[schema(value_type = Uuid)]
    pub id: Id,
    pub code: String,
    pub title: String,
    pub status: MeetingStatus,
    /// Distinct people who ever joined.
    pub participant_count: usize,
    pub action_item_count: usize,
    pub duration_seconds: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct DashboardSummary {
    pub total_meetings: usize,
    /// Sum over meetings that have both started and ended.
    pub total_duration_seconds: i64,
    /// `total_duration_seconds` as `"18h 42m"`.
    pub total_duration: String,
    pub action_items_completed: usize,
    pub total_action_items: usize,
    /// Newest first.
    pub meetings: Vec<MeetingSummary>,
}

pub async fn summary(remote: &dyn Remote, session: &Session) -> Result<DashboardSummary, Error> {
    let meetings = remote.meetings_for_member(session.user_id).await?;

    let mut rows = Vec::with_capacity(meetings.len());
    let mut total_duration_seconds = 0;
    let mut action_items_completed = 0;
    let mut total_action_items = 0;

    for meeting in meetings {
        let participants = remote.list_participants(meeting.id, true).await?;
        let action_items = remote.list_action_items(meeting.id).await?;

        let duration_seconds = meeting.duration_seconds();
        total_duration_seconds += duration_seconds.unwrap_or(0);
        total_action_items += action_items.len();
        action_items_completed += action_items
            .iter()
            .filter(|item| item.status == ActionItemStatus::Completed)
            .count();

        rows.push(MeetingSummary {
            id: meeting.id,
            code: meeting.code,
            title: meeting.title,
            status: meeting.status,
            participant_count: participants
                .iter()
                .map(|p| p.user_id)
                .collect::<HashSet<_>>()
                .len(),
            action_item_count: action_items.len(),
            duration_seconds,
        });
    }

    Ok(DashboardSummary {
        total_meetings: rows.len(),
        total_duration_seconds,
        total_duration: format_duration(total_duration_seconds),
        action_items_completed,
        total_action_items,
        meetings: rows,
    })
}

/// `"45m"` below an hour, `"1h 23m"` from there on.
pub fn format_duration(seconds: i64) -> String {
    let minutes = seconds.max(0) / 60;
    match (minutes / 60, minutes % 60) {
        (0, minutes) => format!("{minutes}m"),
        (hours, minutes) => format!("{hours}h {minutes}m"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_item::ActionItemBoard;
    use crate::meeting::MeetingRoom;
    use crate::remote::memory::MemoryRemote;
    use crate::remote::NewActionItem;

    #[test]
    fn durations_read_like_the_dashboard_cards() {
        assert_eq!(format_duration(0), "0m");
        assert_eq!(format_duration(45 * 60 + 59), "45m");
        assert_eq!(format_duration(18 * 3600 + 42 * 60), "18h 42m");
    }

    #[tokio::test]
    async fn summary_counts_hosted_and_joined_meetings() {
        let remote = MemoryRemote::new();
        let jane = Session::new(Id::new_v4(), "jane@acme.io", "Jane");
        let alice = Session::new(Id::new_v4(), "alice@acme.io", "Alice");

        let mut jane_room = MeetingRoom::new(remote.clone(), jane.clone());
        let retro = jane_room.create("Retro").await.unwrap();
        jane_room.join(&retro, "").await.unwrap();

        let mut alice_room = MeetingRoom::new(remote.clone(), alice.clone());
        alice_room.join(&retro, "Alice").await.unwrap();
        alice_room.create("Alice's own").await.unwrap();

        let mut board = ActionItemBoard::new(remote.clone(), jane.clone());
        board.load(&retro).await.unwrap();
        let item = board
            .add(NewActionItem {
                title: "Follow up".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        board.toggle(item.id).await.unwrap();
        board
            .add(NewActionItem {
                title: "Write notes".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let jane_summary = summary(remote.as_ref(), &jane).await.unwrap();
        let alice_summary = summary(remote.as_ref(), &alice).await.unwrap();

        assert_eq!(jane_summary.total_meetings, 1);
        assert_eq!(jane_summary.meetings[0].participant_count, 2);
        assert_eq!(jane_summary.action_items_completed, 1);
        assert_eq!(jane_summary.total_action_items, 2);
        assert_eq!(alice_summary.total_meetings, 2);
        assert_eq!(alice_summary.meetings[0].title, "Alice's own");
    }
}
