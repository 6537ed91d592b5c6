use crate::error::{EntityErrorKind, Error};
use crate::meeting::find_by_code;
use crate::notice::Notices;
use crate::remote::{ActionItemChanges, NewActionItem, Remote};
use crate::session::Session;
use crate::{action_items, decode_record, drain_pending, Id, IntoUpdateMap};
use events::{ChangeKind, FeedFilter, RowChange, Subscription, Table};
use log::*;
use std::sync::Arc;

/// Action items of one meeting, newest first.
pub struct ActionItemBoard {
    remote: Arc<dyn Remote>,
    session: Session,
    meeting_id: Option<Id>,
    items: Vec<action_items::Model>,
    subscription: Option<Subscription>,
    notices: Notices,
}

impl ActionItemBoard {
    pub fn new(remote: Arc<dyn Remote>, session: Session) -> Self {
        Self {
            remote,
            session,
            meeting_id: None,
            items: Vec::new(),
            subscription: None,
            notices: Notices::default(),
        }
    }

    pub fn items(&self) -> &[action_items::Model] {
        &self.items
    }

    pub fn get(&self, id: Id) -> Option<&action_items::Model> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn notices(&mut self) -> &mut Notices {
        &mut self.notices
    }

    pub async fn load(&mut self, code: &str) -> Result<(), Error> {
        let meeting = find_by_code(self.remote.as_ref(), code).await?;
        let subscription = self.remote.subscribe(
            FeedFilter::table(Table::ActionItems, meeting.id)
                .kinds([ChangeKind::Insert, ChangeKind::Update]),
        );
        let items = self
            .remote
            .list_action_items(meeting.id)
            .await
            .inspect_err(|err| warn!("Error loading action items: {err:?}"))?;

        self.meeting_id = Some(meeting.id);
        self.items = items;
        self.subscription = Some(subscription);
        Ok(())
    }

    /// Creates a pending item owned by the caller, who is also the default assignee.
    pub async fn add(&mut self, item: NewActionItem) -> Result<action_items::Model, Error> {
        let title = item.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::entity(EntityErrorKind::Invalid));
        }
        let meeting_id = self
            .meeting_id
            .ok_or_else(|| Error::entity(EntityErrorKind::NotFound))?;

        let item = NewActionItem {
            title,
            description: item
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            ..item
        };

        match self
            .remote
            .insert_action_item(&self.session, meeting_id, item)
            .await
        {
            Ok(created) => {
                self.upsert(created.clone(), true);
                self.notices.info(
                    "Action Item Added",
                    "New action item has been created successfully",
                );
                Ok(created)
            }
            Err(err) => {
                warn!("Error adding action item: {err:?}");
                self.notices.error("Failed to add action item");
                Err(err)
            }
        }
    }

    /// Writes `changes` through and patches the cached row right away. The
    /// change event that follows replaces the row again with the same content.
    pub async fn update(
        &mut self,
        id: Id,
        changes: ActionItemChanges,
    ) -> Result<action_items::Model, Error> {
        if self.get(id).is_none() {
            return Err(Error::entity(EntityErrorKind::NotFound));
        }
        if changes.clone().into_update_map().is_empty() {
            return Err(Error::entity(EntityErrorKind::Invalid));
        }

        match self.remote.update_action_item(id, changes.clone()).await {
            Ok(updated) => {
                if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
                    changes.apply_to(item);
                }
                self.upsert(updated.clone(), false);
                self.notices
                    .info("Action Item Updated", "Changes have been saved successfully");
                Ok(updated)
            }
            Err(err) => {
                warn!("Error updating action item {id}: {err:?}");
                self.notices.error("Failed to update action item");
                Err(err)
            }
        }
    }

    /// Flips an item between completed and pending.
    pub async fn toggle(&mut self, id: Id) -> Result<action_items::Model, Error> {
        let status = self
            .get(id)
            .map(|item| item.status.toggled())
            .ok_or_else(|| Error::entity(EntityErrorKind::NotFound))?;
        self.update(id, ActionItemChanges::status(status)).await
    }

    fn upsert(&mut self, item: action_items::Model, prepend: bool) {
        match self.items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None if prepend => self.items.insert(0, item),
            None => {}
        }
    }

    /// Inserts are prepended, updates replace in place without reordering.
    pub fn apply(&mut self, change: &RowChange) {
        if Some(change.meeting_id) != self.meeting_id || change.table != Table::ActionItems {
            return;
        }
        match change.kind {
            ChangeKind::Delete => self.items.retain(|item| item.id != change.record_id),
            kind => {
                if let Some(item) = decode_record::<action_items::Model>(change) {
                    self.upsert(item, kind == ChangeKind::Insert);
                }
            }
        }
    }

    pub fn sync(&mut self) -> usize {
        let changes = drain_pending(self.subscription.as_mut());
        for change in &changes {
            self.apply(change);
        }
        changes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meeting::MeetingRoom;
    use crate::remote::memory::MemoryRemote;
    use entity::action_item_priority::Priority;
    use entity::action_item_status::ActionItemStatus;

    async fn loaded_board() -> (Arc<MemoryRemote>, Session, String, ActionItemBoard) {
        let remote = MemoryRemote::new();
        let session = Session::new(Id::new_v4(), "jane@acme.io", "Jane");
        let mut room = MeetingRoom::new(remote.clone(), session.clone());
        let code = room.create("Q4 Planning").await.unwrap();

        let mut board = ActionItemBoard::new(remote.clone(), session.clone());
        board.load(&code).await.unwrap();
        (remote, session, code, board)
    }

    fn titled(title: &str) -> NewActionItem {
        NewActionItem {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn add_defaults_creator_assignee_and_status() {
        let (_remote, session, _code, mut board) = loaded_board().await;

        let item = board.add(titled("  Review metrics ")).await.unwrap();

        assert_eq!(item.title, "Review metrics");
        assert_eq!(item.status, ActionItemStatus::Pending);
        assert_eq!(item.priority, Priority::Medium);
        assert_eq!(item.created_by, session.user_id);
        assert_eq!(item.assigned_to, Some(session.user_id));
    }

    #[tokio::test]
    async fn add_rejects_blank_titles() {
        let (_remote, _session, _code, mut board) = loaded_board().await;

        let result = board.add(titled("   ")).await;

        assert_eq!(
            result.unwrap_err().entity_kind(),
            Some(&EntityErrorKind::Invalid)
        );
        assert!(board.items().is_empty());
    }

    #[tokio::test]
    async fn own_insert_echo_does_not_duplicate() {
        let (_remote, _session, _code, mut board) = loaded_board().await;

        board.add(titled("First")).await.unwrap();
        board.add(titled("Second")).await.unwrap();
        board.sync();

        let titles: Vec<_> = board.items().iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn completing_then_receiving_the_echo_stays_completed() {
        let (_remote, _session, _code, mut board) = loaded_board().await;
        let item = board.add(titled("Review metrics")).await.unwrap();
        board.sync();

        board
            .update(item.id, ActionItemChanges::status(ActionItemStatus::Completed))
            .await
            .unwrap();
        assert_eq!(board.get(item.id).unwrap().status, ActionItemStatus::Completed);

        board.sync();
        board.sync();

        assert_eq!(board.items().len(), 1);
        assert_eq!(board.get(item.id).unwrap().status, ActionItemStatus::Completed);
    }

    #[tokio::test]
    async fn toggle_flips_status_both_ways() {
        let (_remote, _session, _code, mut board) = loaded_board().await;
        let item = board.add(titled("Ship it")).await.unwrap();

        let toggled = board.toggle(item.id).await.unwrap();
        assert_eq!(toggled.status, ActionItemStatus::Completed);

        let toggled = board.toggle(item.id).await.unwrap();
        assert_eq!(toggled.status, ActionItemStatus::Pending);
    }

    #[tokio::test]
    async fn update_does_not_reorder_and_other_viewers_follow() {
        let (remote, _session, code, mut board) = loaded_board().await;
        let first = board.add(titled("First")).await.unwrap();
        board.add(titled("Second")).await.unwrap();

        let alice = Session::new(Id::new_v4(), "alice@acme.io", "Alice");
        let mut other = ActionItemBoard::new(remote.clone(), alice);
        other.load(&code).await.unwrap();

        board
            .update(
                first.id,
                ActionItemChanges {
                    priority: Some(Priority::High),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        other.sync();

        let titles: Vec<_> = other.items().iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Second", "First"]);
        assert_eq!(other.get(first.id).unwrap().priority, Priority::High);
    }

    #[tokio::test]
    async fn failed_update_leaves_local_state_unchanged() {
        let (remote, _session, _code, mut board) = loaded_board().await;
        let item = board.add(titled("Review metrics")).await.unwrap();
        remote.fail("update_action_item");

        let result = board.toggle(item.id).await;

        assert!(result.is_err());
        assert_eq!(board.get(item.id).unwrap().status, ActionItemStatus::Pending);
        assert_eq!(
            board.notices().last().unwrap().description,
            "Failed to update action item"
        );
    }
}
