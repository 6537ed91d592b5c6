//! Mind maps of one meeting.
//!
//! Every node addition rewrites the whole document. Writes carry the
//! document version they were based on; a write based on a stale version
//! is refused by the store, and the board re-reads, re-applies its node and
//! tries again a bounded number of times.

use crate::error::{EntityErrorKind, Error};
use crate::meeting::find_by_code;
use crate::notice::Notices;
use crate::remote::Remote;
use crate::session::Session;
use crate::{decode_record, drain_pending, mind_maps, Id};
use entity::mind_map_document::{MindMapDocument, MindMapNode, NodeType};
use events::{ChangeKind, FeedFilter, RowChange, Subscription, Table};
use log::*;
use rand::Rng;
use std::sync::Arc;

pub const MAX_WRITE_ATTEMPTS: usize = 3;

pub struct MindMapBoard {
    remote: Arc<dyn Remote>,
    session: Session,
    meeting_id: Option<Id>,
    /// Newest first.
    maps: Vec<mind_maps::Model>,
    current_id: Option<Id>,
    subscription: Option<Subscription>,
    notices: Notices,
}

impl MindMapBoard {
    pub fn new(remote: Arc<dyn Remote>, session: Session) -> Self {
        Self {
            remote,
            session,
            meeting_id: None,
            maps: Vec::new(),
            current_id: None,
            subscription: None,
            notices: Notices::default(),
        }
    }

    pub fn maps(&self) -> &[mind_maps::Model] {
        &self.maps
    }

    /// The map on display: the newest one unless another was selected.
    pub fn current(&self) -> Option<&mind_maps::Model> {
        self.current_id
            .and_then(|id| self.maps.iter().find(|m| m.id == id))
    }

    pub fn select(&mut self, id: Id) -> bool {
        if self.maps.iter().any(|m| m.id == id) {
            self.current_id = Some(id);
            true
        } else {
            false
        }
    }

    pub fn notices(&mut self) -> &mut Notices {
        &mut self.notices
    }

    pub async fn load(&mut self, code: &str) -> Result<(), Error> {
        let meeting = find_by_code(self.remote.as_ref(), code).await?;
        let subscription = self.remote.subscribe(
            FeedFilter::table(Table::MindMaps, meeting.id)
                .kinds([ChangeKind::Insert, ChangeKind::Update]),
        );
        let maps = self
            .remote
            .list_mind_maps(meeting.id)
            .await
            .inspect_err(|err| warn!("Error loading mind maps: {err:?}"))?;

        self.meeting_id = Some(meeting.id);
        self.current_id = maps.first().map(|m| m.id);
        self.maps = maps;
        self.subscription = Some(subscription);
        Ok(())
    }

    /// Creates a map holding a single central node and makes it current.
    pub async fn create(
        &mut self,
        title: &str,
        central_topic: &str,
    ) -> Result<mind_maps::Model, Error> {
        let (title, central_topic) = (title.trim(), central_topic.trim());
        if title.is_empty() || central_topic.is_empty() {
            return Err(Error::entity(EntityErrorKind::Invalid));
        }
        let meeting_id = self
            .meeting_id
            .ok_or_else(|| Error::entity(EntityErrorKind::NotFound))?;

        match self
            .remote
            .insert_mind_map(
                &self.session,
                meeting_id,
                title.to_string(),
                MindMapDocument::with_central_topic(central_topic),
            )
            .await
        {
            Ok(mind_map) => {
                self.upsert(mind_map.clone());
                self.current_id = Some(mind_map.id);
                self.notices
                    .info("Mind Map Created", "New mind map has been created successfully");
                Ok(mind_map)
            }
            Err(err) => {
                warn!("Error creating mind map: {err:?}");
                self.notices.error("Failed to create mind map");
                Err(err)
            }
        }
    }

    /// Adds a node to the current map. With a parent the node is a branch
    /// connected to it, without one it is a free-standing leaf.
    pub async fn add_node(
        &mut self,
        text: &str,
        parent_id: Option<&str>,
    ) -> Result<MindMapNode, Error> {
        let text = text.trim();
        let Some(current) = self.current().cloned() else {
            return Err(Error::entity(EntityErrorKind::NotFound));
        };
        if text.is_empty() {
            return Err(Error::entity(EntityErrorKind::Invalid));
        }
        if let Some(parent_id) = parent_id {
            if !current.content.contains_node(parent_id) {
                warn!("Parent node {parent_id} is not in mind map {}", current.id);
                return Err(Error::entity(EntityErrorKind::Invalid));
            }
        }

        let node = new_node(text, parent_id);
        match self.write_node(current, &node).await {
            Ok(mind_map) => {
                self.upsert(mind_map);
                self.notices
                    .info("Node Added", "New idea has been added to the mind map");
                Ok(node)
            }
            Err(err) => {
                warn!("Error adding node: {err:?}");
                self.notices.error("Failed to add node");
                Err(err)
            }
        }
    }

    async fn write_node(
        &mut self,
        mut base: mind_maps::Model,
        node: &MindMapNode,
    ) -> Result<mind_maps::Model, Error> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let mut content = base.content.clone();
            content.push_node(node.clone());

            if let Some(written) = self
                .remote
                .update_mind_map(base.id, base.version, content)
                .await?
            {
                return Ok(written);
            }

            debug!(
                "Mind map {} moved past version {} (attempt {attempt}), re-reading",
                base.id, base.version
            );
            base = self.remote.find_mind_map(base.id).await?;
            self.upsert(base.clone());
        }

        Err(Error::entity(EntityErrorKind::Conflict))
    }

    /// Replaces a cached map unless the incoming copy is older.
    fn upsert(&mut self, mind_map: mind_maps::Model) {
        match self.maps.iter_mut().find(|m| m.id == mind_map.id) {
            Some(existing) if existing.version <= mind_map.version => *existing = mind_map,
            Some(_) => {}
            None => self.maps.insert(0, mind_map),
        }
    }

    pub fn apply(&mut self, change: &RowChange) {
        if Some(change.meeting_id) != self.meeting_id || change.table != Table::MindMaps {
            return;
        }
        if change.kind == ChangeKind::Delete {
            self.maps.retain(|m| m.id != change.record_id);
            if self.current_id == Some(change.record_id) {
                self.current_id = self.maps.first().map(|m| m.id);
            }
            return;
        }
        if let Some(mind_map) = decode_record::<mind_maps::Model>(change) {
            let id = mind_map.id;
            self.upsert(mind_map);
            if self.current_id.is_none() {
                self.current_id = Some(id);
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

/// A node at a random spot of the 800x600 canvas, away from the edges.
fn new_node(text: &str, parent_id: Option<&str>) -> MindMapNode {
    let mut rng = rand::thread_rng();
    MindMapNode {
        id: format!("node_{}", Id::new_v4().simple()),
        text: text.to_string(),
        x: rng.gen_range(100.0..700.0),
        y: rng.gen_range(100.0..500.0),
        node_type: if parent_id.is_some() {
            NodeType::Branch
        } else {
            NodeType::Leaf
        },
        parent_id: parent_id.map(str::to_string),
        color: Some(format!("hsl({}, 70%, 60%)", rng.gen_range(0..360))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meeting::MeetingRoom;
    use crate::remote::memory::MemoryRemote;
    use entity::mind_map_document::CENTRAL_NODE_ID;

    async fn board_with_map() -> (Arc<MemoryRemote>, String, MindMapBoard) {
        let remote = MemoryRemote::new();
        let session = Session::new(Id::new_v4(), "jane@acme.io", "Jane");
        let mut room = MeetingRoom::new(remote.clone(), session.clone());
        let code = room.create("Q4 Planning").await.unwrap();

        let mut board = MindMapBoard::new(remote.clone(), session);
        board.load(&code).await.unwrap();
        board.create("Goals", "Q4 Goals").await.unwrap();
        (remote, code, board)
    }

    #[tokio::test]
    async fn create_seeds_one_central_node() {
        let (_remote, _code, board) = board_with_map().await;

        let current = board.current().unwrap();
        assert_eq!(current.version, 1);
        assert_eq!(current.content.nodes.len(), 1);
        let central = current.content.central_node().unwrap();
        assert_eq!(central.id, CENTRAL_NODE_ID);
        assert_eq!((central.x, central.y), (400.0, 300.0));
    }

    #[tokio::test]
    async fn node_count_tracks_successful_additions_and_parents_resolve() {
        let (_remote, _code, mut board) = board_with_map().await;

        let budget = board.add_node("Budget", Some(CENTRAL_NODE_ID)).await.unwrap();
        board.add_node("Hiring", Some(&budget.id)).await.unwrap();
        board.add_node("Loose idea", None).await.unwrap();
        assert!(board.add_node("Orphan", Some("node_missing")).await.is_err());
        assert!(board.add_node("   ", None).await.is_err());

        let content = &board.current().unwrap().content;
        assert_eq!(content.nodes.len(), 1 + 3);
        for node in content.nodes.iter().filter(|n| n.node_type != NodeType::Central) {
            if let Some(parent_id) = &node.parent_id {
                assert!(content.contains_node(parent_id));
            }
        }
        assert_eq!(content.connections.len(), 2);
    }

    #[tokio::test]
    async fn node_type_and_position_follow_the_canvas_rules() {
        let (_remote, _code, mut board) = board_with_map().await;

        let branch = board.add_node("Budget", Some(CENTRAL_NODE_ID)).await.unwrap();
        let leaf = board.add_node("Loose idea", None).await.unwrap();

        assert_eq!(branch.node_type, NodeType::Branch);
        assert_eq!(leaf.node_type, NodeType::Leaf);
        for node in [&branch, &leaf] {
            assert!((100.0..700.0).contains(&node.x));
            assert!((100.0..500.0).contains(&node.y));
        }
    }

    #[tokio::test]
    async fn concurrent_write_is_reapplied_without_losing_either_node() {
        let (remote, _code, mut board) = board_with_map().await;
        remote.lose_next_mind_map_writes(1);

        let node = board.add_node("Budget", Some(CENTRAL_NODE_ID)).await.unwrap();

        let stored = remote.mind_map(board.current().unwrap().id).unwrap();
        assert_eq!(stored.version, 3);
        assert!(stored.content.contains_node(&node.id));
        assert!(stored.content.contains_node("other_1"));
        assert_eq!(board.current().unwrap(), &stored);
    }

    #[tokio::test]
    async fn persistent_conflicts_give_up_after_bounded_attempts() {
        let (remote, _code, mut board) = board_with_map().await;
        remote.lose_next_mind_map_writes(MAX_WRITE_ATTEMPTS as u32);

        let result = board.add_node("Budget", None).await;

        assert_eq!(
            result.unwrap_err().entity_kind(),
            Some(&EntityErrorKind::Conflict)
        );
        assert_eq!(board.notices().last().unwrap().description, "Failed to add node");
    }

    #[tokio::test]
    async fn stale_update_events_do_not_roll_back_the_document() {
        let (_remote, _code, mut board) = board_with_map().await;
        let original = board.current().unwrap().clone();
        board.add_node("Budget", None).await.unwrap();

        // The v1 insert echo and the v2 update echo are both still queued.
        board.sync();
        board.apply(&RowChange::update(
            Table::MindMaps,
            original.meeting_id,
            original.id,
            serde_json::to_value(&original).unwrap(),
        ));

        let current = board.current().unwrap();
        assert_eq!(current.version, 2);
        assert_eq!(current.content.nodes.len(), 2);
    }

    #[tokio::test]
    async fn newest_map_is_current_after_load() {
        let (remote, code, mut board) = board_with_map().await;
        board.create("Risks", "Q4 Risks").await.unwrap();

        let mut fresh = MindMapBoard::new(
            remote.clone(),
            Session::new(Id::new_v4(), "alice@acme.io", "Alice"),
        );
        fresh.load(&code).await.unwrap();

        assert_eq!(fresh.maps().len(), 2);
        assert_eq!(fresh.current().unwrap().title, "Risks");
    }
}
