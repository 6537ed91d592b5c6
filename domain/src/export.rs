//! Downloadable artifacts of a meeting: plain-text transcript, action item
//! CSV, mind map SVG, and a JSON bundle of everything.

use crate::error::Error;
use crate::meeting::find_by_code;
use crate::remote::Remote;
use crate::{action_items, meetings, mind_maps, participants, recordings, transcripts};
use entity::mind_map_document::{MindMapDocument, NodeType};
use serde::Serialize;

pub const CSV_HEADER: &str = "Title,Assignee,Due Date,Priority,Status,Context";

const SVG_WIDTH: u32 = 800;
const SVG_HEIGHT: u32 = 600;

pub fn transcript_filename(code: &str) -> String {
    format!("meeting-transcript-{code}.txt")
}

pub fn action_items_filename(code: &str) -> String {
    format!("action-items-{code}.csv")
}

pub fn mind_map_filename(code: &str) -> String {
    format!("mind-map-{code}.svg")
}

pub fn meeting_filename(code: &str) -> String {
    format!("meeting-{code}.json")
}

/// One `[HH:MM:SS] Speaker: text` line per entry, separated by blank lines.
pub fn transcript_text(entries: &[transcripts::Model]) -> String {
    entries
        .iter()
        .map(|entry| {
            format!(
                "[{}] {}: {}",
                entry.timestamp.format("%H:%M:%S"),
                entry.speaker_name,
                entry.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// An action item as it appears in the CSV export.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionItemRow {
    pub title: String,
    pub assignee: String,
    pub due_date: String,
    pub priority: String,
    pub status: String,
    pub context: String,
}

/// Resolves assignees to the name they used in the meeting.
pub fn action_item_rows(
    items: &[action_items::Model],
    participants: &[participants::Model],
) -> Vec<ActionItemRow> {
    items
        .iter()
        .map(|item| {
            let assignee = item
                .assigned_to
                .and_then(|user_id| participants.iter().find(|p| p.user_id == user_id))
                .map(|p| p.name.clone())
                .unwrap_or_else(|| "Unassigned".to_string());

            ActionItemRow {
                title: item.title.clone(),
                assignee,
                due_date: item
                    .due_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
                priority: item.priority.to_string(),
                status: item.status.to_string(),
                context: item.context.clone().unwrap_or_default(),
            }
        })
        .collect()
}

/// Header line, then one fully quoted line per row in the given order.
pub fn action_items_csv(rows: &[ActionItemRow]) -> Result<String, Error> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(vec![]);

    for row in rows {
        writer.write_record([
            &row.title,
            &row.assignee,
            &row.due_date,
            &row.priority,
            &row.status,
            &row.context,
        ])?;
    }

    let body = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    let mut csv = String::with_capacity(CSV_HEADER.len() + 1 + body.len());
    csv.push_str(CSV_HEADER);
    csv.push('\n');
    csv.push_str(&String::from_utf8_lossy(&body));
    Ok(csv)
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Renders the canvas: connections as lines below nodes drawn as labelled circles.
pub fn mind_map_svg(document: &MindMapDocument) -> String {
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{SVG_WIDTH}\" height=\"{SVG_HEIGHT}\" viewBox=\"0 0 {SVG_WIDTH} {SVG_HEIGHT}\">\n"
    );
    svg.push_str("  <rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\n");

    for connection in &document.connections {
        let (Some(from), Some(to)) = (
            document.node(&connection.from),
            document.node(&connection.to),
        ) else {
            continue;
        };
        svg.push_str(&format!(
            "  <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#94a3b8\" stroke-width=\"2\"/>\n",
            from.x, from.y, to.x, to.y
        ));
    }

    for node in &document.nodes {
        let radius = if node.node_type == NodeType::Central { 50 } else { 36 };
        let color = node.color.as_deref().unwrap_or("#64748b");
        svg.push_str(&format!(
            "  <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{radius}\" fill=\"{}\"/>\n",
            node.x,
            node.y,
            escape_xml(color)
        ));
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" dominant-baseline=\"middle\" font-size=\"12\" fill=\"#ffffff\">{}</text>\n",
            node.x,
            node.y,
            escape_xml(&node.text)
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

/// Everything recorded about a meeting.
#[derive(Debug, Serialize)]
pub struct MeetingExport {
    pub meeting: meetings::Model,
    pub participants: Vec<participants::Model>,
    pub transcript: Vec<transcripts::Model>,
    pub action_items: Vec<action_items::Model>,
    pub mind_maps: Vec<mind_maps::Model>,
    pub recordings: Vec<recordings::Model>,
}

impl MeetingExport {
    /// Reads every table for the meeting, departed participants included.
    /// Action items come out in insertion order.
    pub async fn gather(remote: &dyn Remote, code: &str) -> Result<Self, Error> {
        let meeting = find_by_code(remote, code).await?;

        // Listed newest first; flip before the stable sort so equal
        // timestamps keep their insertion order.
        let mut action_items = remote.list_action_items(meeting.id).await?;
        action_items.reverse();
        action_items.sort_by_key(|item| item.created_at);

        Ok(Self {
            participants: remote.list_participants(meeting.id, true).await?,
            transcript: remote.list_transcripts(meeting.id).await?,
            action_items,
            mind_maps: remote.list_mind_maps(meeting.id).await?,
            recordings: remote.list_recordings(meeting.id).await?,
            meeting,
        })
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The newest mind map, the one shown on the call page.
    pub fn current_mind_map(&self) -> Option<&mind_maps::Model> {
        self.mind_maps.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Id;
    use chrono::{DateTime, FixedOffset};
    use entity::mind_map_document::{MindMapNode, CENTRAL_NODE_ID};

    fn at(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    fn entry(speaker: &str, content: &str, timestamp: &str) -> transcripts::Model {
        transcripts::Model {
            id: Id::new_v4(),
            meeting_id: Id::nil(),
            speaker_name: speaker.to_string(),
            content: content.to_string(),
            timestamp: at(timestamp),
            created_at: at(timestamp),
        }
    }

    #[test]
    fn transcript_lines_are_separated_by_blank_lines() {
        let text = transcript_text(&[
            entry("John Doe", "Let me start.", "2024-02-01T10:00:05+00:00"),
            entry("Jane Smith", "I agree.", "2024-02-01T10:02:41+00:00"),
        ]);

        assert_eq!(
            text,
            "[10:00:05] John Doe: Let me start.\n\n[10:02:41] Jane Smith: I agree."
        );
    }

    #[test]
    fn csv_has_header_and_quoted_rows_in_insertion_order() {
        let rows = vec![
            ActionItemRow {
                title: "Review metrics".to_string(),
                assignee: "Jane".to_string(),
                due_date: "2024-02-15".to_string(),
                priority: "high".to_string(),
                status: "pending".to_string(),
                context: "Raised during goal review, \"urgent\"".to_string(),
            },
            ActionItemRow {
                title: "Prepare budget".to_string(),
                assignee: "John".to_string(),
                due_date: "2024-02-10".to_string(),
                priority: "medium".to_string(),
                status: "in_progress".to_string(),
                context: "Q1".to_string(),
            },
        ];

        let csv = action_items_csv(&rows).unwrap();
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Title,Assignee,Due Date,Priority,Status,Context");
        assert_eq!(
            lines[1],
            r#""Review metrics","Jane","2024-02-15","high","pending","Raised during goal review, ""urgent""""#
        );
        assert_eq!(
            lines[2],
            r#""Prepare budget","John","2024-02-10","medium","in_progress","Q1""#
        );
    }

    #[test]
    fn rows_name_assignees_by_their_meeting_name() {
        let jane = Id::new_v4();
        let now = at("2024-02-01T10:00:00+00:00");
        let participant = participants::Model {
            id: Id::new_v4(),
            meeting_id: Id::nil(),
            user_id: jane,
            name: "Jane".to_string(),
            is_muted: false,
            is_video_on: true,
            is_speaking: false,
            status: Default::default(),
            joined_at: now,
            left_at: Some(now),
        };
        let item = |assigned_to| action_items::Model {
            id: Id::new_v4(),
            meeting_id: Id::nil(),
            title: "Review metrics".to_string(),
            description: None,
            status: Default::default(),
            priority: Default::default(),
            context: None,
            assigned_to,
            created_by: jane,
            due_date: chrono::NaiveDate::from_ymd_opt(2024, 2, 15),
            created_at: now,
            updated_at: now,
        };

        let rows = action_item_rows(&[item(Some(jane)), item(None)], &[participant]);

        assert_eq!(rows[0].assignee, "Jane");
        assert_eq!(rows[0].due_date, "2024-02-15");
        assert_eq!(rows[0].priority, "medium");
        assert_eq!(rows[1].assignee, "Unassigned");
    }

    #[tokio::test]
    async fn gathered_action_items_export_in_insertion_order() {
        use crate::action_item::ActionItemBoard;
        use crate::meeting::MeetingRoom;
        use crate::remote::memory::MemoryRemote;
        use crate::remote::NewActionItem;
        use crate::Session;

        let remote = MemoryRemote::new();
        let session = Session::new(Id::new_v4(), "jane@acme.io", "Jane");
        let mut room = MeetingRoom::new(remote.clone(), session.clone());
        let code = room.create("Q4 Planning").await.unwrap();
        let mut board = ActionItemBoard::new(remote.clone(), session);
        board.load(&code).await.unwrap();
        for title in ["Review metrics", "Prepare budget"] {
            board
                .add(NewActionItem {
                    title: title.to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let export = MeetingExport::gather(remote.as_ref(), &code).await.unwrap();
        let rows = action_item_rows(&export.action_items, &export.participants);
        let csv = action_items_csv(&rows).unwrap();
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with(r#""Review metrics","Jane","#), "{}", lines[1]);
        assert!(lines[2].starts_with(r#""Prepare budget","Jane","#), "{}", lines[2]);
    }

    #[test]
    fn svg_draws_connections_and_escapes_labels() {
        let mut document = MindMapDocument::with_central_topic("R&D <2025>");
        document.push_node(MindMapNode {
            id: "node_1".to_string(),
            text: "Budget".to_string(),
            x: 120.0,
            y: 200.0,
            node_type: NodeType::Branch,
            parent_id: Some(CENTRAL_NODE_ID.to_string()),
            color: Some("hsl(120, 70%, 60%)".to_string()),
        });

        let svg = mind_map_svg(&document);

        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"800\" height=\"600\""));
        assert!(svg.contains("R&amp;D &lt;2025&gt;"));
        assert!(svg.contains("<line x1=\"400.0\" y1=\"300.0\" x2=\"120.0\" y2=\"200.0\""));
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.trim_end().ends_with("</svg>"));
    }
}
