use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const ENUM_TYPES: [(&str, &str); 4] = [
    ("meeting_status", "'waiting', 'active', 'ended'"),
    ("presence_status", "'online', 'away', 'busy'"),
    (
        "action_item_status",
        "'pending', 'in_progress', 'completed'",
    ),
    ("action_item_priority", "'low', 'medium', 'high'"),
];

const CREATE_TABLES: [(&str, &str); 7] = [
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS meeting_hub.users (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            email VARCHAR(255) NOT NULL UNIQUE,
            display_name VARCHAR(255),
            password VARCHAR(255) NOT NULL,
            email_confirmed_at TIMESTAMPTZ,
            confirmation_token VARCHAR(64) UNIQUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "meetings",
        r#"
        CREATE TABLE IF NOT EXISTS meeting_hub.meetings (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            code VARCHAR(64) NOT NULL UNIQUE,
            title VARCHAR(255) NOT NULL,
            status meeting_hub.meeting_status NOT NULL DEFAULT 'waiting',
            host_id UUID NOT NULL
                REFERENCES meeting_hub.users(id) ON DELETE CASCADE,
            scheduled_for TIMESTAMPTZ,
            started_at TIMESTAMPTZ,
            ended_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "participants",
        r#"
        CREATE TABLE IF NOT EXISTS meeting_hub.participants (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            meeting_id UUID NOT NULL
                REFERENCES meeting_hub.meetings(id) ON DELETE CASCADE,
            user_id UUID NOT NULL
                REFERENCES meeting_hub.users(id) ON DELETE CASCADE,
            name VARCHAR(255) NOT NULL,
            is_muted BOOLEAN NOT NULL DEFAULT FALSE,
            is_video_on BOOLEAN NOT NULL DEFAULT TRUE,
            is_speaking BOOLEAN NOT NULL DEFAULT FALSE,
            status meeting_hub.presence_status NOT NULL DEFAULT 'online',
            joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            left_at TIMESTAMPTZ
        )
        "#,
    ),
    (
        "transcripts",
        r#"
        CREATE TABLE IF NOT EXISTS meeting_hub.transcripts (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            meeting_id UUID NOT NULL
                REFERENCES meeting_hub.meetings(id) ON DELETE CASCADE,
            speaker_name VARCHAR(255) NOT NULL,
            content TEXT NOT NULL,
            timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "action_items",
        r#"
        CREATE TABLE IF NOT EXISTS meeting_hub.action_items (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            meeting_id UUID NOT NULL
                REFERENCES meeting_hub.meetings(id) ON DELETE CASCADE,
            title VARCHAR(255) NOT NULL,
            description TEXT,
            status meeting_hub.action_item_status NOT NULL DEFAULT 'pending',
            priority meeting_hub.action_item_priority NOT NULL DEFAULT 'medium',
            context TEXT,
            assigned_to UUID REFERENCES meeting_hub.users(id) ON DELETE SET NULL,
            created_by UUID NOT NULL
                REFERENCES meeting_hub.users(id) ON DELETE CASCADE,
            due_date DATE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "mind_maps",
        r#"
        CREATE TABLE IF NOT EXISTS meeting_hub.mind_maps (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            meeting_id UUID NOT NULL
                REFERENCES meeting_hub.meetings(id) ON DELETE CASCADE,
            title VARCHAR(255) NOT NULL,
            content JSONB NOT NULL DEFAULT '{"nodes": [], "connections": []}',
            version INTEGER NOT NULL DEFAULT 1,
            created_by UUID NOT NULL
                REFERENCES meeting_hub.users(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "recordings",
        r#"
        CREATE TABLE IF NOT EXISTS meeting_hub.recordings (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            meeting_id UUID NOT NULL
                REFERENCES meeting_hub.meetings(id) ON DELETE CASCADE,
            file_path TEXT NOT NULL,
            file_size BIGINT NOT NULL,
            duration_seconds INTEGER NOT NULL CHECK (duration_seconds >= 0),
            started_at TIMESTAMPTZ NOT NULL,
            ended_at TIMESTAMPTZ NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
];

// Every child table is read by meeting, and transcripts in time order.
const CREATE_INDEXES: [&str; 6] = [
    "CREATE INDEX IF NOT EXISTS idx_participants_meeting ON meeting_hub.participants(meeting_id, joined_at)",
    "CREATE INDEX IF NOT EXISTS idx_participants_user ON meeting_hub.participants(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_transcripts_meeting ON meeting_hub.transcripts(meeting_id, timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_action_items_meeting ON meeting_hub.action_items(meeting_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_mind_maps_meeting ON meeting_hub.mind_maps(meeting_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_recordings_meeting ON meeting_hub.recordings(meeting_id)",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        for (name, values) in ENUM_TYPES {
            db.execute_unprepared(&format!(
                "CREATE TYPE meeting_hub.{name} AS ENUM ({values})"
            ))
            .await?;
        }

        for (_, sql) in CREATE_TABLES {
            db.execute_unprepared(sql).await?;
        }

        for sql in CREATE_INDEXES {
            db.execute_unprepared(sql).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        for (name, _) in CREATE_TABLES.iter().rev() {
            db.execute_unprepared(&format!("DROP TABLE IF EXISTS meeting_hub.{name} CASCADE"))
                .await?;
        }

        for (name, _) in ENUM_TYPES {
            db.execute_unprepared(&format!("DROP TYPE IF EXISTS meeting_hub.{name}"))
                .await?;
        }

        Ok(())
    }
}
