use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (proposals + responses)");
        conn.execute_batch(
            "
            CREATE TABLE proposals (
                slug              TEXT PRIMARY KEY,
                proposer_name     TEXT NOT NULL,
                partner_name      TEXT NOT NULL,
                love_message      TEXT NOT NULL,
                theme             TEXT NOT NULL,
                photos            TEXT NOT NULL DEFAULT '[]',
                questions         TEXT NOT NULL DEFAULT '[]',
                love_letter       TEXT,
                timeline          TEXT NOT NULL DEFAULT '[]',
                confetti_style    TEXT NOT NULL DEFAULT 'hearts',
                ending_message    TEXT,
                countdown_at      TEXT,
                collect_responses INTEGER NOT NULL DEFAULT 1,
                is_premium        INTEGER NOT NULL DEFAULT 0,
                created_at        TEXT NOT NULL,
                expires_at        TEXT NOT NULL
            );

            CREATE INDEX idx_proposals_expiry
                ON proposals(is_premium, expires_at);

            CREATE TABLE proposal_responses (
                id              TEXT PRIMARY KEY,
                proposal_slug   TEXT NOT NULL REFERENCES proposals(slug) ON DELETE CASCADE,
                respondent_name TEXT NOT NULL,
                response_type   TEXT NOT NULL CHECK (response_type IN ('yes', 'no', 'not_yet')),
                message         TEXT CHECK (message IS NULL OR length(message) <= 200),
                photo_url       TEXT,
                created_at      TEXT NOT NULL
            );

            CREATE INDEX idx_responses_created
                ON proposal_responses(created_at);
            CREATE INDEX idx_responses_slug
                ON proposal_responses(proposal_slug);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        // Responses may belong to a proposal that only exists in the
        // fallback store, so the slug is no longer a foreign key.
        info!("Running migration v2 (responses without proposal FK)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE proposal_responses_v2 (
                id              TEXT PRIMARY KEY,
                proposal_slug   TEXT NOT NULL,
                respondent_name TEXT NOT NULL,
                response_type   TEXT NOT NULL CHECK (response_type IN ('yes', 'no', 'not_yet')),
                message         TEXT CHECK (message IS NULL OR length(message) <= 200),
                photo_url       TEXT,
                created_at      TEXT NOT NULL
            );

            INSERT INTO proposal_responses_v2
                SELECT id, proposal_slug, respondent_name, response_type, message, photo_url, created_at
                FROM proposal_responses;

            DROP TABLE proposal_responses;
            ALTER TABLE proposal_responses_v2 RENAME TO proposal_responses;

            CREATE INDEX idx_responses_created
                ON proposal_responses(created_at);
            CREATE INDEX idx_responses_slug
                ON proposal_responses(proposal_slug);

            INSERT INTO schema_version (version) VALUES (2);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
