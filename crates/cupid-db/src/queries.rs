use crate::models::{ExpiredRow, ProposalRow, ResponseRow};
use crate::{Database, format_timestamp};
use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};

const PROPOSAL_COLUMNS: &str = "slug, proposer_name, partner_name, love_message, theme, photos,
    questions, love_letter, timeline, confetti_style, ending_message, countdown_at,
    collect_responses, is_premium, created_at, expires_at";

const RESPONSE_COLUMNS: &str =
    "id, proposal_slug, respondent_name, response_type, message, photo_url, created_at";

impl Database {
    // -- Proposals --

    /// Insert a new proposal. Fails if the slug is already taken.
    pub fn insert_proposal(&self, row: &ProposalRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO proposals (slug, proposer_name, partner_name, love_message,
                    theme, photos, questions, love_letter, timeline, confetti_style, ending_message,
                    countdown_at, collect_responses, is_premium, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                rusqlite::params![
                    row.slug,
                    row.proposer_name,
                    row.partner_name,
                    row.love_message,
                    row.theme,
                    row.photos,
                    row.questions,
                    row.love_letter,
                    row.timeline,
                    row.confetti_style,
                    row.ending_message,
                    row.countdown_at,
                    row.collect_responses,
                    row.is_premium,
                    row.created_at,
                    row.expires_at,
                ],
            )?;
            if inserted == 0 {
                bail!("Slug already taken: {}", row.slug);
            }
            Ok(())
        })
    }

    pub fn get_proposal(&self, slug: &str) -> Result<Option<ProposalRow>> {
        self.with_conn(|conn| query_proposal(conn, slug))
    }

    pub fn set_premium(&self, slug: &str, premium: bool) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE proposals SET is_premium = ?2 WHERE slug = ?1",
                rusqlite::params![slug, premium],
            )?;
            Ok(n > 0)
        })
    }

    // -- Responses --

    pub fn insert_response(&self, row: &ResponseRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO proposal_responses (id, proposal_slug, respondent_name, response_type,
                    message, photo_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    row.id,
                    row.proposal_slug,
                    row.respondent_name,
                    row.response_type,
                    row.message,
                    row.photo_url,
                    row.created_at,
                ],
            )?;
            Ok(())
        })
    }

    /// Responses newest first, optionally restricted to one proposal.
    pub fn list_responses(&self, slug: Option<&str>) -> Result<Vec<ResponseRow>> {
        self.with_conn(|conn| query_responses(conn, slug))
    }

    // -- Expiry --

    /// Non-premium proposals whose retention deadline is before `now`.
    pub fn list_expired(&self, now: &DateTime<Utc>) -> Result<Vec<ExpiredRow>> {
        let now = format_timestamp(now);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT slug, photos FROM proposals
                 WHERE is_premium = 0 AND expires_at < ?1
                 ORDER BY expires_at",
            )?;
            let rows = stmt
                .query_map([&now], |row| {
                    Ok(ExpiredRow {
                        slug: row.get(0)?,
                        photos: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn response_photo_urls(&self, slug: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT photo_url FROM proposal_responses
                 WHERE proposal_slug = ?1 AND photo_url IS NOT NULL",
            )?;
            let urls = stmt
                .query_map([slug], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(urls)
        })
    }

    /// Delete every expired non-premium proposal and its responses in one
    /// transaction. Returns the number of proposals removed. Safe to repeat.
    pub fn delete_expired(&self, now: &DateTime<Utc>) -> Result<usize> {
        let now = format_timestamp(now);
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM proposal_responses WHERE proposal_slug IN
                    (SELECT slug FROM proposals WHERE is_premium = 0 AND expires_at < ?1)",
                [&now],
            )?;
            let n = tx.execute(
                "DELETE FROM proposals WHERE is_premium = 0 AND expires_at < ?1",
                [&now],
            )?;
            tx.commit()?;
            Ok(n)
        })
    }

    /// Remove the responses recorded against `slug`.
    pub fn delete_responses(&self, slug: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM proposal_responses WHERE proposal_slug = ?1", [slug])?;
            Ok(n)
        })
    }
}

fn proposal_from_row(row: &Row<'_>) -> rusqlite::Result<ProposalRow> {
    Ok(ProposalRow {
        slug: row.get(0)?,
        proposer_name: row.get(1)?,
        partner_name: row.get(2)?,
        love_message: row.get(3)?,
        theme: row.get(4)?,
        photos: row.get(5)?,
        questions: row.get(6)?,
        love_letter: row.get(7)?,
        timeline: row.get(8)?,
        confetti_style: row.get(9)?,
        ending_message: row.get(10)?,
        countdown_at: row.get(11)?,
        collect_responses: row.get(12)?,
        is_premium: row.get(13)?,
        created_at: row.get(14)?,
        expires_at: row.get(15)?,
    })
}

fn response_from_row(row: &Row<'_>) -> rusqlite::Result<ResponseRow> {
    Ok(ResponseRow {
        id: row.get(0)?,
        proposal_slug: row.get(1)?,
        respondent_name: row.get(2)?,
        response_type: row.get(3)?,
        message: row.get(4)?,
        photo_url: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn query_proposal(conn: &Connection, slug: &str) -> Result<Option<ProposalRow>> {
    let sql = format!("SELECT {} FROM proposals WHERE slug = ?1", PROPOSAL_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([slug], proposal_from_row).optional()?;
    Ok(row)
}

fn query_responses(conn: &Connection, slug: Option<&str>) -> Result<Vec<ResponseRow>> {
    let rows = match slug {
        Some(slug) => {
            let sql = format!(
                "SELECT {} FROM proposal_responses WHERE proposal_slug = ?1 ORDER BY created_at DESC",
                RESPONSE_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([slug], response_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let sql = format!(
                "SELECT {} FROM proposal_responses ORDER BY created_at DESC",
                RESPONSE_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], response_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
    };
    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use cupid_types::models::{NewResponse, Photo, PhotoSource, ProposalDefinition, Sentiment};
    use uuid::Uuid;

    fn definition(slug: &str, expires_at: DateTime<Utc>) -> ProposalDefinition {
        ProposalDefinition {
            slug: slug.into(),
            proposer_name: "Alice".into(),
            partner_name: "Bob".into(),
            love_message: "Always you".into(),
            theme: "romantic-garden".into(),
            photos: vec![Photo {
                source: PhotoSource::Remote { url: "http://x/files/proposals/a/1.jpg".into() },
                caption: "first date".into(),
            }],
            questions: vec![],
            love_letter: None,
            timeline: vec![],
            confetti_style: Default::default(),
            ending_message: None,
            countdown_at: None,
            collect_responses: true,
            is_premium: false,
            created_at: expires_at - Duration::days(30),
            expires_at,
        }
    }

    fn response(slug: &str, sentiment: Sentiment) -> NewResponse {
        NewResponse {
            proposal_slug: slug.into(),
            respondent_name: "Bob".into(),
            sentiment,
            message: Some("yes!".into()),
            photo_url: Some("http://x/files/responses/r.png".into()),
        }
    }

    #[test]
    fn proposal_roundtrips_through_row() {
        let db = Database::open_in_memory().unwrap();
        let def = definition("alice-bob-1", Utc::now() + Duration::days(1));
        db.insert_proposal(&ProposalRow::from_definition(&def).unwrap()).unwrap();

        let loaded = db.get_proposal("alice-bob-1").unwrap().unwrap().into_definition().unwrap();
        assert_eq!(loaded.photos, def.photos);
        assert_eq!(loaded.partner_name, "Bob");
        assert!(db.get_proposal("missing").unwrap().is_none());
    }

    #[test]
    fn duplicate_slug_rejected() {
        let db = Database::open_in_memory().unwrap();
        let row = ProposalRow::from_definition(&definition("dup", Utc::now())).unwrap();
        db.insert_proposal(&row).unwrap();
        assert!(db.insert_proposal(&row).is_err());
    }

    #[test]
    fn responses_listed_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let def = definition("p", Utc::now() + Duration::days(1));
        db.insert_proposal(&ProposalRow::from_definition(&def).unwrap()).unwrap();

        let base = Utc::now();
        let older = ResponseRow::new(Uuid::new_v4(), &response("p", Sentiment::NotYet), &base);
        let newer = ResponseRow::new(
            Uuid::new_v4(),
            &response("p", Sentiment::Affirmative),
            &(base + Duration::seconds(5)),
        );
        db.insert_response(&older).unwrap();
        db.insert_response(&newer).unwrap();

        let rows = db.list_responses(None).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, newer.id);
        assert_eq!(rows[0].clone().into_response().unwrap().sentiment, Sentiment::Affirmative);
        assert_eq!(db.list_responses(Some("other")).unwrap().len(), 0);
    }

    #[test]
    fn response_without_stored_proposal_is_accepted() {
        let db = Database::open_in_memory().unwrap();
        let row = ResponseRow::new(Uuid::new_v4(), &response("offline-1", Sentiment::Declined), &Utc::now());
        db.insert_response(&row).unwrap();
        assert_eq!(db.list_responses(Some("offline-1")).unwrap().len(), 1);

        assert_eq!(db.delete_responses("offline-1").unwrap(), 1);
        assert!(db.list_responses(Some("offline-1")).unwrap().is_empty());
    }

    #[test]
    fn migrations_are_versioned_and_repeatable() {
        let db = Database::open_in_memory().unwrap();
        let version: i64 = db
            .with_conn(|conn| {
                crate::migrations::run(conn)?;
                Ok(conn.query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))?)
            })
            .unwrap();
        assert_eq!(version, 2);
    }

    #[test]
    fn delete_expired_skips_premium_and_takes_responses() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        let expired = definition("old", now - Duration::days(1));
        let mut premium = definition("vip", now - Duration::days(1));
        premium.is_premium = true;
        let fresh = definition("new", now + Duration::days(1));
        for def in [&expired, &premium, &fresh] {
            db.insert_proposal(&ProposalRow::from_definition(def).unwrap()).unwrap();
        }
        db.insert_response(&ResponseRow::new(Uuid::new_v4(), &response("old", Sentiment::Affirmative), &now))
            .unwrap();
        db.insert_response(&ResponseRow::new(Uuid::new_v4(), &response("vip", Sentiment::NotYet), &now))
            .unwrap();

        let listed = db.list_expired(&now).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].slug, "old");
        assert_eq!(db.response_photo_urls("old").unwrap().len(), 1);

        assert_eq!(db.delete_expired(&now).unwrap(), 1);
        assert_eq!(db.delete_expired(&now).unwrap(), 0);
        assert!(db.get_proposal("old").unwrap().is_none());
        assert!(db.get_proposal("vip").unwrap().is_some());
        assert!(db.list_responses(Some("old")).unwrap().is_empty());
        assert_eq!(db.list_responses(Some("vip")).unwrap().len(), 1);
    }
}
