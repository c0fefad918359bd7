//! Database access for the stored content snapshot.

use serde_json::Value;
use sqlx::PgConnection;
use tracing::instrument;

use crate::content::Snapshot;
use crate::db::{errors::Result, models::portfolio::PortfolioRow};

pub struct PortfolioSnapshots<'c> {
    db: &'c mut PgConnection,
}

impl<'c> PortfolioSnapshots<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Cheap query proving the table is reachable.
    #[instrument(skip(self), err)]
    pub async fn probe(&mut self) -> Result<()> {
        sqlx::query("SELECT id FROM portfolio_data LIMIT 1").fetch_optional(&mut *self.db).await?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn get(&mut self, owner_key: &str) -> Result<Option<PortfolioRow>> {
        let row = sqlx::query_as::<_, PortfolioRow>(
            r#"
            SELECT owner_key, profile, skills, projects, contact, cv, stats, highlights, journey, revision, updated_at
            FROM portfolio_data
            WHERE owner_key = $1
            "#,
        )
        .bind(owner_key)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(row)
    }

    /// Insert or replace the snapshot for `owner_key`, returning the new revision.
    #[instrument(skip(self, snapshot), err)]
    pub async fn upsert(&mut self, owner_key: &str, snapshot: &Snapshot) -> Result<i64> {
        let to_json = |value: std::result::Result<Value, serde_json::Error>| value.map_err(|e| anyhow::anyhow!("serialize snapshot: {e}"));

        let revision = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO portfolio_data (owner_key, profile, skills, projects, contact, cv, stats, highlights, journey)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (owner_key) DO UPDATE SET
                profile = EXCLUDED.profile,
                skills = EXCLUDED.skills,
                projects = EXCLUDED.projects,
                contact = EXCLUDED.contact,
                cv = EXCLUDED.cv,
                stats = EXCLUDED.stats,
                highlights = EXCLUDED.highlights,
                journey = EXCLUDED.journey,
                revision = portfolio_data.revision + 1,
                updated_at = NOW()
            RETURNING revision
            "#,
        )
        .bind(owner_key)
        .bind(to_json(serde_json::to_value(&snapshot.profile))?)
        .bind(to_json(serde_json::to_value(&snapshot.skills))?)
        .bind(to_json(serde_json::to_value(&snapshot.projects))?)
        .bind(to_json(serde_json::to_value(&snapshot.contact))?)
        .bind(to_json(serde_json::to_value(&snapshot.cv))?)
        .bind(to_json(serde_json::to_value(&snapshot.stats))?)
        .bind(to_json(serde_json::to_value(&snapshot.highlights))?)
        .bind(to_json(serde_json::to_value(&snapshot.journey))?)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(revision)
    }
}
