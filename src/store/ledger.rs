//! The keyword category ledger.
//!
//! A keyword's category is decided once and then reused forever. The only
//! way to change a category is to wipe the whole ledger with
//! [`Database::clear_categories`] and let the next report reclassify.

use super::Database;
use sqlx::Row;
use std::collections::HashMap;
use tracing::{info, instrument, warn};

impl Database {
    /// Every persisted keyword → category mapping.
    #[instrument(level = "info", skip_all)]
    pub async fn lookup_categories(&self) -> Result<HashMap<String, String>, sqlx::Error> {
        let rows = sqlx::query("SELECT keyword, category FROM keyword_metadata")
            .fetch_all(self.pool())
            .await?;
        rows.iter()
            .map(|row| -> Result<(String, String), sqlx::Error> {
                Ok((row.try_get("keyword")?, row.try_get("category")?))
            })
            .collect()
    }

    /// Persist each pair whose keyword is not in the ledger yet.
    ///
    /// Pairs for keywords that already have a category are dropped and the
    /// stored category is left untouched. All pairs are written in a single
    /// transaction. Returns the pairs that were actually inserted, in input
    /// order.
    #[instrument(level = "info", skip_all, fields(candidates = entries.len()))]
    pub async fn insert_categories_if_absent(
        &self,
        entries: &[(String, String)],
    ) -> Result<Vec<(String, String)>, sqlx::Error> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool().begin().await?;
        let mut inserted = Vec::with_capacity(entries.len());
        for (keyword, category) in entries {
            let result = sqlx::query(
                r#"
                INSERT INTO keyword_metadata (keyword, category)
                VALUES (?1, ?2)
                ON CONFLICT(keyword) DO NOTHING
                "#,
            )
            .bind(keyword)
            .bind(category)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                inserted.push((keyword.clone(), category.clone()));
            }
        }
        tx.commit().await?;

        let dropped = entries.len() - inserted.len();
        if dropped > 0 {
            warn!(dropped, "Some keywords were already categorized; kept existing categories");
        }
        info!(inserted = inserted.len(), "Stored new keyword categories");
        Ok(inserted)
    }

    /// Remove every ledger entry. Returns how many were deleted.
    ///
    /// Irreversible; callers are expected to confirm with the operator first.
    #[instrument(level = "info", skip_all)]
    pub async fn clear_categories(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM keyword_metadata")
            .execute(self.pool())
            .await?;
        let deleted = result.rows_affected();
        info!(deleted, "Cleared keyword categories");
        Ok(deleted)
    }
}
