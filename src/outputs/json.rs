//! JSON export of the article table.
//!
//! Writes every stored article as one pretty-printed JSON array. Column
//! values are exported as stored, including the JSON-text columns.

use crate::store::Database;
use crate::utils::ensure_parent_dir;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Export all articles to `path`. Returns the number of articles written.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn export_articles(db: &Database, path: &Path) -> Result<usize, Box<dyn Error>> {
    let articles = db.all_articles().await?;
    let json = serde_json::to_string_pretty(&articles)?;

    ensure_parent_dir(path).await?;
    if let Err(e) = fs::write(path, json).await {
        error!(error = %e, "Failed to write export");
        return Err(e.into());
    }

    info!(count = articles.len(), "Wrote JSON export");
    Ok(articles.len())
}
