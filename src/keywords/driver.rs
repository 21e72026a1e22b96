//! Incremental classification against the category ledger.
//!
//! Only keywords the ledger has never seen are sent to the classifier, so
//! the cost of a report grows with the number of new keywords rather than
//! with the size of the corpus. A failed classification round is not an
//! error: the affected keywords stay unclassified and are retried by the
//! next run. A failed ledger write is an error, because swallowing it would
//! resend the same keywords on every run.

use super::aggregate::FrequencyTable;
use super::classifier::KeywordClassifier;
use crate::store::Database;
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// What happened to the classifier call in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierStatus {
    /// Every keyword was already in the ledger; nothing was sent.
    Skipped,
    /// The batch was classified; `accepted` labels were usable.
    Classified { accepted: usize },
    /// The call failed; no new categories this round.
    Failed { reason: String },
}

/// Result of one incremental classification pass.
#[derive(Debug, Clone)]
pub struct ClassificationOutcome {
    /// Category of every keyword known after this run (ledger plus new rows).
    pub resolved: HashMap<String, String>,
    /// Keywords in the table that already had a ledger entry.
    pub already_known: usize,
    /// Keywords sent to the classifier, in discovery order.
    pub requested: Vec<String>,
    /// Rows this run added to the ledger.
    pub newly_stored: usize,
    pub status: ClassifierStatus,
}

/// Classify every keyword in `table` that the ledger does not know yet.
///
/// The classifier is invoked at most once, with the full set of unknown
/// keywords as one batch, and not at all when that set is empty. Labels for
/// keywords that were not requested, and empty labels, are discarded.
/// Accepted labels are written with insert-if-absent semantics.
///
/// # Errors
///
/// Only storage errors are returned. Classifier failures are logged and
/// reported through [`ClassifierStatus::Failed`].
#[instrument(level = "info", skip_all, fields(keywords = table.len()))]
pub async fn classify_incrementally<C>(
    db: &Database,
    table: &FrequencyTable,
    classifier: &C,
) -> Result<ClassificationOutcome, sqlx::Error>
where
    C: KeywordClassifier,
{
    let mut resolved = db.lookup_categories().await?;

    let requested: Vec<String> = table
        .keywords()
        .filter(|k| !resolved.contains_key(*k))
        .map(str::to_string)
        .collect();
    let already_known = table.len() - requested.len();
    info!(already_known, unclassified = requested.len(), "Diffed keywords against ledger");

    if requested.is_empty() {
        return Ok(ClassificationOutcome {
            resolved,
            already_known,
            requested,
            newly_stored: 0,
            status: ClassifierStatus::Skipped,
        });
    }

    let (accepted, status) = match classifier.classify(&requested).await {
        Ok(mapping) => {
            let accepted = accept_labels(&requested, mapping);
            let status = ClassifierStatus::Classified {
                accepted: accepted.len(),
            };
            (accepted, status)
        }
        Err(e) => {
            warn!(error = %e, "Keyword classification failed; continuing without new categories");
            (
                Vec::new(),
                ClassifierStatus::Failed {
                    reason: e.to_string(),
                },
            )
        }
    };

    let inserted = db.insert_categories_if_absent(&accepted).await?;
    let newly_stored = inserted.len();
    if newly_stored < accepted.len() {
        // Another writer got there first; its categories are the ones that count.
        resolved = db.lookup_categories().await?;
    } else {
        resolved.extend(inserted);
    }

    Ok(ClassificationOutcome {
        resolved,
        already_known,
        requested,
        newly_stored,
        status,
    })
}

/// Keep only labels for requested keywords, in request order.
fn accept_labels(
    requested: &[String],
    mut mapping: HashMap<String, String>,
) -> Vec<(String, String)> {
    let returned = mapping.len();
    let accepted: Vec<(String, String)> = requested
        .iter()
        .filter_map(|keyword| {
            let category = mapping.remove(keyword)?;
            let category = category.trim();
            (!category.is_empty()).then(|| (keyword.clone(), category.to_string()))
        })
        .collect();

    let unrequested = mapping.len();
    if unrequested > 0 {
        warn!(unrequested, "Classifier labelled keywords that were not requested; discarded");
    }
    info!(returned, accepted = accepted.len(), "Accepted classifier labels");
    accepted
}
