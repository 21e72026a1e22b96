//! Keyword trend reporting.
//!
//! The report pipeline runs top to bottom on every invocation:
//!
//! 1. **Aggregate**: fold every stored article's keyword counts into one
//!    [`FrequencyTable`](aggregate::FrequencyTable)
//! 2. **Classify**: diff the table against the category ledger and send only
//!    unseen keywords to the classifier, as one batch
//! 3. **Persist**: store the new categories, insert-if-absent
//! 4. **Report**: group keywords by category and print the top of each
//!
//! # Submodules
//!
//! - [`aggregate`]: frequency table and payload parsing
//! - [`classifier`]: the classification capability and its LLM implementation
//! - [`driver`]: the incremental ledger diff
//! - [`report`]: grouping, ordering and rendering

pub mod aggregate;
pub mod classifier;
pub mod driver;
pub mod report;

use crate::config::LlmTask;
use crate::store::Database;
use aggregate::{FrequencyTable, aggregate};
use classifier::{KeywordClassifier, LlmKeywordClassifier, UnavailableClassifier};
use driver::{ClassificationOutcome, ClassifierStatus, classify_incrementally};
use report::{GroupedReport, build_report};
use std::error::Error;
use tracing::{info, instrument, warn};

/// Everything one report run produced.
#[derive(Debug, Clone)]
pub struct KeywordReport {
    pub table: FrequencyTable,
    pub outcome: ClassificationOutcome,
    pub report: GroupedReport,
}

/// Run the pipeline without printing.
///
/// Returns `Ok(None)` when there are no articles at all.
#[instrument(level = "info", skip_all)]
pub async fn build_keyword_report<C>(
    db: &Database,
    classifier: &C,
) -> Result<Option<KeywordReport>, Box<dyn Error>>
where
    C: KeywordClassifier,
{
    let payloads = db.keyword_payloads().await?;
    if payloads.is_empty() {
        info!("No articles stored; nothing to analyze");
        return Ok(None);
    }

    let table = aggregate(payloads);
    if table.is_empty() {
        info!("Stored articles carry no keyword counts");
    }
    info!(unique_keywords = table.len(), "Built frequency table");

    let outcome = classify_incrementally(db, &table, classifier).await?;
    let report = build_report(&table, &outcome.resolved);

    Ok(Some(KeywordReport {
        table,
        outcome,
        report,
    }))
}

/// Build the keyword report and print it with status lines to stdout.
///
/// A failed classifier call only degrades the report; a failed ledger
/// write is returned as an error.
pub async fn analyze_and_print<C>(db: &Database, classifier: &C) -> Result<(), Box<dyn Error>>
where
    C: KeywordClassifier,
{
    println!("Reading keyword data from database...");
    let Some(run) = build_keyword_report(db, classifier).await? else {
        println!("No articles found in database. Nothing to analyze.");
        return Ok(());
    };

    println!("{}", status_lines(&run));
    print!("{}", run.report.render());
    Ok(())
}

/// The `report` command.
///
/// `task` is the result of loading the classifier's LLM config and template.
/// If that failed, the report is still printed: known categories render as
/// usual and unclassified keywords stay Uncategorized for this run.
pub async fn run_report(
    db: &Database,
    task: Result<LlmTask, Box<dyn Error>>,
) -> Result<(), Box<dyn Error>> {
    match task {
        Ok(task) => {
            let classifier = LlmKeywordClassifier {
                config: &task.config,
                template: &task.template,
                template_name: &task.template_name,
            };
            analyze_and_print(db, &classifier).await
        }
        Err(e) => {
            warn!(error = %e, "Keyword classifier unavailable; reporting known categories only");
            let classifier = UnavailableClassifier {
                reason: e.to_string(),
            };
            analyze_and_print(db, &classifier).await
        }
    }
}

fn status_lines(run: &KeywordReport) -> String {
    let outcome = &run.outcome;
    let mut lines = vec![
        format!("Total unique keywords found: {}", run.table.len()),
        format!(
            "Already categorized: {} | New: {}",
            outcome.already_known,
            outcome.requested.len()
        ),
    ];
    match &outcome.status {
        ClassifierStatus::Skipped => {
            lines.push("All keywords are already categorized in the database.".to_string())
        }
        ClassifierStatus::Classified { accepted } => lines.push(format!(
            "Classifier labelled {} of {} new keywords; {} stored.",
            accepted,
            outcome.requested.len(),
            outcome.newly_stored
        )),
        ClassifierStatus::Failed { reason } => lines.push(format!(
            "Keyword classification failed ({}); {} keywords stay Uncategorized until the next run.",
            reason,
            outcome.requested.len()
        )),
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::driver::tests::RecordingClassifier;
    use crate::store::articles::tests::article;

    async fn seeded_db() -> Database {
        let db = Database::in_memory().await.unwrap();
        db.insert_article(&article("https://a", "A", "2026-02-07", Some(r#"{"AI": 6, "NVIDIA": 5}"#)))
            .await
            .unwrap();
        db.insert_article(&article("https://b", "B", "2026-02-07", Some(r#"{"AI": 4}"#)))
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_empty_corpus_is_nothing_to_analyze() {
        let db = Database::in_memory().await.unwrap();
        let classifier = RecordingClassifier::answering(&[]);
        assert!(build_keyword_report(&db, &classifier).await.unwrap().is_none());
        analyze_and_print(&db, &classifier).await.unwrap();
        assert_eq!(classifier.call_count(), 0);
    }

    #[tokio::test]
    async fn test_scenario_classify_once_then_reuse() {
        let db = seeded_db().await;
        let classifier =
            RecordingClassifier::answering(&[("AI", "Technology"), ("NVIDIA", "Company")]);

        let first = build_keyword_report(&db, &classifier).await.unwrap().unwrap();
        assert_eq!(first.table.get("AI"), Some(10));
        assert_eq!(first.table.get("NVIDIA"), Some(5));
        assert_eq!(
            first.report.section("Technology").unwrap().top,
            vec![("AI".to_string(), 10)]
        );
        assert_eq!(
            first.report.section("Company").unwrap().top,
            vec![("NVIDIA".to_string(), 5)]
        );

        let ledger = db.lookup_categories().await.unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger["AI"], "Technology");

        let second = build_keyword_report(&db, &classifier).await.unwrap().unwrap();
        assert_eq!(classifier.call_count(), 1);
        assert_eq!(second.report, first.report);
        assert_eq!(second.report.render(), first.report.render());
    }

    #[tokio::test]
    async fn test_scenario_clear_ledger_forces_reclassification() {
        let db = seeded_db().await;
        let classifier =
            RecordingClassifier::answering(&[("AI", "Technology"), ("NVIDIA", "Company")]);

        build_keyword_report(&db, &classifier).await.unwrap();
        assert_eq!(db.clear_categories().await.unwrap(), 2);
        assert!(db.lookup_categories().await.unwrap().is_empty());

        build_keyword_report(&db, &classifier).await.unwrap();
        let calls = classifier.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1], vec!["AI".to_string(), "NVIDIA".to_string()]);
    }

    #[tokio::test]
    async fn test_malformed_article_does_not_break_report() {
        let db = seeded_db().await;
        db.insert_article(&article("https://c", "C", "2026-02-07", Some("{broken")))
            .await
            .unwrap();
        db.insert_article(&article("https://d", "D", "2026-02-07", None))
            .await
            .unwrap();
        let classifier = RecordingClassifier::answering(&[("AI", "Technology")]);

        let run = build_keyword_report(&db, &classifier).await.unwrap().unwrap();
        assert_eq!(run.table.get("AI"), Some(10));
        assert_eq!(
            run.report.section(report::UNCATEGORIZED).unwrap().top,
            vec![("NVIDIA".to_string(), 5)]
        );
    }

    #[tokio::test]
    async fn test_report_without_llm_config_uses_known_categories() {
        let db = seeded_db().await;
        db.insert_categories_if_absent(&[
            ("AI".to_string(), "Technology".to_string()),
            ("NVIDIA".to_string(), "Company".to_string()),
        ])
        .await
        .unwrap();

        run_report(&db, Err("config.yaml not found".into())).await.unwrap();

        let classifier = UnavailableClassifier {
            reason: "config.yaml not found".to_string(),
        };
        let run = build_keyword_report(&db, &classifier).await.unwrap().unwrap();
        assert_eq!(run.outcome.status, ClassifierStatus::Skipped);
        assert_eq!(run.report.categories(), vec!["Technology", "Company"]);
    }

    #[tokio::test]
    async fn test_report_without_llm_config_leaves_new_keywords_uncategorized() {
        let db = seeded_db().await;
        db.insert_categories_if_absent(&[("AI".to_string(), "Technology".to_string())])
            .await
            .unwrap();

        run_report(&db, Err("template missing".into())).await.unwrap();
        assert_eq!(db.lookup_categories().await.unwrap().len(), 1);

        let classifier = UnavailableClassifier {
            reason: "template missing".to_string(),
        };
        let run = build_keyword_report(&db, &classifier).await.unwrap().unwrap();
        assert!(matches!(run.outcome.status, ClassifierStatus::Failed { ref reason } if reason.contains("template missing")));
        assert_eq!(run.report.categories(), vec!["Technology", report::UNCATEGORIZED]);
    }

    #[tokio::test]
    async fn test_report_without_llm_config_on_empty_corpus() {
        let db = Database::in_memory().await.unwrap();
        run_report(&db, Err("config.yaml not found".into())).await.unwrap();
    }

    #[tokio::test]
    async fn test_classifier_failure_still_reports() {
        let db = seeded_db().await;
        let classifier = RecordingClassifier::failing("quota exceeded");

        let run = build_keyword_report(&db, &classifier).await.unwrap().unwrap();
        assert_eq!(run.report.categories(), vec![report::UNCATEGORIZED]);
        assert!(status_lines(&run).contains("quota exceeded"));
        assert!(db.lookup_categories().await.unwrap().is_empty());
    }
}
