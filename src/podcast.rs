//! Podcast script generation.
//!
//! Picks the most technical article of a day and asks the LLM to turn it
//! into a two-host dialogue, returned as a JSON array of
//! `{speaker, emotion, text}` lines.

use crate::api::ask_with_backoff;
use crate::config::LlmTask;
use crate::models::{Article, PodcastLine};
use crate::store::Database;
use crate::utils::{strip_code_fences, truncate_chars, truncate_for_log};
use chrono::NaiveDate;
use serde::Serialize;
use std::error::Error;
use std::fmt::Write;
use tracing::{info, instrument, warn};

const GREEN: &str = "\x1b[92m";
const CYAN: &str = "\x1b[96m";
const RESET: &str = "\x1b[0m";

/// The article fields the script is written from.
#[derive(Debug, Serialize)]
struct ScriptSource<'a> {
    title: &'a str,
    summary: &'a str,
    content: &'a str,
    tech_level: i64,
}

/// The prompt sent under the podcast template.
pub fn build_script_prompt(article: &Article) -> Result<String, serde_json::Error> {
    let source = ScriptSource {
        title: &article.title,
        summary: article.summary.as_deref().unwrap_or_default(),
        content: truncate_chars(
            article.content.as_deref().unwrap_or_default(),
            crate::analysis::MAX_CONTENT_CHARS,
        ),
        tech_level: article.tech_level.unwrap_or_default(),
    };
    serde_json::to_string(&source)
}

pub fn parse_script(response: &str) -> Result<Vec<PodcastLine>, serde_json::Error> {
    serde_json::from_str(strip_code_fences(response))
}

/// Format a script for the terminal. "Alex" is green, everyone else cyan.
pub fn render_script(date: NaiveDate, topic: &str, lines: &[PodcastLine]) -> String {
    let rule = "=".repeat(50);
    let mut out = String::new();
    let _ = writeln!(out, "\n{rule}");
    let _ = writeln!(out, "PODCAST SCRIPT: {}", date.format("%Y-%m-%d"));
    let _ = writeln!(out, "Topic: {topic}");
    let _ = writeln!(out, "{rule}\n");

    for line in lines {
        let color = if line.speaker == "Alex" { GREEN } else { CYAN };
        let _ = writeln!(
            out,
            "{color}[{} ({})]{RESET}: {}\n",
            line.speaker, line.emotion, line.text
        );
    }

    let _ = writeln!(out, "{rule}");
    out
}

#[instrument(level = "info", skip_all, fields(url = %article.url))]
async fn generate_script(task: &LlmTask, article: &Article) -> Result<Vec<PodcastLine>, Box<dyn Error>> {
    let prompt = build_script_prompt(article)?;
    let response = ask_with_backoff(&task.config, &prompt, &task.template, &task.template_name).await?;
    parse_script(&response).map_err(|e| {
        warn!(
            error = %e,
            response_preview = %truncate_for_log(&response, 300),
            "Model returned a non-conforming script"
        );
        e.into()
    })
}

/// Find the day's top article, generate its script, and print it.
///
/// A day without articles, or a failed generation, is reported to the
/// operator rather than returned as an error.
#[instrument(level = "info", skip(db, task))]
pub async fn produce_script(db: &Database, task: &LlmTask, date: NaiveDate) -> Result<(), Box<dyn Error>> {
    println!("Searching for top tech news on {}...", date.format("%Y-%m-%d"));
    let Some(article) = db.best_article_of_day(date).await? else {
        println!("No articles found for date: {}", date.format("%Y-%m-%d"));
        println!("   (Check the date, or run `fetch` to scrape news for that day)");
        return Ok(());
    };
    println!(
        "Found top article: {} (Level: {})",
        article.title,
        article.tech_level.unwrap_or_default()
    );

    println!("Generating podcast script...");
    match generate_script(task, &article).await {
        Ok(lines) => {
            info!(lines = lines.len(), "Generated podcast script");
            print!("{}", render_script(date, &article.title, &lines));
        }
        Err(e) => {
            warn!(error = %e, "Podcast script generation failed");
            println!("Failed to generate script.");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::articles::tests::article;

    #[test]
    fn test_prompt_carries_article_fields() {
        let mut a = article("https://a", "GPU wars", "2026-02-07", None);
        a.tech_level = Some(9);
        let prompt = build_script_prompt(&a).unwrap();
        let value: serde_json::Value = serde_json::from_str(&prompt).unwrap();
        assert_eq!(value["title"], "GPU wars");
        assert_eq!(value["summary"], "Summary of GPU wars");
        assert_eq!(value["content"], "Body text");
        assert_eq!(value["tech_level"], 9);
    }

    #[test]
    fn test_parse_script() {
        let lines = parse_script(
            r#"[{"speaker": "Alex", "emotion": "excited", "text": "Big news!"}, {"speaker": "Jamie", "text": "Tell me."}]"#,
        )
        .unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].emotion, "neutral");
        assert!(parse_script(r#"{"speaker": "Alex"}"#).is_err());
    }

    #[test]
    fn test_render_script_colors_speakers() {
        let lines = vec![
            PodcastLine {
                speaker: "Alex".to_string(),
                emotion: "excited".to_string(),
                text: "Big news!".to_string(),
            },
            PodcastLine {
                speaker: "Jamie".to_string(),
                emotion: "curious".to_string(),
                text: "Tell me.".to_string(),
            },
        ];
        let text = render_script(NaiveDate::from_ymd_opt(2026, 2, 7).unwrap(), "GPU wars", &lines);
        assert!(text.contains("PODCAST SCRIPT: 2026-02-07"));
        assert!(text.contains("Topic: GPU wars"));
        assert!(text.contains("\x1b[92m[Alex (excited)]\x1b[0m: Big news!"));
        assert!(text.contains("\x1b[96m[Jamie (curious)]\x1b[0m: Tell me."));
    }
}
