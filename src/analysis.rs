//! LLM analysis of a single article.
//!
//! The article body is sent under the analysis template, which asks for a
//! JSON object with `summary`, `tech_level`, `keyword_counts` and
//! `impact_scope`. A response cut off mid-JSON is re-asked once.

use crate::api::ask_with_backoff;
use crate::config::LlmTask;
use crate::models::{ArticleAnalysis, NewsArticle};
use crate::utils::{looks_truncated, strip_code_fences, truncate_chars, truncate_for_log};
use serde_json::Value;
use std::error::Error;
use tracing::{info, instrument, warn};

/// Longest article body sent to the model, in characters.
pub const MAX_CONTENT_CHARS: usize = 10_000;

/// Parse an analysis response into the typed analysis and the raw JSON.
///
/// The raw value is kept so the full response can be stored as a backup.
pub fn parse_analysis(response: &str) -> Result<(ArticleAnalysis, Value), serde_json::Error> {
    let raw: Value = serde_json::from_str(strip_code_fences(response))?;
    let analysis = serde_json::from_value(raw.clone())?;
    Ok((analysis, raw))
}

/// Analyze one article with the LLM.
#[instrument(level = "info", skip_all, fields(url = %article.source))]
pub async fn analyze_article(
    task: &LlmTask,
    article: &NewsArticle,
) -> Result<(ArticleAnalysis, Value), Box<dyn Error>> {
    let content = truncate_chars(&article.content, MAX_CONTENT_CHARS);
    let response = ask_with_backoff(&task.config, content, &task.template, &task.template_name).await?;

    let mut parsed = parse_analysis(&response);
    if let Err(e) = &parsed {
        if looks_truncated(e) {
            warn!(error = %e, "EOF while parsing; re-asking once");
            let retry = ask_with_backoff(&task.config, content, &task.template, &task.template_name).await?;
            parsed = parse_analysis(&retry);
        }
    }

    match parsed {
        Ok((analysis, raw)) => {
            info!(
                tech_level = analysis.tech_level,
                keywords = analysis.keyword_counts.len(),
                "Analyzed article"
            );
            Ok((analysis, raw))
        }
        Err(e) => {
            warn!(
                error = %e,
                response_preview = %truncate_for_log(&response, 300),
                "Model returned non-conforming JSON"
            );
            Err(e.into())
        }
    }
}
