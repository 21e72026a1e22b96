//! Batch keyword classification.
//!
//! [`KeywordClassifier`] is the seam between the incremental driver and the
//! outside world. The production implementation, [`LlmKeywordClassifier`],
//! sends the whole batch to the LLM in one request and expects a JSON object
//! mapping keyword → category back.

use crate::api::ask_with_backoff;
use crate::keywords::report::PREFERRED_CATEGORY_ORDER;
use crate::utils::{strip_code_fences, truncate_for_log};
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use std::collections::HashMap;
use std::error::Error;
use tracing::{info, instrument, warn};

/// Assigns categories to a batch of keywords.
pub trait KeywordClassifier {
    /// Classify `keywords` in a single request.
    ///
    /// The result may cover only part of the batch. Errors cover transport
    /// failures as well as responses that do not have the expected shape.
    async fn classify(&self, keywords: &[String])
    -> Result<HashMap<String, String>, Box<dyn Error>>;
}

/// Classifies keywords by asking the configured LLM.
#[derive(Debug)]
pub struct LlmKeywordClassifier<'a> {
    pub config: &'a AwfulJadeConfig,
    pub template: &'a ChatTemplate,
    pub template_name: &'a str,
}

impl KeywordClassifier for LlmKeywordClassifier<'_> {
    #[instrument(level = "info", skip_all, fields(batch = keywords.len()))]
    async fn classify(
        &self,
        keywords: &[String],
    ) -> Result<HashMap<String, String>, Box<dyn Error>> {
        if keywords.is_empty() {
            return Ok(HashMap::new());
        }

        let prompt = build_classification_prompt(keywords)?;
        let response = ask_with_backoff(self.config, &prompt, self.template, self.template_name).await?;
        match parse_classification(&response) {
            Ok(mapping) => {
                info!(classified = mapping.len(), "Keyword batch classified");
                Ok(mapping)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    response_preview = %truncate_for_log(&response, 300),
                    "Classifier returned non-conforming JSON"
                );
                Err(e.into())
            }
        }
    }
}

/// Stands in for the LLM classifier when its config or template cannot be
/// loaded. Every call fails, so the report degrades to known categories.
#[derive(Debug)]
pub struct UnavailableClassifier {
    pub reason: String,
}

impl KeywordClassifier for UnavailableClassifier {
    async fn classify(
        &self,
        _keywords: &[String],
    ) -> Result<HashMap<String, String>, Box<dyn Error>> {
        Err(format!("classifier unavailable: {}", self.reason).into())
    }
}

/// The user message for one classification batch.
pub fn build_classification_prompt(keywords: &[String]) -> Result<String, serde_json::Error> {
    let categories = PREFERRED_CATEGORY_ORDER.join(", ");
    let list = serde_json::to_string(keywords)?;
    Ok(format!(
        "Assign each of the following technology news keywords to exactly one category.\n\
         Preferred categories: {categories}.\n\
         Respond with a single JSON object whose keys are the keywords exactly as given \
         and whose values are the category names. Do not add any other text.\n\n\
         Keywords: {list}"
    ))
}

/// Parse a classification response into keyword → category.
///
/// The response must be a JSON object whose values are all strings,
/// optionally wrapped in a Markdown code fence.
pub fn parse_classification(response: &str) -> Result<HashMap<String, String>, serde_json::Error> {
    serde_json::from_str(strip_code_fences(response))
}
