//! Runtime configuration assembled at the process boundary.
//!
//! [`AppConfig`] is built once from the parsed CLI (flags and environment
//! variables) and handed to each command. LLM credentials, endpoint and
//! model live in the `awful_aj` `config.yaml`; prompts live in `awful_aj`
//! chat templates, one per task.

use crate::cli::Cli;
use awful_aj::{config, config::AwfulJadeConfig, config_dir, template, template::ChatTemplate};
use std::error::Error;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Settings shared by every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Explicit `awful_aj` config file; `None` means the `awful_aj` default.
    pub llm_config_path: Option<PathBuf>,
    /// Template used to analyze article bodies.
    pub analysis_template: String,
    /// Template used to classify keyword batches.
    pub classifier_template: String,
    /// Template used to write podcast scripts.
    pub podcast_template: String,
}

impl From<&Cli> for AppConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            database_path: cli.database.clone(),
            llm_config_path: cli.config.clone(),
            analysis_template: cli.analysis_template.clone(),
            classifier_template: cli.classifier_template.clone(),
            podcast_template: cli.podcast_template.clone(),
        }
    }
}

impl AppConfig {
    /// Path of the `awful_aj` config file to load.
    pub fn llm_config_path(&self) -> Result<PathBuf, Box<dyn Error>> {
        match &self.llm_config_path {
            Some(path) => Ok(path.clone()),
            None => Ok(config_dir()?.join("config.yaml")),
        }
    }

    /// Load the LLM connection settings and the named template.
    #[instrument(level = "info", skip(self))]
    pub async fn llm_task(&self, template_name: &str) -> Result<LlmTask, Box<dyn Error>> {
        let conf_file = self.llm_config_path()?;
        let config_path = conf_file
            .to_str()
            .ok_or_else(|| format!("Not a valid config filename: {}", conf_file.display()))?;
        let config = config::load_config(config_path)?;
        info!(config_path, "Loaded configuration");

        let template = template::load_template(template_name).await?;
        info!(template_name, "Loaded template");

        Ok(LlmTask {
            config,
            template,
            template_name: template_name.to_string(),
        })
    }
}

/// Everything needed to send prompts for one LLM task.
#[derive(Debug)]
pub struct LlmTask {
    pub config: AwfulJadeConfig,
    pub template: ChatTemplate,
    pub template_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_app_config_from_cli_defaults() {
        let cli = Cli::parse_from(["tech_news_digest", "stats"]);
        let app = AppConfig::from(&cli);
        assert_eq!(app.database_path, PathBuf::from("tech_news.db"));
        assert_eq!(app.llm_config_path, None);
        assert_eq!(app.analysis_template, "tech_news_analyzer");
        assert_eq!(app.classifier_template, "keyword_classifier");
        assert_eq!(app.podcast_template, "podcast_script");
    }

    #[test]
    fn test_explicit_llm_config_path_wins() {
        let cli = Cli::parse_from([
            "tech_news_digest",
            "--config",
            "/etc/digest/config.yaml",
            "report",
        ]);
        let app = AppConfig::from(&cli);
        assert_eq!(
            app.llm_config_path().unwrap(),
            PathBuf::from("/etc/digest/config.yaml")
        );
    }
}
