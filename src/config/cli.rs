use crate::utils::error::Result;
use crate::utils::validation::{validate_file_extensions, validate_path, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "ui-models")]
#[command(about = "Render a TOML model file onto an in-memory document")]
pub struct CliConfig {
    /// Path to the TOML model file
    #[arg(short, long, default_value = "models.toml")]
    pub config: String,

    /// Write the rendered markup to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,

    /// Dry run - validate and list the steps without rendering
    #[arg(long)]
    pub dry_run: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("config", &self.config)?;
        validate_file_extensions("config", std::slice::from_ref(&self.config), &["toml"])?;
        if let Some(output) = &self.output {
            validate_path("output", output)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        let config = CliConfig::parse_from([
            "ui-models",
            "--config",
            "demo.toml",
            "--output",
            "out.html",
            "--dry-run",
        ]);
        assert_eq!(config.config, "demo.toml");
        assert_eq!(config.output.as_deref(), Some("out.html"));
        assert!(config.dry_run);
        assert!(!config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_toml_config() {
        let config = CliConfig::parse_from(["ui-models", "--config", "models.json"]);
        assert!(config.validate().is_err());
    }
}
