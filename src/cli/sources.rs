//! Sources command implementation

use crate::cli::output::{format_sources_json, format_sources_table, SourceRow};
use crate::cli::serve::load_config;
use crate::cli::SourcesArgs;

/// Handle `oiwatch sources`; returns the rendered listing.
pub fn handle_sources(args: &SourcesArgs) -> Result<String, Box<dyn std::error::Error>> {
    let mut config = load_config(&args.config)?;
    if let Some(ref url) = args.api_url {
        config.backend.base_url = url.clone();
    }
    config.validate()?;

    let rows: Vec<SourceRow> = config
        .resolved_sources()
        .iter()
        .map(|s| SourceRow::new(s, &config.backend.base_url))
        .collect();

    if args.json {
        Ok(format_sources_json(&rows)?)
    } else {
        Ok(format_sources_table(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_sources_lists_configured_entries() {
        let temp = NamedTempFile::new().unwrap();
        std::fs::write(
            temp.path(),
            r#"
            [[sources]]
            id = "pivots"
            kind = "support_resistance"
            params = { interval = "5", unit = "minute" }
            "#,
        )
        .unwrap();

        let args = SourcesArgs {
            config: temp.path().to_path_buf(),
            api_url: Some("http://analytics:5000".into()),
            json: true,
        };
        let output = handle_sources(&args).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["sources"].as_array().unwrap().len(), 1);
        assert_eq!(
            parsed["sources"][0]["url"],
            "http://analytics:5000/support_resistance?interval=5&unit=minute"
        );
        assert_eq!(parsed["sources"][0]["cadence"], "once (retry 30s)");
    }

    #[test]
    fn test_sources_rejects_invalid_config() {
        let temp = NamedTempFile::new().unwrap();
        std::fs::write(
            temp.path(),
            r#"
            [[sources]]
            id = "pivots"
            kind = "support_resistance"
            "#,
        )
        .unwrap();

        let args = SourcesArgs {
            config: temp.path().to_path_buf(),
            api_url: Some("http://analytics:5000".into()),
            json: false,
        };
        assert!(handle_sources(&args).is_err());
    }

    #[test]
    fn test_sources_default_set_table() {
        let args = SourcesArgs {
            config: PathBuf::from("nonexistent.toml"),
            api_url: Some("http://localhost:5000".into()),
            json: false,
        };
        let output = handle_sources(&args).unwrap();
        assert!(output.contains("support_resistance_30minute"));
        assert!(output.contains("/api/oi_data"));
    }
}
