use anyhow::{Context, Result};
use research_judge::{Credentials, JudgeConfig};
use std::env;

/// Runtime settings loaded from the environment
#[derive(Debug)]
pub struct Config {
    pub credentials: Credentials,
    pub judge: JudgeConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        Ok(Self {
            credentials: Credentials::from_env(),
            judge: judge_config(|name| env::var(name).ok())?,
        })
    }
}

/// Pipeline config with `JUDGE_*` overrides applied.
fn judge_config(lookup: impl Fn(&str) -> Option<String>) -> Result<JudgeConfig> {
    let mut config = JudgeConfig::default();

    if let Some(value) = lookup("JUDGE_SYNTHETIC_FALLBACK") {
        config = config.with_synthetic_fallback(
            parse_flag(&value).context("JUDGE_SYNTHETIC_FALLBACK must be true or false")?,
        );
    }

    if let Some(value) = lookup("JUDGE_CLASSIFY_CONCURRENCY") {
        let concurrency: usize = value
            .trim()
            .parse()
            .context("JUDGE_CLASSIFY_CONCURRENCY must be a positive number")?;
        config = config.with_classify_concurrency(concurrency.max(1));
    }

    Ok(config)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_overrides() {
        let config = judge_config(lookup(&[])).unwrap();
        assert!(config.synthetic_fallback);
        assert_eq!(config.classify_concurrency, 5);
    }

    #[test]
    fn test_overrides() {
        let config = judge_config(lookup(&[
            ("JUDGE_SYNTHETIC_FALLBACK", "off"),
            ("JUDGE_CLASSIFY_CONCURRENCY", "2"),
        ]))
        .unwrap();
        assert!(!config.synthetic_fallback);
        assert_eq!(config.classify_concurrency, 2);
    }

    #[test]
    fn test_bad_values_are_errors() {
        assert!(judge_config(lookup(&[("JUDGE_SYNTHETIC_FALLBACK", "maybe")])).is_err());
        assert!(judge_config(lookup(&[("JUDGE_CLASSIFY_CONCURRENCY", "many")])).is_err());
    }
}
