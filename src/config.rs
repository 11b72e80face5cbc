use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{HttpRiskSource, RiskSource};
use crate::demo_source::DemoRiskSource;

pub const DEFAULT_API_BASE: &str = "https://football-risk-assessment3-mkj3ly2lna-uc.a.run.app";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Http,
    Demo,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base: String,
    pub source: SourceKind,
    pub request_timeout: Option<Duration>,
    pub fetch_parallelism: usize,
    pub demo_latency: Duration,
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            source: SourceKind::Http,
            request_timeout: None,
            fetch_parallelism: 4,
            demo_latency: Duration::from_millis(300),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Loads `.env.local` and `.env` (first value wins) and reads the
    /// `CLUBRISK_*` variables on top of the defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base = get("CLUBRISK_API_BASE")
            .map(|v| v.trim().to_string())
            .unwrap_or(defaults.api_base);
        let source = match get("CLUBRISK_SOURCE").map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "demo" || v == "offline" => SourceKind::Demo,
            _ => SourceKind::Http,
        };
        let request_timeout = get("CLUBRISK_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        let fetch_parallelism = get("CLUBRISK_FETCH_PARALLELISM")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(defaults.fetch_parallelism)
            .clamp(1, 16);
        let demo_latency = get("CLUBRISK_DEMO_LATENCY_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.demo_latency);
        let log_dir = get("CLUBRISK_LOG_DIR").map(|v| PathBuf::from(v.trim()));

        Self {
            api_base,
            source,
            request_timeout,
            fetch_parallelism,
            demo_latency,
            log_dir,
        }
    }

    pub fn build_source(&self) -> Arc<dyn RiskSource> {
        match self.source {
            SourceKind::Http => Arc::new(HttpRiskSource::new(&self.api_base, self.request_timeout)),
            SourceKind::Demo => Arc::new(DemoRiskSource::new().with_latency(self.demo_latency)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_variables() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.source, SourceKind::Http);
        assert!(cfg.request_timeout.is_none());
        assert_eq!(cfg.fetch_parallelism, 4);
        assert!(cfg.log_dir.is_none());
    }

    #[test]
    fn reads_overrides_and_clamps() {
        let cfg = config_from(&[
            ("CLUBRISK_API_BASE", " http://127.0.0.1:8000 "),
            ("CLUBRISK_SOURCE", "Demo"),
            ("CLUBRISK_TIMEOUT_SECS", "15"),
            ("CLUBRISK_FETCH_PARALLELISM", "99"),
            ("CLUBRISK_DEMO_LATENCY_MS", "0"),
            ("CLUBRISK_LOG_DIR", "/tmp/clubrisk"),
        ]);
        assert_eq!(cfg.api_base, "http://127.0.0.1:8000");
        assert_eq!(cfg.source, SourceKind::Demo);
        assert_eq!(cfg.request_timeout, Some(Duration::from_secs(15)));
        assert_eq!(cfg.fetch_parallelism, 16);
        assert_eq!(cfg.demo_latency, Duration::ZERO);
        assert_eq!(cfg.log_dir, Some(PathBuf::from("/tmp/clubrisk")));
    }

    #[test]
    fn zero_timeout_means_none() {
        let cfg = config_from(&[("CLUBRISK_TIMEOUT_SECS", "0")]);
        assert!(cfg.request_timeout.is_none());
    }
}
