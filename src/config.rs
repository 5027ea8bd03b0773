use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::FlowError;
use crate::features::DEFAULT_FALLBACK;

/// Tuning of the flow table and processing loop.
///
/// The bulk/activity constants are not here: they are the same for every flow.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Flows idle longer than this are flushed by `FlowTable::expire` (seconds).
    pub flow_timeout_secs: f64,
    /// A packet arriving this long after its flow's latest packet starts a
    /// new flow for the same key (seconds).
    pub expired_update_secs: f64,
    pub expire_tick_ms: u64,
    pub stats_tick_ms: u64,
    /// 0 means unbounded.
    pub max_flows: usize,
    pub coercion_fallback: f64,
    pub close_on_fin: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            flow_timeout_secs: 120.0,
            expired_update_secs: 40.0,
            expire_tick_ms: 1000,
            stats_tick_ms: 1000,
            max_flows: 0,
            coercion_fallback: DEFAULT_FALLBACK,
            close_on_fin: true,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s).context("parse engine config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_json_str(&s).with_context(|| format!("load engine config from {}", path.display()))
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.flow_timeout_secs <= 0.0 || self.expired_update_secs <= 0.0 {
            return Err(FlowError::Config("timeouts must be positive".into()));
        }
        if self.expire_tick_ms == 0 || self.stats_tick_ms == 0 {
            return Err(FlowError::Config("tick intervals must be non-zero".into()));
        }
        if !self.coercion_fallback.is_finite() {
            return Err(FlowError::Config("coercion_fallback must be a finite number".into()));
        }
        Ok(())
    }

    pub fn expire_tick(&self) -> Duration {
        Duration::from_millis(self.expire_tick_ms)
    }

    pub fn stats_tick(&self) -> Duration {
        Duration::from_millis(self.stats_tick_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "flow_timeout_secs": 30, "max_flows": 10 }"#).unwrap();
        assert_eq!(config.flow_timeout_secs, 30.0);
        assert_eq!(config.max_flows, 10);
        assert_eq!(config.expired_update_secs, 40.0);
        assert!(config.close_on_fin);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(EngineConfig::from_json_str(r#"{ "flow_timeout_secs": 0 }"#).is_err());
        assert!(EngineConfig::from_json_str(r#"{ "stats_tick_ms": 0 }"#).is_err());
        assert!(EngineConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn validation_reports_config_error() {
        let config = EngineConfig { expire_tick_ms: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(FlowError::Config(_))));
        assert!(EngineConfig::default().validate().is_ok());

        let err = EngineConfig::from_json_str(r#"{ "coercion_fallback": null }"#);
        assert!(err.is_err());
        let err = EngineConfig::from_json_str(r#"{ "expired_update_secs": -1 }"#).unwrap_err();
        assert!(matches!(err.downcast_ref::<FlowError>(), Some(FlowError::Config(_))));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = EngineConfig::from_file("/nonexistent/flowfeat.json").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/flowfeat.json"));
    }
}
