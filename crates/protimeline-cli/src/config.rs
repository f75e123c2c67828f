//! Chart configuration file
//!
//! ```toml
//! [chart]
//! width = 1400
//! tick_count = 8
//! time_domain = ["2015-01-01", "2020-06-30"]
//!
//! [chart.margin]
//! left = 180
//!
//! [settings.showLegend]
//! show = false
//! ```

use anyhow::{Context, Result};
use protimeline_core::TimelineSettings;
use protimeline_render::TimelineRenderer;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Layout and visual settings loaded from TOML; every field is optional
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub chart: TimelineRenderer,
    pub settings: TimelineSettings,
}

impl ChartConfig {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid chart configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }
}
