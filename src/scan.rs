// src/scan.rs
use std::path::Path;

use serde::Serialize;

use crate::types::{AppInfo, ScanResponse};

/// Scores above this are shown as elevated risk.
pub const ELEVATED_RISK_THRESHOLD: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Normal,
    Elevated,
}

impl RiskBand {
    pub fn from_score(score: u32) -> Self {
        if score > ELEVATED_RISK_THRESHOLD {
            RiskBand::Elevated
        } else {
            RiskBand::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub scan_id: String,
    pub apps_submitted: usize,
    pub threats_found: u32,
    pub risk_score: u32,
    pub band: RiskBand,
}

impl ScanSummary {
    pub fn new(res: &ScanResponse, apps_submitted: usize) -> Self {
        Self {
            scan_id: res.scan_id.clone(),
            apps_submitted,
            threats_found: res.threats_found,
            risk_score: res.risk_score,
            band: RiskBand::from_score(res.risk_score),
        }
    }
}

/// Drops blank package names and duplicate entries, keeping first occurrence.
pub fn normalize_inventory(apps: Vec<AppInfo>) -> Vec<AppInfo> {
    let mut seen = std::collections::HashSet::new();
    apps.into_iter()
        .filter(|a| !a.package_name.trim().is_empty())
        .filter(|a| seen.insert(a.package_name.clone()))
        .collect()
}

/// Reads an inventory exported as a JSON array of `AppInfo`.
pub fn load_inventory(path: &Path) -> anyhow::Result<Vec<AppInfo>> {
    let raw = std::fs::read_to_string(path)?;
    let apps: Vec<AppInfo> = serde_json::from_str(&raw)?;
    Ok(normalize_inventory(apps))
}
