use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::USER_AGENT;
use serde::{Deserialize, Serialize};

use crate::club::{ClubRecord, RiskRow};
use crate::http_client::http_client;

pub const CLUBS_PATH: &str = "/api/clubs";
pub const RISK_PATH: &str = "/api/risk";

/// Anything that can list clubs and score them.
pub trait RiskSource: Send + Sync {
    fn club_names(&self) -> Result<Vec<String>>;

    /// Scores every requested club in one call. Clubs the source does not know
    /// are left out of the result.
    fn assess(&self, names: &[String]) -> Result<Vec<ClubRecord>>;

    fn label(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct RiskRequest<'a> {
    club_names: &'a [String],
}

#[derive(Debug, Deserialize)]
struct RiskResponse {
    #[serde(default)]
    clubs: Vec<RiskRow>,
}

#[derive(Debug, Clone)]
pub struct HttpRiskSource {
    base_url: String,
    timeout: Option<Duration>,
}

impl HttpRiskSource {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn clubs_url(&self) -> String {
        format!("{}{CLUBS_PATH}", self.base_url)
    }

    pub fn risk_url(&self) -> String {
        format!("{}{RISK_PATH}", self.base_url)
    }
}

impl RiskSource for HttpRiskSource {
    fn club_names(&self) -> Result<Vec<String>> {
        let client = http_client(self.timeout)?;
        let url = self.clubs_url();
        let resp = client
            .get(&url)
            .header(USER_AGENT, "clubrisk-terminal")
            .send()
            .context("request failed")?;
        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow::anyhow!("http {}: {}", status, body));
        }
        tracing::debug!(%url, bytes = body.len(), "club directory fetched");
        parse_club_names_json(&body)
    }

    fn assess(&self, names: &[String]) -> Result<Vec<ClubRecord>> {
        let client = http_client(self.timeout)?;
        let url = self.risk_url();
        let resp = client
            .post(&url)
            .header(USER_AGENT, "clubrisk-terminal")
            .json(&RiskRequest { club_names: names })
            .send()
            .context("request failed")?;
        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow::anyhow!("http {}: {}", status, body));
        }
        tracing::debug!(%url, requested = names.len(), "risk response received");
        parse_risk_response_json(&body)
    }

    fn label(&self) -> &str {
        &self.base_url
    }
}

pub fn parse_club_names_json(raw: &str) -> Result<Vec<String>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let names: Vec<String> = serde_json::from_str(trimmed).context("invalid clubs json")?;
    Ok(names
        .into_iter()
        .filter_map(|name| non_empty(&name).map(str::to_string))
        .collect())
}

pub fn parse_risk_response_json(raw: &str) -> Result<Vec<ClubRecord>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let resp: RiskResponse = serde_json::from_str(trimmed).context("invalid risk json")?;
    Ok(resp.clubs.into_iter().map(ClubRecord::from).collect())
}

/// Single-club lookup on top of a batch call. Prefers the row named after the
/// request; a response without it counts as a failure.
pub fn assess_one(source: &dyn RiskSource, name: &str) -> Result<ClubRecord> {
    let records = source.assess(&[name.to_string()])?;
    records
        .into_iter()
        .find(|record| record.name == name)
        .ok_or_else(|| anyhow::anyhow!("no risk data returned for {name}"))
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
