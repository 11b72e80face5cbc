use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub const LOW_RISK_MAX: f64 = 30.0;
pub const MEDIUM_RISK_MAX: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskCategory {
    Pending,
    Low,
    Medium,
    High,
}

impl RiskCategory {
    pub fn from_score(score: Option<f64>) -> Self {
        match score {
            None => RiskCategory::Pending,
            Some(s) if s <= LOW_RISK_MAX => RiskCategory::Low,
            Some(s) if s <= MEDIUM_RISK_MAX => RiskCategory::Medium,
            Some(_) => RiskCategory::High,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskCategory::Pending => "Pending",
            RiskCategory::Low => "Low risk",
            RiskCategory::Medium => "Medium risk",
            RiskCategory::High => "High risk",
        }
    }

    /// One-line house guidance for the category, shown next to server strategies.
    pub fn guidance(self) -> Option<&'static str> {
        match self {
            RiskCategory::Pending => None,
            RiskCategory::Low => {
                Some("Maintain current financial strategy and explore growth opportunities.")
            }
            RiskCategory::Medium => {
                Some("Review expenses and consider optimizing revenue streams.")
            }
            RiskCategory::High => Some(
                "Urgent action required. Implement strict financial controls and seek additional funding sources.",
            ),
        }
    }
}

/// Colour band of the score meter. The bands are a third of the scale each and
/// intentionally do not line up with the category thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskTone {
    Unknown,
    Calm,
    Watch,
    Alarm,
}

pub fn risk_tone(score: Option<f64>) -> RiskTone {
    match score {
        None => RiskTone::Unknown,
        Some(s) if s < 33.0 => RiskTone::Calm,
        Some(s) if s < 66.0 => RiskTone::Watch,
        Some(_) => RiskTone::Alarm,
    }
}

/// One row of the `/api/risk` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RiskRow {
    #[serde(rename = "Club")]
    pub club: String,
    #[serde(rename = "Risk Score", default, deserialize_with = "lenient_score")]
    pub risk_score: Option<f64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub strategies: Vec<String>,
    #[serde(rename = "Risk_Catgeogry", alias = "Risk Catgeogry", default)]
    pub risk_category: Option<String>,
    #[serde(rename = "Total Revenue (£m)", default)]
    pub total_revenue: Option<Value>,
    #[serde(rename = "Annual Wages (£m)", default)]
    pub annual_wages: Option<Value>,
    #[serde(rename = "Rank", default)]
    pub rank: Option<Value>,
    #[serde(rename = "Points", default)]
    pub points: Option<Value>,
    #[serde(rename = "Goal Difference", default)]
    pub goal_difference: Option<Value>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClubRecord {
    pub name: String,
    pub score: Option<f64>,
    pub strategies: Vec<String>,
    // Label sent by the server; display only, never used for classification.
    pub server_category: Option<String>,
    pub revenue: Option<Value>,
    pub wages: Option<Value>,
    pub rank: Option<Value>,
    pub points: Option<Value>,
    pub goal_difference: Option<Value>,
    pub facts: BTreeMap<String, Value>,
}

impl ClubRecord {
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: None,
            strategies: Vec::new(),
            server_category: None,
            revenue: None,
            wages: None,
            rank: None,
            points: None,
            goal_difference: None,
            facts: BTreeMap::new(),
        }
    }

    pub fn category(&self) -> RiskCategory {
        RiskCategory::from_score(self.score)
    }

    pub fn tone(&self) -> RiskTone {
        risk_tone(self.score)
    }

    pub fn is_assessed(&self) -> bool {
        self.score.is_some()
    }

    /// Headline numbers in display order, skipping the ones the server left out.
    pub fn key_figures(&self) -> Vec<(&'static str, String)> {
        [
            ("Revenue £m", &self.revenue),
            ("Wages £m", &self.wages),
            ("Rank", &self.rank),
            ("Points", &self.points),
            ("GD", &self.goal_difference),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_ref().and_then(display_value).map(|v| (label, v)))
        .collect()
    }
}

impl From<RiskRow> for ClubRecord {
    fn from(row: RiskRow) -> Self {
        let facts = row
            .other
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .collect();
        Self {
            name: row.club,
            score: row.risk_score,
            strategies: row.strategies,
            server_category: row.risk_category.filter(|c| !c.trim().is_empty()),
            revenue: row.total_revenue,
            wages: row.annual_wages,
            rank: row.rank,
            points: row.points,
            goal_difference: row.goal_difference,
            facts,
        }
    }
}

pub fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i.to_string()),
            None => n.as_f64().map(|f| format!("{f:.2}")),
        },
        Value::Bool(b) => Some(if *b { "yes" } else { "no" }.to_string()),
        other => Some(other.to_string()),
    }
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(score_from_value))
}

fn score_from_value(value: &Value) -> Option<f64> {
    let score = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    score.is_finite().then_some(score)
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
