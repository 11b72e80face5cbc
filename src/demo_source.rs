use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use crate::api::RiskSource;
use crate::club::ClubRecord;

const DEMO_CLUBS: &[&str] = &[
    "Manchester City",
    "Manchester Utd",
    "Liverpool",
    "Chelsea",
    "Arsenal",
    "Tottenham",
    "West Ham Utd",
    "Leicester City",
    "Brighton",
    "Wolves",
    "Newcastle Utd",
    "Crystal Palace",
    "Brentford",
    "Aston Villa",
    "Southampton",
    "Everton",
    "Leeds Utd",
    "Watford",
    "Norwich City",
];

const FACTORS: &[&str] = &[
    "Wage to Revenue Ratio",
    "Transfer Efficiency",
    "Revenue per Player",
    "Points Change",
    "Rank",
    "Win Percentage",
    "Points per Player",
    "Wage per Point",
    "Transfer Net Spend Ratio",
    "Revenue per Point",
];

const FACTOR_PICKS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    High,
    Medium,
    Low,
    VeryLow,
}

impl Tier {
    fn for_score(score: f64) -> Self {
        if score > 70.0 {
            Tier::High
        } else if score > 50.0 {
            Tier::Medium
        } else if score > 20.0 {
            Tier::Low
        } else {
            Tier::VeryLow
        }
    }
}

/// Offline source with a fixed club list and repeatable scores.
#[derive(Debug, Clone, Default)]
pub struct DemoRiskSource {
    latency: Duration,
}

impl DemoRiskSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn record_for(name: &str) -> ClubRecord {
        let mut rng = StdRng::seed_from_u64(name_seed(name));
        let score = (rng.gen_range(0.0..100.0_f64) * 100.0).round() / 100.0;
        let tier = Tier::for_score(score);

        let mut strategies = vec![headline(tier, score)];
        let factors: Vec<&str> = FACTORS
            .choose_multiple(&mut rng, FACTOR_PICKS)
            .copied()
            .collect();
        for factor in factors {
            let weight = rng.gen_range(0.05..0.4_f64);
            strategies.push(factor_strategy(tier, factor, weight));
        }

        let rank = rng.gen_range(1..=20_i64);
        let points = ((21 - rank) * 4 + rng.gen_range(0..=12_i64)).min(100);
        let revenue = (rng.gen_range(90.0..650.0_f64) * 10.0).round() / 10.0;
        let wages = (revenue * rng.gen_range(0.45..0.9_f64) * 10.0).round() / 10.0;

        let mut facts = BTreeMap::new();
        facts.insert("Season".to_string(), json!("2022-2023"));
        facts.insert(
            "Wage to Revenue Ratio".to_string(),
            json!(((wages / revenue) * 100.0).round() / 100.0),
        );

        ClubRecord {
            name: name.to_string(),
            score: Some(score),
            strategies,
            server_category: None,
            revenue: Some(json!(revenue)),
            wages: Some(json!(wages)),
            rank: Some(Value::from(rank)),
            points: Some(Value::from(points)),
            goal_difference: Some(Value::from(rng.gen_range(-40..=60_i64))),
            facts,
        }
    }
}

impl RiskSource for DemoRiskSource {
    fn club_names(&self) -> Result<Vec<String>> {
        self.pause();
        Ok(DEMO_CLUBS.iter().map(|name| name.to_string()).collect())
    }

    fn assess(&self, names: &[String]) -> Result<Vec<ClubRecord>> {
        self.pause();
        Ok(DEMO_CLUBS
            .iter()
            .filter(|club| names.iter().any(|n| n == *club))
            .map(|club| Self::record_for(club))
            .collect())
    }

    fn label(&self) -> &str {
        "demo"
    }
}

impl DemoRiskSource {
    fn pause(&self) {
        if self.latency.is_zero() {
            return;
        }
        // Jitter keeps concurrent single-club fetches from finishing in order.
        let jitter = rand::thread_rng().gen_range(0..=self.latency.as_millis() as u64);
        thread::sleep(self.latency / 2 + Duration::from_millis(jitter / 2));
    }
}

/// Stable across builds and platforms, unlike `DefaultHasher`.
fn name_seed(name: &str) -> u64 {
    let digest = Sha256::digest(name.as_bytes());
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed)
}

fn headline(tier: Tier, score: f64) -> String {
    match tier {
        Tier::High => {
            format!("High Risk (Score: {score:.2}). Urgent action required on key factors.")
        }
        Tier::Medium => format!(
            "Medium Risk (Score: {score:.2}). Close monitoring and targeted improvements needed."
        ),
        Tier::Low => format!(
            "Low Risk (Score: {score:.2}). Maintain current strategy with minor optimizations."
        ),
        Tier::VeryLow => format!(
            "Very Low Risk (Score: {score:.2}). Excellent position. Focus on sustaining performance and exploring growth opportunities."
        ),
    }
}

fn factor_strategy(tier: Tier, factor: &str, weight: f64) -> String {
    let known = match tier {
        Tier::High => match factor {
            "Wage to Revenue Ratio" => {
                Some("Urgently reduce wage bill by 15% or increase revenue streams by 20%")
            }
            "Transfer Efficiency" => Some(
                "Significantly improve scouting network and focus on selling players at peak value. Aim for 30% increase in transfer profits",
            ),
            "Revenue per Player" => Some(
                "Substantially increase commercial activities and optimize squad size. Target 25% increase in revenue per player",
            ),
            "Points Change" => Some(
                "Invest heavily in performance analytics and coaching staff to improve on-field results. Aim for 10-point improvement next season",
            ),
            "Rank" => Some(
                "Prioritize short-term performance boost to climb league table. Target moving up at least 3 positions",
            ),
            "Win Percentage" => Some(
                "Implement major tactical overhaul and squad improvements. Aim for at least 15% increase in win percentage",
            ),
            "Points per Player" => Some(
                "Focus on significant performance improvement or strategic squad reduction. Aim to increase points gained by at least 5 per player",
            ),
            _ => None,
        },
        Tier::Medium => match factor {
            "Points Change" => Some(
                "Invest in performance analytics to improve on-field results. Aim for at least a 5-point improvement",
            ),
            "Wage per Point" => Some(
                "Implement performance-based wage structure. Target 10% reduction in wage per point",
            ),
            "Transfer Net Spend Ratio" => Some(
                "Balance transfer activity with focus on youth development. Aim to reduce net spend by 20%",
            ),
            "Revenue per Point" => Some(
                "Optimize matchday and commercial revenues. Target 15% increase in revenue per point",
            ),
            "Win Percentage" => Some(
                "Focus on tactical improvements and player development. Aim for 10% increase in win percentage",
            ),
            "Rank" => Some(
                "Implement strategies to climb league table. Target moving up at least 2 positions",
            ),
            _ => None,
        },
        Tier::Low => match factor {
            "Wage to Revenue Ratio" => Some(
                "Fine-tune wage structure or explore new revenue streams. Aim for 5% improvement",
            ),
            "Transfer Efficiency" => Some(
                "Optimize scouting and transfer strategies. Target 10% increase in efficiency",
            ),
            "Revenue per Player" => Some(
                "Explore innovative commercial opportunities. Aim for 8% increase in revenue per player",
            ),
            "Points Change" => {
                Some("Implement minor tactical adjustments. Target 2-3 point improvement")
            }
            "Rank" => Some("Maintain current league position with an eye on moving up 1 spot"),
            "Win Percentage" => Some(
                "Focus on incremental improvements in team performance. Aim for 5% increase in win percentage",
            ),
            "Points per Player" => Some(
                "Slight optimization of squad performance. Target 2-point increase per player",
            ),
            _ => None,
        },
        Tier::VeryLow => match factor {
            "Wage to Revenue Ratio" => Some(
                "Maintain current balance. Consider reinvesting in squad or facilities if opportunity arises",
            ),
            "Transfer Efficiency" => Some(
                "Sustain excellent transfer strategy. Explore opportunities for knowledge sharing within the club",
            ),
            "Revenue per Player" => Some(
                "Maintain high revenue per player. Explore innovative sponsorship or marketing campaigns",
            ),
            "Points Change" => Some(
                "Sustain excellent performance. Focus on squad depth and youth development for long-term success",
            ),
            "Rank" => Some(
                "Excellent league position. Focus on maintaining performance and planning for future seasons",
            ),
            "Win Percentage" => Some(
                "Outstanding win rate. Emphasize consistency and prepare for potential challenges next season",
            ),
            "Points per Player" => Some(
                "Excellent points per player ratio. Focus on maintaining squad harmony and gradual improvements",
            ),
            _ => None,
        },
    };
    if let Some(text) = known {
        return text.to_string();
    }
    match tier {
        Tier::High => format!(
            "Address {factor} urgently with a target of {}% improvement to mitigate high risk",
            (weight * 100.0) as i64
        ),
        Tier::Medium => format!(
            "Improve {factor} by approximately {}% to reduce risk level",
            (weight * 75.0) as i64
        ),
        Tier::Low => format!(
            "Fine-tune {factor} with a target of {}% improvement for continued stability",
            (weight * 50.0) as i64
        ),
        Tier::VeryLow => format!(
            "Maintain excellent performance in {factor}. Explore minor optimizations if beneficial"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_are_repeatable_and_in_range() {
        let a = DemoRiskSource::record_for("Arsenal");
        let b = DemoRiskSource::record_for("Arsenal");
        assert_eq!(a, b);
        let score = a.score.expect("demo records are scored");
        assert!((0.0..=100.0).contains(&score));
        assert_eq!(a.strategies.len(), 1 + FACTOR_PICKS);
    }

    #[test]
    fn assess_skips_unknown_clubs() {
        let source = DemoRiskSource::new();
        let out = source
            .assess(&["Arsenal".to_string(), "Atlantis FC".to_string()])
            .expect("demo never fails");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Arsenal");
    }

    #[test]
    fn headline_matches_tier() {
        assert_eq!(Tier::for_score(70.5), Tier::High);
        assert_eq!(Tier::for_score(70.0), Tier::Medium);
        assert_eq!(Tier::for_score(20.0), Tier::VeryLow);
        assert!(headline(Tier::Low, 25.0).starts_with("Low Risk (Score: 25.00)"));
    }

    #[test]
    fn unmapped_factor_in_tier_uses_generic_text() {
        let text = factor_strategy(Tier::Medium, "Revenue per Player", 0.2);
        assert_eq!(text, "Improve Revenue per Player by approximately 15% to reduce risk level");
    }

    #[test]
    fn name_seed_is_stable_and_distinct() {
        assert_eq!(name_seed("Arsenal"), name_seed("Arsenal"));
        assert_ne!(name_seed("Arsenal"), name_seed("arsenal"));
        assert_ne!(name_seed("Arsenal"), name_seed("Chelsea"));
        let seeds: std::collections::BTreeSet<u64> =
            DEMO_CLUBS.iter().map(|name| name_seed(name)).collect();
        assert_eq!(seeds.len(), DEMO_CLUBS.len());
    }
}
