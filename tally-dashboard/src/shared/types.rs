/// Core data types for vote tallies
///
/// These types match the JSON payload served by a tally endpoint:
/// `{ultimaActualizacion, totalVotos, candidatos: [{id, nombre, votos, color?}]}`

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fallback palette for candidates without their own colour, indexed by rank
pub const FALLBACK_COLORS: [&str; 8] = [
    "#667eea", "#764ba2", "#4CAF50", "#FF9800", "#F44336", "#9C27B0", "#2196F3", "#FF5722",
];

/// Raw tally payload as fetched from a data source
///
/// This is the top-level message structure returned by the endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TallyPayload {
    /// Time the tally was produced
    #[serde(rename = "ultimaActualizacion")]
    pub last_updated: DateTime<Utc>,
    /// Total reported by the source. Advisory only, the normalizer recomputes it
    #[serde(rename = "totalVotos", default)]
    pub total_votes: u64,
    /// Candidates in the order the source sent them
    #[serde(rename = "candidatos")]
    pub candidates: Vec<Candidate>,
}

/// A single candidate with its raw vote count
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Candidate {
    /// Candidate identifier
    pub id: u64,
    /// Display name
    #[serde(rename = "nombre")]
    pub name: String,
    /// Vote count
    #[serde(rename = "votos")]
    pub votes: u64,
    /// Hex colour (e.g., "#667eea"), optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Candidate {
    pub fn new(id: u64, name: impl Into<String>, votes: u64) -> Self {
        Self {
            id,
            name: name.into(),
            votes,
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Candidate annotated with its share of the normalized total
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedCandidate {
    pub id: u64,
    pub name: String,
    pub votes: u64,
    /// Share of the total in percent, rounded to one decimal place
    pub percentage: Decimal,
    /// Colour to draw with: the candidate's own or a fallback by rank
    pub color: String,
}

impl RankedCandidate {
    /// Percentage with exactly one fractional digit (e.g., "36.1", "0.0")
    pub fn percentage_label(&self) -> String {
        format!("{:.1}", self.percentage)
    }

    /// Percentage as f64 for gauges and ratios
    pub fn percentage_f64(&self) -> f64 {
        self.percentage.to_f64().unwrap_or(0.0)
    }
}

/// Render-ready tally: ranked, annotated, with a recomputed total
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    /// Time the underlying tally was produced
    pub last_updated: DateTime<Utc>,
    /// Sum of all candidate vote counts, wide enough for any number of `u64` counts
    pub total_votes: u128,
    /// Candidates sorted descending by votes
    pub candidates: Vec<RankedCandidate>,
}

impl ViewModel {
    /// Check if there is anything to show
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Last-updated time as a local `HH:MM:SS` label
    pub fn last_updated_label(&self) -> String {
        self.last_updated
            .with_timezone(&chrono::Local)
            .format("%H:%M:%S")
            .to_string()
    }
}
