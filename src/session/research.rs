use serde::{Deserialize, Serialize};
use std::fmt;

use crate::protocol::lenient;

/// Stage of a deep-research run.
///
/// Tracked beside the main session state; it never decides whether a
/// session is finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResearchPhase {
    Planning,
    Researching,
    Compressing,
    Writing,
    /// A phase name this client does not know about
    Other(String),
}

impl From<String> for ResearchPhase {
    fn from(phase: String) -> Self {
        match phase.as_str() {
            "planning" => Self::Planning,
            "researching" => Self::Researching,
            "compressing" => Self::Compressing,
            "writing" => Self::Writing,
            _ => Self::Other(phase),
        }
    }
}

impl From<ResearchPhase> for String {
    fn from(phase: ResearchPhase) -> Self {
        phase.to_string()
    }
}

impl fmt::Display for ResearchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Planning => f.write_str("planning"),
            Self::Researching => f.write_str("researching"),
            Self::Compressing => f.write_str("compressing"),
            Self::Writing => f.write_str("writing"),
            Self::Other(phase) => f.write_str(phase),
        }
    }
}

/// Running counters of a research run.
///
/// Counters are `None` until the server first reports them. Updates only
/// overwrite the fields they carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchProgress {
    pub total_units: Option<u32>,
    pub completed_units: Option<u32>,
    pub sources_found: Option<u32>,
    pub sub_questions: Vec<String>,
}

impl ResearchProgress {
    pub fn merge_counts(
        &mut self,
        total_units: Option<u32>,
        completed_units: Option<u32>,
        sources_found: Option<u32>,
    ) {
        if total_units.is_some() {
            self.total_units = total_units;
        }
        if completed_units.is_some() {
            self.completed_units = completed_units;
        }
        if sources_found.is_some() {
            self.sources_found = sources_found;
        }
    }

    pub fn replace_plan(&mut self, sub_questions: Vec<String>) {
        self.sub_questions = sub_questions;
    }
}

/// Summary statistics attached to a finished research answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchStats {
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_units: Option<u32>,
    #[serde(default, alias = "completed", deserialize_with = "lenient::count")]
    pub completed_units: Option<u32>,
    #[serde(default, alias = "notes_found", deserialize_with = "lenient::count")]
    pub sources_found: Option<u32>,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub sub_questions: Vec<String>,
    /// Server fields this client does not interpret
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ResearchStats {
    /// Overwrites the fields `reported` carries and keeps the rest.
    pub fn overlay(mut self, reported: Self) -> Self {
        if reported.total_units.is_some() {
            self.total_units = reported.total_units;
        }
        if reported.completed_units.is_some() {
            self.completed_units = reported.completed_units;
        }
        if reported.sources_found.is_some() {
            self.sources_found = reported.sources_found;
        }
        if !reported.sub_questions.is_empty() {
            self.sub_questions = reported.sub_questions;
        }
        self.extra.extend(reported.extra);
        self
    }
}

impl From<&ResearchProgress> for ResearchStats {
    fn from(progress: &ResearchProgress) -> Self {
        Self {
            total_units: progress.total_units,
            completed_units: progress.completed_units,
            sources_found: progress.sources_found,
            sub_questions: progress.sub_questions.clone(),
            extra: serde_json::Map::new(),
        }
    }
}
