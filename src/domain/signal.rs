//! Trade signals and gate evaluation records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque correlation token linking a signal to its order, fill and risk events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(String);

impl TraceId {
    /// Generate a fresh 12 hex character identifier.
    #[must_use]
    pub fn generate() -> Self {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(12);
        Self(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TraceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Emitted once per gate pass, consumed once by the execution stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub t: f64,
    pub mid: f64,
    pub trace_id: TraceId,
}

/// Outcome of each gate condition for one observation, with the raw inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateEvaluation {
    pub t: f64,
    pub phase: Option<f64>,
    pub phase_ok: bool,
    pub dob_thin: bool,
    pub spread_ok: bool,
    pub obi_ok: bool,
    pub mid: f64,
    pub dob: f64,
    /// Median depth over the window, if a baseline exists yet.
    pub dob_median: Option<f64>,
    pub spread_ticks: f64,
    pub obi: f64,
}

impl GateEvaluation {
    #[must_use]
    pub fn all_pass(&self) -> bool {
        self.phase_ok && self.dob_thin && self.spread_ok && self.obi_ok
    }

    /// Names of the conditions that failed.
    #[must_use]
    pub fn missing(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if !self.phase_ok {
            out.push("phase");
        }
        if !self.dob_thin {
            out.push("dob_thin");
        }
        if !self.spread_ok {
            out.push("spread");
        }
        if !self.obi_ok {
            out.push("obi");
        }
        out
    }
}
