//! Visit states.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// The closed set of states a field group can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    /// Nobody has been on site yet.
    #[default]
    Unvisited,
    /// The visit was completed.
    Visited,
    /// The site was reached but could not be serviced.
    Unavailable,
}

impl VisitStatus {
    /// All visit states, in display order.
    pub const ALL: [VisitStatus; 3] = [
        VisitStatus::Unvisited,
        VisitStatus::Visited,
        VisitStatus::Unavailable,
    ];

    /// Wire name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unvisited => "unvisited",
            Self::Visited => "visited",
            Self::Unavailable => "unavailable",
        }
    }

    /// Label used by field crews on paper sheets and in spreadsheets.
    pub fn field_label(&self) -> &'static str {
        match self {
            Self::Unvisited => "미방문",
            Self::Visited => "완료",
            Self::Unavailable => "불가",
        }
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisitStatus {
    type Err = Error;

    /// Parses a wire name or a field label, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| needle == status.as_str() || needle == status.field_label())
            .ok_or_else(|| Error::validation_field("status", format!("unknown visit state '{s}'")))
    }
}

/// Count of field groups per visit state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    /// Number of groups in each state; every state is present.
    pub counts: BTreeMap<VisitStatus, usize>,
    /// Total number of groups.
    pub total: usize,
}

impl StatusSummary {
    /// Tallies the given states.
    pub fn tally<I: IntoIterator<Item = VisitStatus>>(states: I) -> Self {
        let mut counts: BTreeMap<VisitStatus, usize> =
            VisitStatus::ALL.into_iter().map(|s| (s, 0)).collect();
        let mut total = 0;
        for state in states {
            *counts.entry(state).or_default() += 1;
            total += 1;
        }
        Self { counts, total }
    }

    /// Count for one state.
    pub fn count(&self, status: VisitStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }
}
