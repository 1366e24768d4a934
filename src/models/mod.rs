use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const UNKNOWN_POSITION: &str = "Unknown Position";

// Backends hand out either numeric or string ids, compared by value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CandidateId {
    Number(i64),
    // only reached for ids above i64::MAX
    Unsigned(u64),
    Text(String),
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateId::Number(n) => write!(f, "{}", n),
            CandidateId::Unsigned(n) => write!(f, "{}", n),
            CandidateId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for CandidateId {
    fn from(n: i64) -> Self {
        CandidateId::Number(n)
    }
}

impl From<i32> for CandidateId {
    fn from(n: i32) -> Self {
        CandidateId::Number(n.into())
    }
}

impl From<&str> for CandidateId {
    fn from(s: &str) -> Self {
        CandidateId::Text(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    #[serde(default)]
    pub dept: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

impl Candidate {
    // Position this candidate is grouped under.
    pub fn position_label(&self) -> &str {
        // Trimming only decides blankness; the label itself goes back to the server as sent
        match self.position.as_deref() {
            Some(p) if !p.trim().is_empty() => p,
            _ => UNKNOWN_POSITION,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup {
    pub position: String,
    pub candidates: Vec<Candidate>,
}

impl CategoryGroup {
    pub fn find(&self, id: &CandidateId) -> Option<&Candidate> {
        self.candidates.iter().find(|c| &c.id == id)
    }
}

// One selection slot per position, kept in the order positions were first selected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BallotSelections {
    entries: Vec<(String, CandidateId)>,
}

impl BallotSelections {
    pub fn new() -> Self {
        Self::default()
    }

    // Overwrites in place so a re-selection keeps its original slot
    pub fn select(&mut self, position: &str, candidate_id: CandidateId) {
        match self.entries.iter_mut().find(|(p, _)| p == position) {
            Some(entry) => entry.1 = candidate_id,
            None => self.entries.push((position.to_string(), candidate_id)),
        }
    }

    pub fn get(&self, position: &str) -> Option<&CandidateId> {
        self.entries
            .iter()
            .find(|(p, _)| p == position)
            .map(|(_, id)| id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CandidateId)> {
        self.entries.iter().map(|(p, id)| (p.as_str(), id))
    }
}

// Wire format of a single vote: {"position": .., "candidateId": ..}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteEntry {
    pub position: String,
    pub candidate_id: CandidateId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchVote {
    pub votes: Vec<VoteEntry>,
}

impl From<&BallotSelections> for BatchVote {
    fn from(selections: &BallotSelections) -> Self {
        let votes = selections
            .iter()
            .map(|(position, id)| VoteEntry {
                position: position.to_string(),
                candidate_id: id.clone(),
            })
            .collect();
        Self { votes }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    pub votes: usize,
    pub accepted_at: DateTime<Utc>,
}

impl SubmissionReceipt {
    pub fn new(votes: usize) -> Self {
        Self {
            votes,
            accepted_at: Utc::now(),
        }
    }
}
