use crate::api::BallotApi;
use crate::error::BallotError;
use crate::models::{Candidate, CategoryGroup};
use log::{error, info};
use std::collections::HashMap;
use std::sync::Arc;

pub struct CandidateCatalog {
    api: Arc<dyn BallotApi>,
}

impl CandidateCatalog {
    pub fn new(api: Arc<dyn BallotApi>) -> Self {
        Self { api }
    }

    // Each call is an independent snapshot of the remote list
    pub async fn load(&self) -> Result<Vec<CategoryGroup>, BallotError> {
        let response = self.api.get_candidates().await.map_err(|e| {
            error!("Candidate fetch failed: {}", e);
            BallotError::Fetch(e.to_string())
        })?;

        if !response.is_success() {
            error!("Candidate fetch returned status {}", response.status);
            return Err(BallotError::Fetch(format!("server returned status {}", response.status)));
        }

        let candidates = parse_candidates(&response.body)?;
        let groups = group_by_position(candidates);
        info!("Loaded {} categories", groups.len());
        Ok(groups)
    }
}

// Validates the payload as a JSON array of candidate records.
pub fn parse_candidates(body: &str) -> Result<Vec<Candidate>, BallotError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| BallotError::Format(e.to_string()))?;

    if !value.is_array() {
        return Err(BallotError::Format("expected a list of candidates".to_string()));
    }

    serde_json::from_value(value).map_err(|e| BallotError::Format(e.to_string()))
}

// Single pass grouping; positions keep the order they were first seen in.
pub fn group_by_position(candidates: Vec<Candidate>) -> Vec<CategoryGroup> {
    // Groups in first-seen order, plus a lookup from position to its slot
    let mut groups: Vec<CategoryGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for candidate in candidates {
        // Label exactly as the backend sent it, so it round-trips on the vote
        let position = candidate.position_label().to_string();
        match index.get(&position) {
            // Seen before: append, keeping the candidate order within the position
            Some(&i) => groups[i].candidates.push(candidate),
            // First sighting opens a new category at the end
            None => {
                index.insert(position.clone(), groups.len());
                groups.push(CategoryGroup {
                    position,
                    candidates: vec![candidate],
                });
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateId, UNKNOWN_POSITION};
    use crate::testing::{FakeApi, SCENARIO_CANDIDATES};

    fn positions(groups: &[CategoryGroup]) -> Vec<&str> {
        groups.iter().map(|g| g.position.as_str()).collect()
    }

    #[tokio::test]
    async fn groups_by_first_seen_position() {
        let catalog = CandidateCatalog::new(Arc::new(FakeApi::with_candidates(SCENARIO_CANDIDATES)));

        let groups = catalog.load().await.unwrap();

        assert_eq!(positions(&groups), vec!["President", "Secretary"]);
        let president_ids: Vec<&CandidateId> = groups[0].candidates.iter().map(|c| &c.id).collect();
        assert_eq!(president_ids, vec![&CandidateId::Number(1), &CandidateId::Number(2)]);
        assert_eq!(groups[1].candidates.len(), 1);
    }

    #[test]
    fn interleaved_positions_partition_every_candidate_once() {
        let body = r#"[
            {"id": "a", "name": "A", "position": "Treasurer"},
            {"id": "b", "name": "B", "position": "President"},
            {"id": "c", "name": "C"},
            {"id": "d", "name": "D", "position": "Treasurer"},
            {"id": "e", "name": "E", "position": "President"}
        ]"#;

        let groups = group_by_position(parse_candidates(body).unwrap());

        assert_eq!(positions(&groups), vec!["Treasurer", "President", UNKNOWN_POSITION]);
        let total: usize = groups.iter().map(|g| g.candidates.len()).sum();
        assert_eq!(total, 5);
        for group in &groups {
            assert!(group.candidates.iter().all(|c| c.position_label() == group.position));
        }
    }

    #[test]
    fn labels_differing_in_whitespace_stay_separate() {
        let body = r#"[
            {"id": 1, "name": "A", "position": "President "},
            {"id": 2, "name": "B", "position": "President"}
        ]"#;

        let groups = group_by_position(parse_candidates(body).unwrap());

        assert_eq!(positions(&groups), vec!["President ", "President"]);
        assert_eq!(groups[0].candidates[0].id, CandidateId::Number(1));
        assert_eq!(groups[1].candidates[0].id, CandidateId::Number(2));
    }

    #[tokio::test]
    async fn non_success_status_is_a_fetch_failure() {
        let api = FakeApi::default();
        api.push_candidates(503, "maintenance");
        let catalog = CandidateCatalog::new(Arc::new(api));

        match catalog.load().await {
            Err(BallotError::Fetch(msg)) => assert!(msg.contains("503")),
            other => panic!("expected fetch failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_fetch_failure() {
        let api = FakeApi::default();
        api.push_candidates_unreachable();
        let catalog = CandidateCatalog::new(Arc::new(api));

        assert!(matches!(catalog.load().await, Err(BallotError::Fetch(_))));
    }

    #[test]
    fn non_array_payloads_are_format_failures() {
        assert!(matches!(parse_candidates(r#"{"candidates": []}"#), Err(BallotError::Format(_))));
        assert!(matches!(parse_candidates("not json"), Err(BallotError::Format(_))));
        // records missing a name are rejected rather than carried as blanks
        assert!(matches!(parse_candidates(r#"[{"id": 1}]"#), Err(BallotError::Format(_))));
    }

    #[tokio::test]
    async fn repeated_loads_are_independent() {
        let api = Arc::new(FakeApi::with_candidates(SCENARIO_CANDIDATES));
        api.push_candidates(200, r#"[{"id": 9, "name": "Z", "position": "Auditor"}]"#);
        let catalog = CandidateCatalog::new(api.clone());

        let first = catalog.load().await.unwrap();
        let second = catalog.load().await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(positions(&second), vec!["Auditor"]);
        assert_eq!(api.candidate_calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
