// Fakes for the external collaborators of the ballot components.

use crate::api::{ApiResponse, BallotApi};
use crate::auth::BiometricService;
use crate::error::ApiError;
use crate::session::{Confirmation, Presenter};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedVote {
    pub body: serde_json::Value,
    pub token: Option<String>,
}

// Replies from scripted queues; an empty vote queue answers 200.
#[derive(Default)]
pub struct FakeApi {
    candidates: Mutex<VecDeque<Result<ApiResponse, ApiError>>>,
    vote_replies: Mutex<VecDeque<Result<ApiResponse, ApiError>>>,
    pub votes: Mutex<Vec<RecordedVote>>,
    pub candidate_calls: AtomicUsize,
}

impl FakeApi {
    pub fn with_candidates(body: &str) -> Self {
        let api = Self::default();
        api.push_candidates(200, body);
        api
    }

    pub fn push_candidates(&self, status: u16, body: &str) {
        self.candidates.lock().unwrap().push_back(Ok(ApiResponse {
            status,
            body: body.to_string(),
        }));
    }

    pub fn push_candidates_unreachable(&self) {
        self.candidates.lock().unwrap().push_back(Err(unreachable_error()));
    }

    pub fn push_vote_reply(&self, status: u16, body: &str) {
        self.vote_replies.lock().unwrap().push_back(Ok(ApiResponse {
            status,
            body: body.to_string(),
        }));
    }

    pub fn push_vote_unreachable(&self) {
        self.vote_replies.lock().unwrap().push_back(Err(unreachable_error()));
    }

    pub fn recorded_votes(&self) -> Vec<RecordedVote> {
        self.votes.lock().unwrap().clone()
    }
}

fn unreachable_error() -> ApiError {
    ApiError::Transport {
        url: "http://fake/api".to_string(),
        reason: "connection refused".to_string(),
    }
}

#[async_trait]
impl BallotApi for FakeApi {
    async fn get_candidates(&self) -> Result<ApiResponse, ApiError> {
        self.candidate_calls.fetch_add(1, Ordering::SeqCst);
        self.candidates
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ApiResponse { status: 200, body: "[]".to_string() }))
    }

    async fn post_vote(
        &self,
        body: serde_json::Value,
        token: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        self.votes.lock().unwrap().push(RecordedVote {
            body,
            token: token.map(str::to_string),
        });
        self.vote_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ApiResponse { status: 200, body: String::new() }))
    }
}

pub struct FakeBiometric {
    pub hardware: bool,
    pub enrolled: bool,
    pub results: Mutex<VecDeque<bool>>,
    pub challenges: Mutex<Vec<String>>,
}

impl FakeBiometric {
    pub fn passing() -> Self {
        Self {
            hardware: true,
            enrolled: true,
            results: Mutex::new(VecDeque::new()),
            challenges: Mutex::new(Vec::new()),
        }
    }

    // Next challenge fails, later ones pass.
    pub fn failing_once() -> Self {
        let fake = Self::passing();
        fake.results.lock().unwrap().push_back(false);
        fake
    }

    pub fn challenge_count(&self) -> usize {
        self.challenges.lock().unwrap().len()
    }
}

#[async_trait]
impl BiometricService for FakeBiometric {
    async fn has_hardware(&self) -> bool {
        self.hardware
    }

    async fn is_enrolled(&self) -> bool {
        self.enrolled
    }

    async fn authenticate(&self, prompt: &str) -> bool {
        self.challenges.lock().unwrap().push(prompt.to_string());
        self.results.lock().unwrap().pop_front().unwrap_or(true)
    }
}

#[derive(Default)]
pub struct RecordingPresenter {
    pub notices: Mutex<Vec<String>>,
    pub confirmations: Mutex<Vec<Confirmation>>,
}

impl RecordingPresenter {
    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }

    pub fn confirmations(&self) -> Vec<Confirmation> {
        self.confirmations.lock().unwrap().clone()
    }
}

#[async_trait]
impl Presenter for RecordingPresenter {
    fn notice(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }

    async fn confirm(&self, confirmation: &Confirmation) {
        self.confirmations.lock().unwrap().push(confirmation.clone());
    }
}

pub const SCENARIO_CANDIDATES: &str = r#"[
    {"id": 1, "name": "A", "position": "President"},
    {"id": 2, "name": "B", "position": "President"},
    {"id": 3, "name": "C", "position": "Secretary"}
]"#;
