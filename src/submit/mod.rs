use crate::api::BallotApi;
use crate::credentials::Credentials;
use crate::error::BallotError;
use crate::models::{BallotSelections, BatchVote, CandidateId, SubmissionReceipt, VoteEntry};
use log::{error, info};
use std::sync::Arc;

pub const SUBMISSION_FALLBACK_MESSAGE: &str = "Failed to submit vote. Please try again.";

// Sends votes to the backend. Single attempt only; clearing the credential after a
// final submission is left to the session.
pub struct VoteSubmitter {
    api: Arc<dyn BallotApi>,
    credentials: Credentials,
}

impl VoteSubmitter {
    pub fn new(api: Arc<dyn BallotApi>, credentials: Credentials) -> Self {
        Self { api, credentials }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub async fn submit_single(
        &self,
        position: &str,
        candidate_id: &CandidateId,
    ) -> Result<SubmissionReceipt, BallotError> {
        let entry = VoteEntry {
            position: position.to_string(),
            candidate_id: candidate_id.clone(),
        };
        let body = serde_json::to_value(&entry).map_err(|e| BallotError::Submission(e.to_string()))?;

        self.send(body).await?;
        info!("Vote for {} recorded", position);
        Ok(SubmissionReceipt::new(1))
    }

    pub async fn submit_batch(
        &self,
        selections: &BallotSelections,
    ) -> Result<SubmissionReceipt, BallotError> {
        if selections.is_empty() {
            return Err(BallotError::EmptyBatch);
        }

        let batch = BatchVote::from(selections);
        let count = batch.votes.len();
        let body = serde_json::to_value(&batch).map_err(|e| BallotError::Submission(e.to_string()))?;

        self.send(body).await?;
        info!("Ballot of {} votes recorded", count);
        Ok(SubmissionReceipt::new(count))
    }

    async fn send(&self, body: serde_json::Value) -> Result<(), BallotError> {
        // A missing token is not a failure here; the server decides
        let token = self.credentials.bearer_token().await;

        let response = self.api.post_vote(body, token.as_deref()).await.map_err(|e| {
            error!("Vote submission failed: {}", e);
            BallotError::Submission(SUBMISSION_FALLBACK_MESSAGE.to_string())
        })?;

        if response.is_success() {
            return Ok(());
        }

        error!("Vote submission rejected with status {}", response.status);
        let text = response.body.trim();
        if text.is_empty() {
            Err(BallotError::Submission(SUBMISSION_FALLBACK_MESSAGE.to_string()))
        } else {
            Err(BallotError::Submission(text.to_string()))
        }
    }
}
