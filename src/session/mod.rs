// The ballot session: walks the voter through one category at a time, gates every
// vote behind the biometric check and finishes with a single batch submission.

use crate::auth::AuthGate;
use crate::catalog::CandidateCatalog;
use crate::error::BallotError;
use crate::models::{BallotSelections, CandidateId, CategoryGroup};
use crate::submit::VoteSubmitter;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Loading,
    // Catalog loaded but held no candidates.
    NoData,
    // Catalog failed; a new session is needed to retry.
    Error(String),
    Ready(usize),
    Authenticating(usize),
    SubmittingVote(usize),
    Confirmed(usize),
    Reviewing,
    FinalAuthenticating,
    FinalSubmitting,
    FinalConfirmed,
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Confirmation {
    VoteRecorded { position: String },
    BallotSubmitted { votes: usize },
}

// Presentation side of the session.
#[async_trait]
pub trait Presenter: Send + Sync {
    // One-line message for the voter.
    fn notice(&self, message: &str);

    // Resolves once the confirmation has been displayed for its full window.
    async fn confirm(&self, confirmation: &Confirmation);
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewLine {
    pub position: String,
    pub candidate_id: CandidateId,
    pub candidate_name: Option<String>,
}

pub struct BallotSession {
    id: Uuid,
    state: SessionState,
    categories: Vec<CategoryGroup>,
    selections: BallotSelections,
    cursor: usize,
    // set while an authentication, submission or confirmation is in flight
    busy: bool,
    auth: AuthGate,
    submitter: VoteSubmitter,
    presenter: Arc<dyn Presenter>,
}

impl BallotSession {
    pub fn new(auth: AuthGate, submitter: VoteSubmitter, presenter: Arc<dyn Presenter>) -> Self {
        let id = Uuid::new_v4();
        info!("[{}] Ballot session started", id);
        Self {
            id,
            state: SessionState::Loading,
            categories: Vec::new(),
            selections: BallotSelections::new(),
            cursor: 0,
            busy: false,
            auth,
            submitter,
            presenter,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn categories(&self) -> &[CategoryGroup] {
        &self.categories
    }

    pub fn selections(&self) -> &BallotSelections {
        &self.selections
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    // The category being voted on, if the session is inside the per-category flow.
    pub fn current_category(&self) -> Option<&CategoryGroup> {
        match self.state {
            SessionState::Ready(i)
            | SessionState::Authenticating(i)
            | SessionState::SubmittingVote(i)
            | SessionState::Confirmed(i) => self.categories.get(i),
            _ => None,
        }
    }

    pub async fn load(&mut self, catalog: &CandidateCatalog) -> Result<(), BallotError> {
        if self.state != SessionState::Loading {
            return self.reject(BallotError::InvalidState("load candidates"));
        }

        match catalog.load().await {
            Ok(groups) if groups.is_empty() => {
                self.transition(SessionState::NoData);
                self.presenter.notice("No candidates are available.");
                Ok(())
            }
            Ok(groups) => {
                self.categories = groups;
                self.selections = BallotSelections::new();
                self.cursor = 0;
                self.transition(SessionState::Ready(0));
                Ok(())
            }
            Err(e) => {
                error!("[{}] Catalog load failed: {}", self.id, e);
                self.transition(SessionState::Error(e.to_string()));
                self.presenter.notice(&e.to_string());
                Err(e)
            }
        }
    }

    // Records the voter's choice for the current category, replacing any earlier one.
    pub fn select(&mut self, candidate_id: CandidateId) -> Result<(), BallotError> {
        if self.busy {
            return self.reject(BallotError::Busy);
        }
        let index = match self.state {
            SessionState::Ready(i) => i,
            _ => return self.reject(BallotError::InvalidState("change a selection")),
        };

        let category = &self.categories[index];
        if category.find(&candidate_id).is_none() {
            let err = BallotError::UnknownCandidate {
                position: category.position.clone(),
                candidate: candidate_id.to_string(),
            };
            return self.reject(err);
        }

        let position = category.position.clone();
        debug!("[{}] Selected {} for {}", self.id, candidate_id, position);
        self.selections.select(&position, candidate_id);
        Ok(())
    }

    // Authenticates and submits the current category's selection, then advances.
    pub async fn cast_vote(&mut self) -> Result<(), BallotError> {
        if self.busy {
            return self.reject(BallotError::Busy);
        }
        let index = match self.state {
            SessionState::Ready(i) => i,
            _ => return self.reject(BallotError::InvalidState("cast a vote")),
        };
        let position = self.categories[index].position.clone();
        let candidate_id = match self.selections.get(&position) {
            Some(id) => id.clone(),
            None => return self.reject(BallotError::NoSelection(position)),
        };

        self.busy = true;
        let result = self.run_vote(index, &position, &candidate_id).await;
        self.busy = false;
        result
    }

    async fn run_vote(
        &mut self,
        index: usize,
        position: &str,
        candidate_id: &CandidateId,
    ) -> Result<(), BallotError> {
        // Biometric check first; a rejection leaves the category open for another try
        self.transition(SessionState::Authenticating(index));
        let prompt = format!("Confirm your identity to vote for {}", position);
        if let Err(e) = self.auth.verify(&prompt).await {
            return self.revert(SessionState::Ready(index), e);
        }

        // Submit this position on its own, keeping the selection if the server refuses
        self.transition(SessionState::SubmittingVote(index));
        let receipt = match self.submitter.submit_single(position, candidate_id).await {
            Ok(receipt) => receipt,
            Err(e) => return self.revert(SessionState::Ready(index), e),
        };
        info!("[{}] Vote for {} accepted at {}", self.id, position, receipt.accepted_at.to_rfc3339());

        // Show the confirmation and wait for it to finish before moving on
        self.transition(SessionState::Confirmed(index));
        self.presenter
            .confirm(&Confirmation::VoteRecorded {
                position: position.to_string(),
            })
            .await;

        // Next category, or the review screen after the last one
        self.cursor = index + 1;
        if self.cursor < self.categories.len() {
            self.transition(SessionState::Ready(self.cursor));
        } else {
            self.transition(SessionState::Reviewing);
        }
        Ok(())
    }

    // Selections in ballot order, for the review screen.
    pub fn review(&self) -> Vec<ReviewLine> {
        self.categories
            .iter()
            .filter_map(|category| {
                let id = self.selections.get(&category.position)?;
                Some(ReviewLine {
                    position: category.position.clone(),
                    candidate_id: id.clone(),
                    candidate_name: category.find(id).map(|c| c.name.clone()),
                })
            })
            .collect()
    }

    // Authenticates and submits every selection as one batch, then logs the voter out.
    pub async fn submit_ballot(&mut self) -> Result<(), BallotError> {
        if self.busy {
            return self.reject(BallotError::Busy);
        }
        if self.state != SessionState::Reviewing {
            return self.reject(BallotError::InvalidState("submit the ballot"));
        }
        if self.selections.is_empty() {
            return self.reject(BallotError::EmptyBatch);
        }

        self.busy = true;
        let result = self.run_final_submission().await;
        self.busy = false;
        result
    }

    async fn run_final_submission(&mut self) -> Result<(), BallotError> {
        // Same biometric gate as the per-category votes
        self.transition(SessionState::FinalAuthenticating);
        if let Err(e) = self.auth.verify("Confirm your identity to submit your ballot").await {
            return self.revert(SessionState::Reviewing, e);
        }

        // Whole ballot in one request; on failure we stay in review with everything intact
        self.transition(SessionState::FinalSubmitting);
        let receipt = match self.submitter.submit_batch(&self.selections).await {
            Ok(receipt) => receipt,
            Err(e) => return self.revert(SessionState::Reviewing, e),
        };
        info!(
            "[{}] Ballot of {} votes accepted at {}",
            self.id,
            receipt.votes,
            receipt.accepted_at.to_rfc3339()
        );

        // Confirm, then forget the ballot and log the voter out
        self.transition(SessionState::FinalConfirmed);
        self.presenter
            .confirm(&Confirmation::BallotSubmitted { votes: receipt.votes })
            .await;

        self.selections.clear();
        // Closing does not wait on a clean logout
        if let Err(e) = self.submitter.credentials().invalidate().await {
            error!("[{}] Credential could not be cleared after submission: {}", self.id, e);
        }
        self.transition(SessionState::Closed);
        Ok(())
    }

    // Drops every selection and closes the session. The credential is kept.
    pub fn abandon(&mut self) -> Result<(), BallotError> {
        if self.busy {
            return self.reject(BallotError::Busy);
        }
        self.selections.clear();
        if self.state != SessionState::Closed {
            self.transition(SessionState::Closed);
        }
        Ok(())
    }

    fn transition(&mut self, next: SessionState) {
        info!("[{}] {:?} -> {:?}", self.id, self.state, next);
        self.state = next;
    }

    fn revert(&mut self, to: SessionState, err: BallotError) -> Result<(), BallotError> {
        warn!("[{}] {:?} reverted to {:?}: {}", self.id, self.state, to, err);
        self.state = to;
        self.presenter.notice(&err.to_string());
        Err(err)
    }

    fn reject(&self, err: BallotError) -> Result<(), BallotError> {
        debug!("[{}] Rejected in {:?}: {}", self.id, self.state, err);
        self.presenter.notice(&err.to_string());
        Err(err)
    }
}
