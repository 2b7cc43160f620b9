//! Arena battle state container.
//!
//! A battle compares the responses of several models to one prompt. All
//! state changes go through [`ArenaState::reduce`], which returns a new
//! state or rejects the action; nothing mutates a battle in place.
//!
//! # Invariants
//! - A battle has between [`MIN_MODELS`] and [`MAX_MODELS`] distinct models.
//! - Status only moves forward: streaming → completed → voted → continued.
//! - A vote winner must be a model whose response completed.

use crate::model::area::AreaId;
use crate::model::space::SpaceId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type BattleId = Uuid;

pub const MIN_MODELS: usize = 2;
pub const MAX_MODELS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleStatus {
    Streaming,
    Completed,
    Voted,
    Continued,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Pending,
    Streaming,
    Done,
    Failed,
}

impl ResponseStatus {
    fn is_settled(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelResponse {
    pub model: String,
    pub status: ResponseStatus,
    pub content: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VoteOutcome {
    Winner { model: String },
    Tie,
    BothBad,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Judgment {
    pub winner: Option<String>,
    pub reasoning: String,
}

/// Where a battle was continued as a regular conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandOff {
    pub space_id: SpaceId,
    pub area_id: AreaId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArenaState {
    pub id: BattleId,
    pub prompt: String,
    pub status: BattleStatus,
    pub responses: Vec<ModelResponse>,
    pub vote: Option<VoteOutcome>,
    pub judgment: Option<Judgment>,
    pub continued_in: Option<HandOff>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ArenaAction {
    ResponseStarted { model: String },
    ResponseCompleted { model: String, content: String },
    ResponseFailed { model: String, error: String },
    Vote { outcome: VoteOutcome },
    Judged { winner: Option<String>, reasoning: String },
    ContinueInSpace { space_id: SpaceId, area_id: AreaId },
}

impl ArenaAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ResponseStarted { .. } => "response_started",
            Self::ResponseCompleted { .. } => "response_completed",
            Self::ResponseFailed { .. } => "response_failed",
            Self::Vote { .. } => "vote",
            Self::Judged { .. } => "judged",
            Self::ContinueInSpace { .. } => "continue_in_space",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    BlankPrompt,
    BlankModel,
    ModelCount { got: usize },
    DuplicateModel(String),
    UnknownModel(String),
    ResponseAlreadySettled(String),
    WinnerNotCompleted(String),
    AlreadyJudged,
    InvalidTransition {
        status: BattleStatus,
        action: &'static str,
    },
}

impl Display for ArenaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankPrompt => write!(f, "arena prompt must not be blank"),
            Self::BlankModel => write!(f, "arena model names must not be blank"),
            Self::ModelCount { got } => write!(
                f,
                "arena battles need {MIN_MODELS}..={MAX_MODELS} models, got {got}"
            ),
            Self::DuplicateModel(model) => write!(f, "model listed twice: {model}"),
            Self::UnknownModel(model) => write!(f, "model is not part of this battle: {model}"),
            Self::ResponseAlreadySettled(model) => {
                write!(f, "response for {model} already finished")
            }
            Self::WinnerNotCompleted(model) => {
                write!(f, "winner {model} has no completed response")
            }
            Self::AlreadyJudged => write!(f, "battle was already judged"),
            Self::InvalidTransition { status, action } => {
                write!(f, "action `{action}` is not allowed while battle is {status:?}")
            }
        }
    }
}

impl Error for ArenaError {}

impl ArenaState {
    /// Starts a battle with every response pending.
    pub fn new(id: BattleId, prompt: &str, models: &[String]) -> Result<Self, ArenaError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ArenaError::BlankPrompt);
        }
        if !(MIN_MODELS..=MAX_MODELS).contains(&models.len()) {
            return Err(ArenaError::ModelCount { got: models.len() });
        }

        let mut seen = HashSet::new();
        let mut responses = Vec::with_capacity(models.len());
        for model in models {
            let model = model.trim();
            if model.is_empty() {
                return Err(ArenaError::BlankModel);
            }
            if !seen.insert(model.to_string()) {
                return Err(ArenaError::DuplicateModel(model.to_string()));
            }
            responses.push(ModelResponse {
                model: model.to_string(),
                status: ResponseStatus::Pending,
                content: String::new(),
                error: None,
            });
        }

        Ok(Self {
            id,
            prompt: prompt.to_string(),
            status: BattleStatus::Streaming,
            responses,
            vote: None,
            judgment: None,
            continued_in: None,
        })
    }

    /// Applies one action and returns the resulting state.
    pub fn reduce(&self, action: &ArenaAction) -> Result<Self, ArenaError> {
        let mut next = self.clone();
        match action {
            ArenaAction::ResponseStarted { model } => {
                next.expect_status(&[BattleStatus::Streaming], action)?;
                let response = next.response_mut(model)?;
                if response.status.is_settled() {
                    return Err(ArenaError::ResponseAlreadySettled(model.clone()));
                }
                response.status = ResponseStatus::Streaming;
            }
            ArenaAction::ResponseCompleted { model, content } => {
                next.expect_status(&[BattleStatus::Streaming], action)?;
                let response = next.response_mut(model)?;
                if response.status.is_settled() {
                    return Err(ArenaError::ResponseAlreadySettled(model.clone()));
                }
                response.status = ResponseStatus::Done;
                response.content = content.clone();
                next.complete_if_settled();
            }
            ArenaAction::ResponseFailed { model, error } => {
                next.expect_status(&[BattleStatus::Streaming], action)?;
                let response = next.response_mut(model)?;
                if response.status.is_settled() {
                    return Err(ArenaError::ResponseAlreadySettled(model.clone()));
                }
                response.status = ResponseStatus::Failed;
                response.error = Some(error.clone());
                next.complete_if_settled();
            }
            ArenaAction::Vote { outcome } => {
                next.expect_status(&[BattleStatus::Completed], action)?;
                if let VoteOutcome::Winner { model } = outcome {
                    next.ensure_completed(model)?;
                }
                next.vote = Some(outcome.clone());
                next.status = BattleStatus::Voted;
            }
            ArenaAction::Judged { winner, reasoning } => {
                next.expect_status(&[BattleStatus::Completed, BattleStatus::Voted], action)?;
                if next.judgment.is_some() {
                    return Err(ArenaError::AlreadyJudged);
                }
                if let Some(model) = winner {
                    next.ensure_completed(model)?;
                }
                next.judgment = Some(Judgment {
                    winner: winner.clone(),
                    reasoning: reasoning.clone(),
                });
            }
            ArenaAction::ContinueInSpace { space_id, area_id } => {
                next.expect_status(&[BattleStatus::Voted], action)?;
                next.continued_in = Some(HandOff {
                    space_id: *space_id,
                    area_id: *area_id,
                });
                next.status = BattleStatus::Continued;
            }
        }
        Ok(next)
    }

    /// Model picked by the user, falling back to the judge.
    pub fn winning_model(&self) -> Option<&str> {
        match &self.vote {
            Some(VoteOutcome::Winner { model }) => Some(model.as_str()),
            _ => self
                .judgment
                .as_ref()
                .and_then(|judgment| judgment.winner.as_deref()),
        }
    }

    fn expect_status(
        &self,
        allowed: &[BattleStatus],
        action: &ArenaAction,
    ) -> Result<(), ArenaError> {
        if allowed.contains(&self.status) {
            return Ok(());
        }
        Err(ArenaError::InvalidTransition {
            status: self.status,
            action: action.name(),
        })
    }

    fn response_mut(&mut self, model: &str) -> Result<&mut ModelResponse, ArenaError> {
        self.responses
            .iter_mut()
            .find(|response| response.model == model)
            .ok_or_else(|| ArenaError::UnknownModel(model.to_string()))
    }

    fn ensure_completed(&self, model: &str) -> Result<(), ArenaError> {
        let response = self
            .responses
            .iter()
            .find(|response| response.model == model)
            .ok_or_else(|| ArenaError::UnknownModel(model.to_string()))?;
        if response.status != ResponseStatus::Done {
            return Err(ArenaError::WinnerNotCompleted(model.to_string()));
        }
        Ok(())
    }

    fn complete_if_settled(&mut self) {
        if self
            .responses
            .iter()
            .all(|response| response.status.is_settled())
        {
            self.status = BattleStatus::Completed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn models() -> Vec<String> {
        vec!["gpt-4o".to_string(), "claude-sonnet".to_string()]
    }

    fn completed_battle() -> ArenaState {
        let state = ArenaState::new(Uuid::new_v4(), "Explain ownership", &models()).unwrap();
        let state = state
            .reduce(&ArenaAction::ResponseCompleted {
                model: "gpt-4o".to_string(),
                content: "Ownership is...".to_string(),
            })
            .unwrap();
        assert_eq!(state.status, BattleStatus::Streaming);
        state
            .reduce(&ArenaAction::ResponseFailed {
                model: "claude-sonnet".to_string(),
                error: "rate limited".to_string(),
            })
            .unwrap()
    }

    #[test]
    fn new_rejects_bad_model_lists() {
        let id = Uuid::new_v4();
        assert_eq!(
            ArenaState::new(id, "hi", &["one".to_string()]),
            Err(ArenaError::ModelCount { got: 1 })
        );
        assert_eq!(
            ArenaState::new(id, "hi", &["a".to_string(), "a".to_string()]),
            Err(ArenaError::DuplicateModel("a".to_string()))
        );
        assert_eq!(
            ArenaState::new(id, "   ", &models()),
            Err(ArenaError::BlankPrompt)
        );
        assert_eq!(
            ArenaState::new(id, "hi", &["  ".to_string(), "gpt-4o".to_string()]),
            Err(ArenaError::BlankModel)
        );
    }

    #[test]
    fn battle_completes_once_every_response_settles() {
        let state = completed_battle();
        assert_eq!(state.status, BattleStatus::Completed);
        assert_eq!(state.responses[1].error.as_deref(), Some("rate limited"));
    }

    #[test]
    fn vote_before_completion_is_rejected() {
        let state = ArenaState::new(Uuid::new_v4(), "hi", &models()).unwrap();
        let err = state
            .reduce(&ArenaAction::Vote {
                outcome: VoteOutcome::Tie,
            })
            .unwrap_err();
        assert_eq!(
            err,
            ArenaError::InvalidTransition {
                status: BattleStatus::Streaming,
                action: "vote",
            }
        );
    }

    #[test]
    fn winner_must_have_completed_response() {
        let state = completed_battle();
        let err = state
            .reduce(&ArenaAction::Vote {
                outcome: VoteOutcome::Winner {
                    model: "claude-sonnet".to_string(),
                },
            })
            .unwrap_err();
        assert_eq!(
            err,
            ArenaError::WinnerNotCompleted("claude-sonnet".to_string())
        );
    }

    #[test]
    fn vote_then_continue_records_hand_off() {
        let state = completed_battle()
            .reduce(&ArenaAction::Vote {
                outcome: VoteOutcome::Winner {
                    model: "gpt-4o".to_string(),
                },
            })
            .unwrap();
        assert_eq!(state.winning_model(), Some("gpt-4o"));

        let (space_id, area_id) = (Uuid::new_v4(), Uuid::new_v4());
        let state = state
            .reduce(&ArenaAction::ContinueInSpace { space_id, area_id })
            .unwrap();
        assert_eq!(state.status, BattleStatus::Continued);
        assert_eq!(state.continued_in, Some(HandOff { space_id, area_id }));
    }

    #[test]
    fn judge_winner_is_fallback_and_judging_happens_once() {
        let state = completed_battle()
            .reduce(&ArenaAction::Judged {
                winner: Some("gpt-4o".to_string()),
                reasoning: "more complete".to_string(),
            })
            .unwrap();
        assert_eq!(state.winning_model(), Some("gpt-4o"));
        assert_eq!(
            state
                .reduce(&ArenaAction::Judged {
                    winner: None,
                    reasoning: "again".to_string(),
                })
                .unwrap_err(),
            ArenaError::AlreadyJudged
        );
    }

    #[test]
    fn actions_deserialize_from_tagged_json() {
        let action: ArenaAction = serde_json::from_value(serde_json::json!({
            "type": "response_completed",
            "model": "gpt-4o",
            "content": "done"
        }))
        .unwrap();
        assert_eq!(action.name(), "response_completed");
    }
}
