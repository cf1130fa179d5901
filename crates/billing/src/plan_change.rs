//! Plan change state machine
//!
//! ```text
//! Idle -> Selecting -> Classified -> Upgrading ----------> Submitting -> Success
//!                          ^     \-> ConfirmingDowngrade -/          \-> Failed
//!                          |                                             |
//!                          +------------------ Resubmit -----------------+
//! ```
//!
//! `transition` is a pure reducer over an immutable state value. The async
//! driver lives in [`crate::orchestrator`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use swiftbot_shared::{PlanSelection, Subscription};
use thiserror::Error;

use crate::classifier::{self, ChangeClassification, PlanChange};
use crate::payment_failure::FailureKind;

/// Result of a successful submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanChangeOutcome {
    pub classification: ChangeClassification,
    /// Prorated amount charged right away (upgrades)
    pub amount_charged_cents: Option<i64>,
    /// When the new plan takes effect (downgrades)
    pub effective_date: Option<DateTime<Utc>>,
    /// Localized confirmation shown to the user
    pub message: String,
    /// Subscription as reloaded after the change, if the reload worked
    pub subscription: Option<Subscription>,
}

/// Result of a failed submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanChangeFailure {
    pub kind: FailureKind,
    /// Raw (or lightly translated) error text
    pub message: String,
}

impl PlanChangeFailure {
    /// Payment failures send the user to the card-update flow
    pub fn offers_card_update(&self) -> bool {
        self.kind == FailureKind::Payment
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlanChangeState {
    #[default]
    Idle,
    /// Dialog open, current plan pre-selected
    Selecting {
        current: PlanSelection,
    },
    Classified {
        change: PlanChange,
    },
    Upgrading {
        change: PlanChange,
    },
    /// Downgrades need a second, explicit confirmation
    ConfirmingDowngrade {
        change: PlanChange,
    },
    Submitting {
        change: PlanChange,
    },
    Success {
        change: PlanChange,
        outcome: PlanChangeOutcome,
    },
    Failed {
        change: PlanChange,
        failure: PlanChangeFailure,
    },
}

impl PlanChangeState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Selecting { .. } => "selecting",
            Self::Classified { .. } => "classified",
            Self::Upgrading { .. } => "upgrading",
            Self::ConfirmingDowngrade { .. } => "confirming_downgrade",
            Self::Submitting { .. } => "submitting",
            Self::Success { .. } => "success",
            Self::Failed { .. } => "failed",
        }
    }

    /// The change being worked on, once a plan has been selected
    pub fn change(&self) -> Option<&PlanChange> {
        match self {
            Self::Idle | Self::Selecting { .. } => None,
            Self::Classified { change }
            | Self::Upgrading { change }
            | Self::ConfirmingDowngrade { change }
            | Self::Submitting { change }
            | Self::Success { change, .. }
            | Self::Failed { change, .. } => Some(change),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanChangeEvent {
    /// User opened the change-plan dialog
    Open { current: PlanSelection },
    /// User picked a plan in the dialog
    Select(PlanSelection),
    /// User pressed "change plan"
    Proceed,
    /// Upgrade goes straight to submission
    Submit,
    ConfirmDowngrade,
    DeclineDowngrade,
    Succeeded(PlanChangeOutcome),
    Failed(PlanChangeFailure),
    /// Try again after remediation (e.g. a card update)
    Resubmit,
    Close,
}

impl PlanChangeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Open { .. } => "open",
            Self::Select(_) => "select",
            Self::Proceed => "proceed",
            Self::Submit => "submit",
            Self::ConfirmDowngrade => "confirm_downgrade",
            Self::DeclineDowngrade => "decline_downgrade",
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
            Self::Resubmit => "resubmit",
            Self::Close => "close",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot {event} while {state}")]
    NotAllowed {
        state: &'static str,
        event: &'static str,
    },

    #[error("selected plan is the current plan")]
    UnchangedPlan,

    #[error("{0}")]
    InvalidPlan(String),
}

/// Compute the next state. Never mutates `state`.
pub fn transition(
    state: &PlanChangeState,
    event: PlanChangeEvent,
) -> Result<PlanChangeState, TransitionError> {
    use PlanChangeEvent as E;
    use PlanChangeState as S;

    match (state, event) {
        (S::Idle, E::Open { current }) => Ok(S::Selecting { current }),

        (S::Selecting { current }, E::Select(proposed)) => classified(current, &proposed),
        (S::Classified { change }, E::Select(proposed)) => classified(&change.current, &proposed),

        (S::Classified { change }, E::Proceed) => {
            if change.is_unchanged() {
                return Err(TransitionError::UnchangedPlan);
            }
            Ok(match change.classification {
                ChangeClassification::Upgrade => S::Upgrading { change: *change },
                ChangeClassification::Downgrade => S::ConfirmingDowngrade { change: *change },
            })
        }

        (S::Upgrading { change }, E::Submit) => Ok(S::Submitting { change: *change }),
        (S::ConfirmingDowngrade { change }, E::ConfirmDowngrade) => {
            Ok(S::Submitting { change: *change })
        }
        (S::ConfirmingDowngrade { change }, E::DeclineDowngrade) => {
            Ok(S::Classified { change: *change })
        }

        (S::Submitting { change }, E::Succeeded(outcome)) => Ok(S::Success {
            change: *change,
            outcome,
        }),
        (S::Submitting { change }, E::Failed(failure)) => Ok(S::Failed {
            change: *change,
            failure,
        }),

        (S::Failed { change, .. }, E::Resubmit) => Ok(S::Classified { change: *change }),

        // A request in flight cannot be abandoned
        (S::Submitting { .. }, E::Close) => Err(TransitionError::NotAllowed {
            state: state.name(),
            event: "close",
        }),
        (_, E::Close) => Ok(S::Idle),

        (state, event) => Err(TransitionError::NotAllowed {
            state: state.name(),
            event: event.name(),
        }),
    }
}

fn classified(
    current: &PlanSelection,
    proposed: &PlanSelection,
) -> Result<PlanChangeState, TransitionError> {
    let change = classifier::evaluate(current, proposed)
        .map_err(|e| TransitionError::InvalidPlan(e.to_string()))?;
    Ok(PlanChangeState::Classified { change })
}
