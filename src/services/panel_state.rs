//! Panel state persistence across process teardown
//!
//! The blob is a small versioned JSON document. It keeps the state tag,
//! router, last build progress, the failure reason and which endpoints were
//! selected. Point geometry is never saved: the engine owns it. Restoring a
//! blob of another version fails closed; the caller falls back to Idle.

use crate::domain::session::{
    BuildFailure, EndpointSelection, PlanningSession, PlanningState, StateTag,
};
use crate::domain::types::RouterType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current blob schema version
pub const PANEL_STATE_VERSION: u32 = 1;

/// Why a saved panel state could not be restored
#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("unsupported panel state version {0}")]
    UnsupportedVersion(u32),
    #[error("malformed panel state: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("inconsistent panel state: {0}")]
    Inconsistent(&'static str),
}

#[derive(Debug, Deserialize)]
struct VersionProbe {
    v: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct PanelStateV1 {
    v: u32,
    state: StateTag,
    router: RouterType,
    #[serde(default)]
    progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    failure: Option<BuildFailure>,
    #[serde(default)]
    has_start: bool,
    #[serde(default)]
    has_finish: bool,
}

/// Serialize the restorable subset of a session
pub fn save(session: &PlanningSession) -> Vec<u8> {
    let (progress, router) = match session.state {
        PlanningState::Building { progress, router } => (progress, router),
        _ => (0, session.router),
    };
    let failure = match session.state {
        PlanningState::Failed(failure) => Some(failure),
        _ => None,
    };

    let blob = PanelStateV1 {
        v: PANEL_STATE_VERSION,
        state: session.state.tag(),
        router,
        progress,
        failure,
        has_start: session.has_start(),
        has_finish: session.has_finish(),
    };

    // Plain struct of enums, integers and bools: serialization cannot fail
    serde_json::to_vec(&blob).unwrap_or_default()
}

/// Rebuild a session from a saved blob
pub fn restore(blob: &[u8]) -> Result<PlanningSession, RestoreError> {
    let probe: VersionProbe = serde_json::from_slice(blob)?;
    if probe.v != PANEL_STATE_VERSION {
        return Err(RestoreError::UnsupportedVersion(probe.v));
    }

    let saved: PanelStateV1 = serde_json::from_slice(blob)?;
    if saved.progress > 100 {
        return Err(RestoreError::Inconsistent("progress above 100"));
    }

    let state = match saved.state {
        StateTag::Idle => PlanningState::Idle,
        StateTag::AwaitingStart => PlanningState::AwaitingStart,
        StateTag::AwaitingFinish => PlanningState::AwaitingFinish,
        StateTag::Building => {
            PlanningState::Building { progress: saved.progress, router: saved.router }
        }
        StateTag::Ready => PlanningState::Ready,
        StateTag::Failed => match saved.failure {
            Some(failure) => PlanningState::Failed(failure),
            None => return Err(RestoreError::Inconsistent("failed state without a reason")),
        },
        StateTag::Cancelled => PlanningState::Cancelled,
    };

    if matches!(state, PlanningState::Building { .. } | PlanningState::Ready) && !saved.has_finish {
        return Err(RestoreError::Inconsistent("route state without a finish point"));
    }

    let mut session = PlanningSession::new(saved.router);
    session.state = state;
    session.start = restored_selection(saved.has_start);
    session.finish = restored_selection(saved.has_finish);
    Ok(session)
}

fn restored_selection(selected: bool) -> EndpointSelection {
    if selected {
        EndpointSelection::Restored
    } else {
        EndpointSelection::Unselected
    }
}
