//! Per-row lifecycle inside the repair batch
//!
//! `Unchecked → {Valid, NeedsRepair} → {Repaired, RepairFailed}`.
//! Transitions consume the previous state; a call that does not apply to the
//! current state returns it unchanged, so a row never moves backwards.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RepairState {
    Unchecked,
    Valid,
    NeedsRepair,
    Repaired { url: String },
    RepairFailed,
}

impl RepairState {
    /// Record the probe verdict for an unchecked row.
    #[must_use]
    pub fn checked(self, reachable: bool) -> Self {
        match self {
            Self::Unchecked if reachable => Self::Valid,
            Self::Unchecked => Self::NeedsRepair,
            other => other,
        }
    }

    /// Record what discovery returned for a row that needs repair.
    #[must_use]
    pub fn resolved(self, candidate: Option<String>) -> Self {
        match (self, candidate) {
            (Self::NeedsRepair, Some(url)) => Self::Repaired { url },
            (Self::NeedsRepair, None) => Self::RepairFailed,
            (other, _) => other,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Valid | Self::Repaired { .. } | Self::RepairFailed)
    }

    /// True when a repair was attempted, whatever its result.
    pub fn was_attempted(&self) -> bool {
        matches!(self, Self::Repaired { .. } | Self::RepairFailed)
    }
}

/// Final state of one selected row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowOutcome {
    #[serde(rename = "rowIndex")]
    pub row_index: usize,
    #[serde(rename = "idSku")]
    pub id_sku: String,
    /// Search query sent to discovery, if a repair was attempted
    pub query: Option<String>,
    pub state: RepairState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reachable_row_is_valid() {
        let state = RepairState::Unchecked.checked(true);
        assert_eq!(state, RepairState::Valid);
        assert!(state.is_terminal());
        assert!(!state.was_attempted());
    }

    #[test]
    fn test_broken_row_resolves() {
        let needs = RepairState::Unchecked.checked(false);
        assert_eq!(needs, RepairState::NeedsRepair);
        assert!(!needs.is_terminal());

        let repaired = needs.clone().resolved(Some("http://example.com/img.png".into()));
        assert_eq!(
            repaired,
            RepairState::Repaired { url: "http://example.com/img.png".into() }
        );
        assert!(repaired.was_attempted());

        assert_eq!(needs.resolved(None), RepairState::RepairFailed);
    }

    #[test]
    fn test_terminal_states_do_not_move() {
        assert_eq!(RepairState::Valid.checked(false), RepairState::Valid);
        assert_eq!(RepairState::Valid.resolved(Some("http://x".into())), RepairState::Valid);
        assert_eq!(RepairState::RepairFailed.resolved(Some("http://x".into())), RepairState::RepairFailed);
        assert_eq!(RepairState::Unchecked.resolved(Some("http://x".into())), RepairState::Unchecked);
    }
}
