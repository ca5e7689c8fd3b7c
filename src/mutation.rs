//! Two-phase lifecycle for optimistic category-change mutations.
//!
//! A user action removes rows locally before the remote confirms anything.
//! That removal is a UI convenience, not a source of truth: every entry
//! opened here is resolved by the next full refetch at the latest, so
//! nothing stays Tentative indefinitely.

use crate::client::CategoryChangeRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
    /// Applied locally, remote outcome unknown.
    Tentative,
    /// Remote accepted the mutation.
    Confirmed,
    /// Superseded by an authoritative refetch without remote confirmation.
    Reverted,
}

#[derive(Debug, Clone)]
pub struct PendingMutation {
    pub row_ids: Vec<String>,
    pub target_category: String,
    pub note: String,
    pub phase: MutationPhase,
}

/// Handle identifying one ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationKey(usize);

#[derive(Debug, Default)]
pub struct MutationLedger {
    entries: Vec<PendingMutation>,
}

impl MutationLedger {
    pub fn open(&mut self, request: &CategoryChangeRequest) -> MutationKey {
        self.entries.push(PendingMutation {
            row_ids: request.order_ids.clone(),
            target_category: request.manual_override_status.clone(),
            note: request.note.clone(),
            phase: MutationPhase::Tentative,
        });
        MutationKey(self.entries.len() - 1)
    }

    pub fn confirm(&mut self, key: MutationKey) {
        if let Some(entry) = self.entries.get_mut(key.0) {
            entry.phase = MutationPhase::Confirmed;
        }
    }

    /// Resolve every still-Tentative entry as Reverted. Called when a full
    /// refetch has replaced collection contents with server truth.
    pub fn revert_open(&mut self) -> usize {
        let mut reverted = 0;
        for entry in &mut self.entries {
            if entry.phase == MutationPhase::Tentative {
                entry.phase = MutationPhase::Reverted;
                reverted += 1;
            }
        }
        reverted
    }

    pub fn entries(&self) -> &[PendingMutation] {
        &self.entries
    }

    pub fn has_tentative(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.phase == MutationPhase::Tentative)
    }
}
