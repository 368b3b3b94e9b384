//! Preference use-case service.
//!
//! # Responsibility
//! - Expose the "has seen data-loss warning" flag to the editor flow.
//!
//! # Invariants
//! - A flag that was never written reads as `false`.

use crate::repo::entry_repo::RepoResult;
use crate::repo::preference_repo::PreferenceRepository;
use log::info;

/// Preference key for the data-loss warning acknowledgement.
pub const DATA_LOSS_WARNING_SEEN_KEY: &str = "seen_data_loss_warning";

/// Preference facade over repository implementations.
pub struct PreferenceService<R: PreferenceRepository> {
    repo: R,
}

impl<R: PreferenceRepository> PreferenceService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Read once when the editor opens.
    pub fn has_seen_data_loss_warning(&self) -> RepoResult<bool> {
        Ok(self
            .repo
            .get_flag(DATA_LOSS_WARNING_SEEN_KEY)?
            .unwrap_or(false))
    }

    /// Written once after the warning is dismissed.
    pub fn mark_data_loss_warning_seen(&self) -> RepoResult<()> {
        self.repo.set_flag(DATA_LOSS_WARNING_SEEN_KEY, true)?;
        info!("event=preference_set module=service status=ok key={DATA_LOSS_WARNING_SEEN_KEY}");
        Ok(())
    }
}
