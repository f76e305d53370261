//! The repository-synchronizer seam.

use forge_types::push::PushNote;

/// Applies pushed git objects to the physical repository store.
///
/// Implementations signal a not-yet-replicated object by returning an error
/// whose root cause is `forge_types::error::ErrObjectNotFound`; the executor
/// remaps that to the consensus driver's re-execute-block code. The sentinel
/// must stay downcastable through any `context()` wrapping.
pub trait RepoSyncer {
    /// Merges the note's objects into the local repository.
    fn exec_tx_push(&self, note: &PushNote) -> anyhow::Result<()>;
}
