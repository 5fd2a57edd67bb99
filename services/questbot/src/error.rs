//! Service-specific error types

use thiserror::Error;

/// Errors raised by the questbot binary itself.
///
/// Per-account failures are counted by the orchestrator; these end the
/// command because no account can proceed.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no lootboxes are available")]
    EmptyCatalogue,

    #[error("no lootbox matches '{0}'")]
    UnknownItem(String),

    #[error("no lootbox selected")]
    NoSelection,

    #[error("lootbox catalogue unavailable: all {failed} account(s) failed")]
    CatalogueUnavailable { failed: usize },
}

/// Result alias using service Error
pub type Result<T> = std::result::Result<T, Error>;
