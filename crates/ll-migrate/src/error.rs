//! Error types for the migration engine.

use ll_core::MigrationId;
use ll_db::DbError;
use thiserror::Error;

/// Migration engine errors.
///
/// Every variant aborts the run. Use [`MigrateError::kind`] to tell load,
/// apply, and integrity failures apart.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// A migration file could not be parsed (MG001).
    #[error("[MG001] Invalid migration file {path}: {reason}")]
    Load { path: String, reason: String },

    /// The migrations directory or one of its files could not be read (MG002).
    #[error("[MG002] Failed to read migrations from {path}: {source}")]
    ReadDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A forward script failed; its transaction was rolled back (MG003).
    #[error("[MG003] Migration {id} failed to apply: {source}")]
    Apply {
        id: MigrationId,
        #[source]
        source: DbError,
    },

    /// A legacy repair delta failed; the ledger row keeps its legacy
    /// checksum (MG004).
    #[error("[MG004] Repair of migration {id} failed: {source}")]
    Repair {
        id: MigrationId,
        #[source]
        source: DbError,
    },

    /// An applied migration no longer matches its definition and the
    /// recorded checksum is not a recognised legacy value (MG005).
    #[error("[MG005] Migration {id} was applied with checksum {recorded} but its definition now hashes to {current}, and no repair is registered for that checksum")]
    ChecksumMismatch {
        id: MigrationId,
        recorded: String,
        current: String,
    },

    /// The ledger records a migration that has no definition (MG006).
    #[error("[MG006] Ledger records migration {id}, which has no migration definition")]
    OrphanedEntry { id: MigrationId },

    /// Reading the ledger failed (MG007).
    #[error("[MG007] Ledger access failed: {0}")]
    Ledger(#[from] DbError),
}

/// Coarse classification of [`MigrateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Definitions could not be loaded; the store was not touched.
    Load,
    /// A forward script or repair delta failed and was rolled back.
    Apply,
    /// The ledger disagrees with the definitions in an unrecognised way.
    Integrity,
    /// The store itself could not be read.
    Store,
}

impl MigrateError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MigrateError::Load { .. } | MigrateError::ReadDir { .. } => ErrorKind::Load,
            MigrateError::Apply { .. } | MigrateError::Repair { .. } => ErrorKind::Apply,
            MigrateError::ChecksumMismatch { .. } | MigrateError::OrphanedEntry { .. } => {
                ErrorKind::Integrity
            }
            MigrateError::Ledger(_) => ErrorKind::Store,
        }
    }
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;
