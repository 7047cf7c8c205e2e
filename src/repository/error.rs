use closet_core::Error;

/// Outcome-specific failures surfaced by the repositories.
///
/// `kind` is the entity kind (`"clothing"` or `"style"`).
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The record or its image could not be written.
    #[error("failed to save {kind}: {source}")]
    FailToSave { kind: &'static str, source: Error },

    /// The item carries no usable image and was not written.
    #[error("{kind} {id} has no valid image")]
    InvalidImage { kind: &'static str, id: String },

    /// Records could not be loaded or hydrated.
    #[error("failed to load {kind}: {source}")]
    InvalidData { kind: &'static str, source: Error },

    /// The database refused to delete the record.
    #[error("failed to remove {kind}: {source}")]
    FailToRemove { kind: &'static str, source: Error },
}

impl RepositoryError {
    pub(crate) fn fail_to_save(kind: &'static str) -> impl FnOnce(Error) -> Self {
        move |source| Self::FailToSave { kind, source }
    }

    pub(crate) fn invalid_data(kind: &'static str) -> impl FnOnce(Error) -> Self {
        move |source| Self::InvalidData { kind, source }
    }

    pub(crate) fn fail_to_remove(kind: &'static str) -> impl FnOnce(Error) -> Self {
        move |source| Self::FailToRemove { kind, source }
    }

    /// The underlying core error, if any.
    pub fn core_error(&self) -> Option<&Error> {
        match self {
            Self::FailToSave { source, .. }
            | Self::InvalidData { source, .. }
            | Self::FailToRemove { source, .. } => Some(source),
            Self::InvalidImage { .. } => None,
        }
    }
}
