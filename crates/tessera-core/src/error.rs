// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types surfaced by project operations.

use thiserror::Error;

use crate::id::LibraryKind;

/// An error reported by a project operation.
///
/// Errors are `Clone` so the same value can be returned to the caller and
/// broadcast on the project event bus.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectError {
    /// Another entry point is still running on the same session.
    #[error("another project operation is already in progress")]
    OperationInProgress,
    /// A library kind ran out of ordinals or local ids.
    #[error("identifier space exhausted for {kind} libraries")]
    IdentifierSpaceExhausted {
        /// The kind whose range is exhausted.
        kind: LibraryKind,
    },
    /// A project, library, bundle or item does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// A precondition of the operation is not met.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// A type guid could not be mapped to a known type.
    #[error("type resolution failed: {0}")]
    TypeResolution(String),
    /// The storage collaborator failed.
    #[error("storage failure: {0}")]
    Storage(String),
}

/// A shorthand for results of project operations.
pub type ProjectResult<T> = Result<T, ProjectError>;

/// An error reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The requested project, path or record does not exist.
    #[error("'{0}' does not exist")]
    NotFound(String),
    /// Any other backend failure.
    #[error("{0}")]
    Failed(String),
}

impl From<StorageError> for ProjectError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => ProjectError::NotFound(what),
            StorageError::Failed(reason) => ProjectError::Storage(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_conversion() {
        let missing: ProjectError = StorageError::NotFound("Assets/a.rtprefab".into()).into();
        assert_eq!(missing, ProjectError::NotFound("Assets/a.rtprefab".into()));

        let failed: ProjectError = StorageError::Failed("disk full".into()).into();
        assert_eq!(failed.to_string(), "storage failure: disk full");
    }

    #[test]
    fn test_exhaustion_message_names_kind() {
        let err = ProjectError::IdentifierSpaceExhausted {
            kind: LibraryKind::Dynamic,
        };
        assert_eq!(err.to_string(), "identifier space exhausted for dynamic libraries");
    }
}
