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

//! The identifier space shared by every library kind.
//!
//! An [`AssetId`] is a 64-bit value split into an *ordinal* (which library)
//! and a *local id* (which object inside that library). Ordinals are global:
//! each [`LibraryKind`] owns a contiguous ordinal range listed in
//! [`LIBRARY_BOUNDS`], so the kind of an id is a pure function of its value.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ProjectError, ProjectResult};

/// Number of low bits holding the local id.
pub const LOCAL_ID_BITS: u32 = 22;

/// Mask extracting the local id from a raw identifier.
pub const LOCAL_ID_MASK: u64 = (1 << LOCAL_ID_BITS) - 1;

/// Largest local id a single library can hand out.
pub const MAX_LOCAL_ID: u32 = LOCAL_ID_MASK as u32;

/// The four disjoint families of libraries an identifier can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LibraryKind {
    /// Precompiled, read-only libraries shipped with the application.
    Static,
    /// Libraries created by scanning and importing an external bundle.
    Bundled,
    /// Libraries holding the built-in dependencies of scenes.
    Scene,
    /// Objects created at runtime and owned by the project itself.
    Dynamic,
}

impl fmt::Display for LibraryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LibraryKind::Static => "static",
            LibraryKind::Bundled => "bundled",
            LibraryKind::Scene => "scene",
            LibraryKind::Dynamic => "dynamic",
        };
        f.write_str(name)
    }
}

/// The ordinal range owned by one library kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryBounds {
    /// The kind this range belongs to.
    pub kind: LibraryKind,
    /// First ordinal of the range.
    pub first_ordinal: u32,
    /// Number of ordinals in the range.
    pub ordinal_count: u32,
}

impl LibraryBounds {
    /// Last ordinal of the range (inclusive).
    pub const fn last_ordinal(&self) -> u32 {
        self.first_ordinal + self.ordinal_count - 1
    }

    /// Returns `true` if `ordinal` falls inside this range.
    pub const fn contains(&self, ordinal: u32) -> bool {
        ordinal >= self.first_ordinal && ordinal <= self.last_ordinal()
    }
}

/// Ordinal ranges for every library kind, in ascending order.
pub const LIBRARY_BOUNDS: [LibraryBounds; 4] = [
    LibraryBounds {
        kind: LibraryKind::Static,
        first_ordinal: 0,
        ordinal_count: 128,
    },
    LibraryBounds {
        kind: LibraryKind::Bundled,
        first_ordinal: 128,
        ordinal_count: 128,
    },
    LibraryBounds {
        kind: LibraryKind::Scene,
        first_ordinal: 256,
        ordinal_count: 128,
    },
    LibraryBounds {
        kind: LibraryKind::Dynamic,
        first_ordinal: 384,
        ordinal_count: 640,
    },
];

impl LibraryKind {
    /// Returns the ordinal range of this kind.
    pub const fn bounds(self) -> LibraryBounds {
        match self {
            LibraryKind::Static => LIBRARY_BOUNDS[0],
            LibraryKind::Bundled => LIBRARY_BOUNDS[1],
            LibraryKind::Scene => LIBRARY_BOUNDS[2],
            LibraryKind::Dynamic => LIBRARY_BOUNDS[3],
        }
    }

    /// Finds the kind owning `ordinal`, if any.
    pub fn of_ordinal(ordinal: u32) -> Option<LibraryKind> {
        LIBRARY_BOUNDS
            .iter()
            .find(|bounds| bounds.contains(ordinal))
            .map(|bounds| bounds.kind)
    }
}

/// A stable identifier of an asset, prefab part or runtime object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(u64);

impl AssetId {
    /// Wraps a raw identifier value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier value.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// The library kind this identifier belongs to, or `None` if it is
    /// outside every range.
    pub fn kind(self) -> Option<LibraryKind> {
        classify(self)
    }

    /// The global ordinal of the owning library.
    pub fn ordinal(self) -> u32 {
        ordinal_of(self)
    }

    /// The position of the object inside its library.
    pub fn local_id(self) -> u32 {
        local_id_of(self)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ordinal(), self.local_id())
    }
}

/// Returns the library kind of `id`, or `None` when the ordinal lies past
/// the last range.
pub fn classify(id: AssetId) -> Option<LibraryKind> {
    LibraryKind::of_ordinal(ordinal_of(id))
}

/// Extracts the ordinal of `id`. Values too large for an ordinal saturate.
pub fn ordinal_of(id: AssetId) -> u32 {
    u32::try_from(id.0 >> LOCAL_ID_BITS).unwrap_or(u32::MAX)
}

/// Extracts the local id of `id`.
pub fn local_id_of(id: AssetId) -> u32 {
    (id.0 & LOCAL_ID_MASK) as u32
}

/// Builds an identifier from its parts.
///
/// ## Errors
/// `InvalidOperation` if `ordinal` does not belong to `kind` or `local_id`
/// exceeds [`MAX_LOCAL_ID`].
pub fn compose(kind: LibraryKind, ordinal: u32, local_id: u32) -> ProjectResult<AssetId> {
    if !kind.bounds().contains(ordinal) {
        return Err(ProjectError::InvalidOperation(format!(
            "ordinal {ordinal} is outside the {kind} library range"
        )));
    }
    if local_id > MAX_LOCAL_ID {
        return Err(ProjectError::InvalidOperation(format!(
            "local id {local_id} exceeds the per-library maximum"
        )));
    }
    Ok(AssetId((u64::from(ordinal) << LOCAL_ID_BITS) | u64::from(local_id)))
}

/// Hands out dynamic identifiers from a copy of the project's running
/// counter.
///
/// Nothing is written back until [`DynamicIdAllocator::commit`] is called,
/// so a batch that fails halfway (or is simply dropped) leaves the
/// project's counter where it was.
#[derive(Debug)]
pub struct DynamicIdAllocator {
    start: u64,
    next: u64,
}

impl DynamicIdAllocator {
    /// Starts a batch at the given counter value.
    pub fn begin(counter: u64) -> Self {
        Self {
            start: counter,
            next: counter,
        }
    }

    /// Allocates the next dynamic identifier.
    ///
    /// ## Errors
    /// `IdentifierSpaceExhausted` once the counter walks past the last
    /// dynamic ordinal. The allocator stays exhausted afterwards.
    pub fn allocate(&mut self) -> ProjectResult<AssetId> {
        let bounds = LibraryKind::Dynamic.bounds();
        let page = self.next >> LOCAL_ID_BITS;
        let ordinal = u64::from(bounds.first_ordinal) + page;
        if ordinal > u64::from(bounds.last_ordinal()) {
            return Err(ProjectError::IdentifierSpaceExhausted {
                kind: LibraryKind::Dynamic,
            });
        }
        let id = AssetId((ordinal << LOCAL_ID_BITS) | (self.next & LOCAL_ID_MASK));
        self.next += 1;
        Ok(id)
    }

    /// Number of identifiers handed out so far in this batch.
    pub fn allocated(&self) -> u64 {
        self.next - self.start
    }

    /// Finishes the batch and returns the counter value to persist.
    pub fn commit(self) -> u64 {
        log::trace!(
            "Committed {} dynamic identifiers (counter {} -> {}).",
            self.allocated(),
            self.start,
            self.next
        );
        self.next
    }
}

/// Hands out the next local id of a per-library counter.
///
/// ## Errors
/// `IdentifierSpaceExhausted` with `kind` when the counter already reached
/// [`MAX_LOCAL_ID`]. The counter is left untouched in that case.
pub fn next_local_id(counter: &mut u32, kind: LibraryKind) -> ProjectResult<u32> {
    if *counter > MAX_LOCAL_ID {
        return Err(ProjectError::IdentifierSpaceExhausted { kind });
    }
    let id = *counter;
    *counter += 1;
    Ok(id)
}

/// Returns the ordinal for the `bundle_identifier`-th bundle of a project.
///
/// The last bundled ordinal is kept free, so at most `ordinal_count - 1`
/// bundles can be imported.
pub fn bundle_ordinal(bundle_identifier: u32) -> ProjectResult<u32> {
    let bounds = LibraryKind::Bundled.bounds();
    if bundle_identifier >= bounds.ordinal_count - 1 {
        return Err(ProjectError::IdentifierSpaceExhausted {
            kind: LibraryKind::Bundled,
        });
    }
    Ok(bounds.first_ordinal + bundle_identifier)
}
