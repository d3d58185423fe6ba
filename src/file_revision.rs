// Copyright 2026 The cvs-collate Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! File revisions ("cvs-commits"): one revision of one file, as produced by
//! the (external) master parser and consumed read-only by the collator.

use std::cell::Cell;
use std::fmt;

use once_cell::unsync::OnceCell;

use crate::atom::Atom;
use crate::changeset::ChangesetId;
use crate::master::MasterIndex;
use crate::master::RevisionNumber;

/// Seconds since a fixed epoch. A thin newtype rather than a real calendar
/// type, since the collator only ever compares and subtracts timestamps.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn abs_diff(self, other: Timestamp) -> u64 {
        self.0.abs_diff(other.0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Handle into a [`FileRevisionArena`]. Stable, `Copy`, cheap to compare —
/// the arena-index replacement for the source's `cvs_commit *`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct FileRevisionId(u32);

impl FileRevisionId {
    #[cfg(test)]
    pub(crate) fn new_for_test(n: u32) -> Self {
        FileRevisionId(n)
    }
}

/// An immutable (apart from the documented scratch fields) revision of one
/// file, linked to its branch-local predecessor.
pub struct FileRevision {
    pub master: MasterIndex,
    pub revision: RevisionNumber,
    pub timestamp: Timestamp,
    pub author: Atom,
    pub log: Atom,
    pub commit_id: Option<Atom>,
    pub parent: Option<FileRevisionId>,
    pub dead: bool,

    /// True when the master parser already knows this revision is a branch
    /// fork point (derived from RCS branch-symbol metadata, not set by
    /// anything in this crate). The Branch Collator's main walk treats this
    /// as the signal to stop walking a cursor backward past its own birth.
    pub tail: Cell<bool>,
    /// Scratch flag used only during collation (see the Branch Collator).
    pub tailed: Cell<bool>,
    /// First synthesized Changeset that contains this revision. Write-once:
    /// attempts to set it a second time are no-ops (first writer wins, as
    /// specified), logged at debug level by the caller.
    pub gitspace: OnceCell<ChangesetId>,
    /// Scratch flag used only during emission.
    pub emitted: Cell<bool>,
}

impl FileRevision {
    /// Attempts to set the `gitspace` link. Returns `true` if this call
    /// performed the write (first writer wins); `false` if a link was
    /// already present, in which case the caller should log
    /// `Anomaly::DuplicateGitspaceAssignment` in debug builds.
    pub fn set_gitspace(&self, changeset: ChangesetId) -> bool {
        self.gitspace.set(changeset).is_ok()
    }

    pub fn gitspace(&self) -> Option<ChangesetId> {
        self.gitspace.get().copied()
    }
}

impl fmt::Debug for FileRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileRevision")
            .field("master", &self.master)
            .field("revision", &self.revision)
            .field("timestamp", &self.timestamp)
            .field("dead", &self.dead)
            .finish()
    }
}

/// Owns every [`FileRevision`] produced by the (external) master parser for
/// the whole run. FileRevisions never move once pushed, so [`FileRevisionId`]
/// handles stay valid for the arena's lifetime.
#[derive(Default)]
pub struct FileRevisionArena {
    revisions: Vec<FileRevision>,
}

impl FileRevisionArena {
    pub fn push(&mut self, revision: FileRevision) -> FileRevisionId {
        let id = FileRevisionId(self.revisions.len() as u32);
        self.revisions.push(revision);
        id
    }

    pub fn get(&self, id: FileRevisionId) -> &FileRevision {
        &self.revisions[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }
}
