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

//! Changesets ("git-commits"): synthesized whole-tree commits.

use std::cell::Cell;
use std::fmt;

use crate::atom::Atom;
use crate::file_revision::Timestamp;
use crate::revdir::Revdir;

/// Arena index identifying a [`Changeset`]. Replaces the source's
/// `cvs_commit *` / `git_commit *` pointer identity (see the design note on
/// pointer identity as an ordering key).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangesetId(u32);

impl ChangesetId {
    #[cfg(test)]
    pub(crate) fn new_for_test(n: u32) -> Self {
        ChangesetId(n)
    }
}

impl fmt::Debug for ChangesetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChangesetId({})", self.0)
    }
}

/// A synthesized commit: a coherent snapshot of file contents across all
/// masters, plus the metadata chosen from its "leader" FileRevision.
pub struct Changeset {
    pub parent: Option<ChangesetId>,
    pub date: Timestamp,
    pub commit_id: Option<Atom>,
    pub log: Atom,
    pub author: Atom,
    pub revdir: Revdir,
    /// Position within its branch's commit chain, assigned as the branch is
    /// built (newest first) and later reversed for emission.
    pub serial: Cell<u32>,
    /// Monotonic fast-import mark, assigned by the canonicalizer.
    pub mark: Cell<Option<u32>>,
    /// Set when this Changeset's `parent` pointer crosses into a different
    /// output branch (see the Tail Marker).
    pub tail: Cell<bool>,
    pub dead: bool,
    /// Reference count toward how many FileRevisions point here via
    /// `gitspace` — diagnostic only, not load-bearing for correctness.
    pub refcount: Cell<u32>,
}

impl fmt::Debug for Changeset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Changeset")
            .field("date", &self.date)
            .field("author", &self.author)
            .field("parent", &self.parent)
            .field("tail", &self.tail.get())
            .finish()
    }
}

/// Owns every [`Changeset`] allocated by the collator (or the tag locator,
/// for synthetic tag commits). Changesets never move once pushed, so
/// [`ChangesetId`] handles stay valid for the arena's lifetime; they are
/// never mutated after their `tail`/`parent` are finalized, apart from the
/// documented scratch cells.
#[derive(Default)]
pub struct ChangesetArena {
    changesets: Vec<Changeset>,
}

impl ChangesetArena {
    pub fn push(&mut self, changeset: Changeset) -> ChangesetId {
        let id = ChangesetId(self.changesets.len() as u32);
        self.changesets.push(changeset);
        id
    }

    pub fn get(&self, id: ChangesetId) -> &Changeset {
        &self.changesets[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.changesets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changesets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChangesetId, &Changeset)> {
        self.changesets
            .iter()
            .enumerate()
            .map(|(i, c)| (ChangesetId(i as u32), c))
    }
}
