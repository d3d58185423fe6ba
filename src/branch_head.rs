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

//! Output branches and their heads.
//!
//! A branch head's tip walks from a `FileRevisionId` cursor (CVS space, not
//! yet collated) to a `ChangesetId` (git space, collated) over the course of
//! a run, and starts out null (the branch unifier creates heads before any
//! collation has happened). The original tool punned one pointer-sized field
//! between those states; here that's an `Option<Tip>` tagged enum instead.

use std::cell::Cell;

use crate::atom::Atom;
use crate::changeset::ChangesetId;
use crate::file_revision::FileRevisionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tip {
    CvsTip(FileRevisionId),
    GitTip(ChangesetId),
}

impl Tip {
    pub fn as_cvs(&self) -> Option<FileRevisionId> {
        match self {
            Tip::CvsTip(id) => Some(*id),
            Tip::GitTip(_) => None,
        }
    }

    pub fn as_git(&self) -> Option<ChangesetId> {
        match self {
            Tip::GitTip(id) => Some(*id),
            Tip::CvsTip(_) => None,
        }
    }
}

/// One output branch: its name, where its cursor currently sits, and where
/// it joins its parent. Fields beyond `name` are filled in progressively by
/// the unifier, the parent resolver, and the collator, so they live behind
/// `Cell` rather than requiring the whole record to be rebuilt at each stage.
pub struct BranchHead {
    pub name: Atom,
    pub tip: Cell<Option<Tip>>,
    /// Name of the resolved parent output branch, set by the parent
    /// resolver. `None` for trunk (or any head with no parent).
    pub parent: Cell<Option<Atom>>,
    /// Set by the parent resolver; `1` for a head with no parent.
    pub depth: Cell<u32>,
    /// Set once this branch's final commit has been marked (see the Tail
    /// Marker).
    pub tail: Cell<bool>,
    /// Length of the revision number that introduced the branch, maximized
    /// across masters by the unifier; used as a stability tiebreaker.
    pub degree: Cell<u32>,
}

impl BranchHead {
    /// Creates a head with no tip and no resolved parent yet, as produced by
    /// the branch unifier.
    pub fn new_unresolved(name: Atom, degree: u32) -> Self {
        BranchHead {
            name,
            tip: Cell::new(None),
            parent: Cell::new(None),
            depth: Cell::new(0),
            tail: Cell::new(false),
            degree: Cell::new(degree),
        }
    }

    /// Merges in a degree observed on another master's head of the same
    /// name, keeping the maximum (see the branch unifier).
    pub fn absorb_degree(&self, degree: u32) {
        if degree > self.degree.get() {
            self.degree.set(degree);
        }
    }

    pub fn set_parent(&self, parent: Option<Atom>, depth: u32) {
        self.parent.set(parent);
        self.depth.set(depth);
    }

    /// Reads the parent name without disturbing the `Cell` (`Atom` is not
    /// `Copy`, so this is a take-then-restore rather than a plain `get`).
    pub fn parent_name(&self) -> Option<Atom> {
        let parent = self.parent.take();
        self.parent.set(parent.clone());
        parent
    }

    pub fn set_cvs_tip(&self, tip: FileRevisionId) {
        self.tip.set(Some(Tip::CvsTip(tip)));
    }

    pub fn advance_to_git(&self, changeset: ChangesetId) {
        self.tip.set(Some(Tip::GitTip(changeset)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Interner;
    use crate::atom::SimpleInterner;

    #[test]
    fn tip_starts_null_and_can_move_through_cvs_then_git_space() {
        let mut interner = SimpleInterner::default();
        let head = BranchHead::new_unresolved(interner.intern("trunk"), 2);
        assert_eq!(head.tip.get(), None);

        head.set_cvs_tip(FileRevisionId::new_for_test(3));
        assert_eq!(
            head.tip.get().and_then(|t| t.as_cvs()),
            Some(FileRevisionId::new_for_test(3))
        );

        head.advance_to_git(ChangesetId::new_for_test(7));
        assert_eq!(
            head.tip.get().and_then(|t| t.as_git()),
            Some(ChangesetId::new_for_test(7))
        );
        assert_eq!(head.tip.get().and_then(|t| t.as_cvs()), None);
    }

    #[test]
    fn absorb_degree_keeps_the_maximum() {
        let mut interner = SimpleInterner::default();
        let head = BranchHead::new_unresolved(interner.intern("b1"), 4);
        head.absorb_degree(2);
        assert_eq!(head.degree.get(), 4);
        head.absorb_degree(6);
        assert_eq!(head.degree.get(), 6);
    }
}
