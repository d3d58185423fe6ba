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

//! Tail Marker: after every output branch has been built, marks each
//! branch's own oldest commit `tail` iff its `parent` crosses into another
//! branch.
//!
//! The Branch Collator already knows this at splice time and sets the flag
//! itself (see `collate::collate_branch`); this pass is the uniform,
//! whole-graph confirmation §4.6 asks for, and it is what actually covers
//! Tag Locator branches, whose single synthetic commit always has a
//! foreign parent but which `tag_locate` does not mark itself. A branch's
//! own chain (oldest first, as returned by collation) is the only
//! unambiguous way to tell "my own oldest commit" from an ancestor that
//! happens to be reachable through a shared parent pointer — walking the
//! live output-branch graph alone cannot distinguish the two, since a
//! child branch's root commit legitimately points at a node owned by its
//! parent branch.

use indexmap::IndexMap;

use crate::atom::Atom;
use crate::changeset::ChangesetArena;
use crate::changeset::ChangesetId;

/// Marks the oldest commit of each branch's own chain `tail` iff it has a
/// parent at all. A branch's own oldest commit has a parent only when that
/// parent belongs to a different branch: a true root's own oldest commit
/// (whether literally parentless or a synthesized root the collator built
/// when no splice point existed) is always chain-first with `parent = None`.
pub fn mark_tails(collations: &IndexMap<Atom, Vec<ChangesetId>>, changesets: &ChangesetArena) {
    for chain in collations.values() {
        let Some(&oldest) = chain.first() else {
            continue;
        };
        if changesets.get(oldest).parent.is_some() {
            changesets.get(oldest).tail.set(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Interner;
    use crate::atom::SimpleInterner;
    use crate::changeset::Changeset;
    use crate::file_revision::Timestamp;
    use std::cell::Cell;

    fn leaf(interner: &mut SimpleInterner, parent: Option<ChangesetId>, date: i64) -> Changeset {
        Changeset {
            parent,
            date: Timestamp(date),
            commit_id: None,
            log: interner.intern("msg"),
            author: interner.intern("alice"),
            revdir: Default::default(),
            serial: Cell::new(0),
            mark: Cell::new(None),
            tail: Cell::new(false),
            dead: false,
            refcount: Cell::new(0),
        }
    }

    #[test]
    fn marks_the_branch_local_root_that_splices_onto_a_foreign_parent() {
        let mut interner = SimpleInterner::default();
        let mut changesets = ChangesetArena::default();

        let trunk_root = changesets.push(leaf(&mut interner, None, 100));
        let trunk_tip = changesets.push(leaf(&mut interner, Some(trunk_root), 150));
        let branch_root = changesets.push(leaf(&mut interner, Some(trunk_root), 120));

        let mut collations: IndexMap<Atom, Vec<ChangesetId>> = IndexMap::new();
        collations.insert(interner.intern("trunk"), vec![trunk_root, trunk_tip]);
        collations.insert(interner.intern("b1"), vec![branch_root]);

        mark_tails(&collations, &changesets);

        assert!(!changesets.get(trunk_root).tail.get());
        assert!(!changesets.get(trunk_tip).tail.get());
        assert!(changesets.get(branch_root).tail.get());
    }

    #[test]
    fn a_synthesized_root_included_in_its_own_chain_is_never_a_tail() {
        let mut interner = SimpleInterner::default();
        let mut changesets = ChangesetArena::default();
        let synth_root = changesets.push(leaf(&mut interner, None, 90));
        let own_commit = changesets.push(leaf(&mut interner, Some(synth_root), 120));

        let mut collations: IndexMap<Atom, Vec<ChangesetId>> = IndexMap::new();
        collations.insert(interner.intern("orphan"), vec![synth_root, own_commit]);

        mark_tails(&collations, &changesets);

        assert!(!changesets.get(synth_root).tail.get());
        assert!(!changesets.get(own_commit).tail.get());
    }

    #[test]
    fn a_tag_locator_synthetic_branch_is_marked_tail() {
        let mut interner = SimpleInterner::default();
        let mut changesets = ChangesetArena::default();
        let base = changesets.push(leaf(&mut interner, None, 100));
        let synthetic_tag_commit = changesets.push(leaf(&mut interner, Some(base), 150));

        let mut collations: IndexMap<Atom, Vec<ChangesetId>> = IndexMap::new();
        collations.insert(interner.intern("trunk"), vec![base]);
        collations.insert(interner.intern("U"), vec![synthetic_tag_commit]);

        mark_tails(&collations, &changesets);

        assert!(changesets.get(synthetic_tag_commit).tail.get());
    }
}
