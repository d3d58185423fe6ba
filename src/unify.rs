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

//! Branch Unifier: scans all masters and creates a single named output head
//! per distinct branch name.

use std::collections::HashMap;
use std::collections::HashSet;

use indexmap::IndexMap;

use crate::atom::Atom;
use crate::branch_head::BranchHead;
use crate::file_revision::FileRevisionId;

/// One master's view of a branch head, as handed in by the (external) master
/// parser: `{ name, degree, tip, parent-name }` per §6's input contract.
#[derive(Clone, Debug)]
pub struct MasterBranchHead {
    pub name: Atom,
    pub degree: u32,
    pub tip: Option<FileRevisionId>,
    pub parent_name: Option<Atom>,
}

/// Scans every master's branch heads and returns one output [`BranchHead`]
/// per distinct name, keyed by name and in first-seen order. Each output
/// head starts with a null tip (the unifier only merges names and degrees;
/// tips are assigned during collation) and carries the maximum degree seen
/// across all masters that have a branch of that name.
pub fn unify_branches<'a>(
    per_master_heads: impl IntoIterator<Item = &'a [MasterBranchHead]>,
) -> IndexMap<Atom, BranchHead> {
    let mut heads: IndexMap<Atom, BranchHead> = IndexMap::new();
    for master_heads in per_master_heads {
        for head in master_heads {
            match heads.get(&head.name) {
                Some(existing) => existing.absorb_degree(head.degree),
                None => {
                    heads.insert(
                        head.name.clone(),
                        BranchHead::new_unresolved(head.name.clone(), head.degree),
                    );
                }
            }
        }
    }
    heads
}

/// The parent-of relation used by the topological sorter and the parent
/// resolver: for each branch name, the union across all masters of that
/// master head's parent-head-name.
pub(crate) fn parent_candidates<'a>(
    per_master_heads: impl IntoIterator<Item = &'a [MasterBranchHead]>,
) -> HashMap<Atom, HashSet<Atom>> {
    let mut parents_of: HashMap<Atom, HashSet<Atom>> = HashMap::new();
    for master_heads in per_master_heads {
        for head in master_heads {
            if let Some(parent) = &head.parent_name {
                parents_of
                    .entry(head.name.clone())
                    .or_default()
                    .insert(parent.clone());
            }
        }
    }
    parents_of
}
