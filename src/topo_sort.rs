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

//! Branch Topological Sorter: orders output heads so every head appears
//! after all of its parents.

use indexmap::IndexMap;
use indexmap::IndexSet;

use crate::atom::Atom;
use crate::branch_head::BranchHead;
use crate::error::CollateError;
use crate::error::CollateResult;
use crate::unify::MasterBranchHead;
use crate::unify::parent_candidates;

/// Orders `heads` so that every head appears after all heads that are ever
/// observed as its parent in any master. The parent relation is acyclic by
/// construction of the inputs; a cycle means the input set is corrupted.
pub fn topological_sort<'a>(
    heads: &IndexMap<Atom, BranchHead>,
    per_master_heads: impl IntoIterator<Item = &'a [MasterBranchHead]>,
) -> CollateResult<Vec<Atom>> {
    let parents_of = parent_candidates(per_master_heads);

    let mut remaining: IndexSet<Atom> = heads.keys().cloned().collect();
    let mut order = Vec::with_capacity(heads.len());

    while !remaining.is_empty() {
        let next = remaining
            .iter()
            .find(|name| {
                parents_of
                    .get(*name)
                    .is_none_or(|parents| parents.iter().all(|p| !remaining.contains(p)))
            })
            .cloned();

        match next {
            Some(name) => {
                remaining.shift_remove(&name);
                order.push(name);
            }
            None => {
                tracing::error!("branch cycle detected; {} heads unresolved", remaining.len());
                return Err(CollateError::BranchCycle);
            }
        }
    }

    Ok(order)
}
