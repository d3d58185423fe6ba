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

//! Parent Resolver: assigns each output head its parent head and a depth.

use std::collections::HashMap;
use std::collections::HashSet;

use indexmap::IndexMap;

use crate::atom::Atom;
use crate::branch_head::BranchHead;
use crate::error::CollateError;
use crate::error::CollateResult;
use crate::unify::MasterBranchHead;
use crate::unify::parent_candidates;

/// Resolves every head's parent and depth in place. For head `H`, the parent
/// is the candidate (among all parent names observed for `H` across masters)
/// with the greatest depth; `H.depth` is that parent's depth plus one, or
/// `1` if `H` has no candidates. A memoized recursive descent, so calling it
/// twice over the same heads is a no-op the second time.
pub fn resolve_parents<'a>(
    heads: &IndexMap<Atom, BranchHead>,
    per_master_heads: impl IntoIterator<Item = &'a [MasterBranchHead]>,
) -> CollateResult<()> {
    let parents_of = parent_candidates(per_master_heads);
    let mut depth_cache: HashMap<Atom, u32> = HashMap::new();
    let mut visiting: HashSet<Atom> = HashSet::new();

    for name in heads.keys() {
        resolve_depth(name, heads, &parents_of, &mut depth_cache, &mut visiting)?;
    }
    Ok(())
}

fn resolve_depth(
    name: &Atom,
    heads: &IndexMap<Atom, BranchHead>,
    parents_of: &HashMap<Atom, HashSet<Atom>>,
    depth_cache: &mut HashMap<Atom, u32>,
    visiting: &mut HashSet<Atom>,
) -> CollateResult<u32> {
    if let Some(depth) = depth_cache.get(name) {
        return Ok(*depth);
    }
    if !visiting.insert(name.clone()) {
        tracing::error!(branch = %name, "branch cycle detected while resolving parents");
        return Err(CollateError::BranchCycle);
    }

    let candidates = parents_of.get(name);
    let best = match candidates {
        None => None,
        Some(names) if names.is_empty() => None,
        Some(names) => {
            let mut best: Option<(Atom, u32)> = None;
            for candidate in names {
                let candidate_depth =
                    resolve_depth(candidate, heads, parents_of, depth_cache, visiting)?;
                if best.as_ref().is_none_or(|(_, d)| candidate_depth > *d) {
                    best = Some((candidate.clone(), candidate_depth));
                }
            }
            best
        }
    };

    visiting.remove(name);

    let depth = match &best {
        Some((_, parent_depth)) => parent_depth + 1,
        None => 1,
    };
    depth_cache.insert(name.clone(), depth);

    if let Some(head) = heads.get(name) {
        head.set_parent(best.map(|(parent, _)| parent), depth);
    }

    Ok(depth)
}
