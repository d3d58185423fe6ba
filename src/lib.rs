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

//! Collates per-file CVS master revision histories into a changeset-oriented
//! commit DAG for a fast-import stream.
//!
//! This crate is a library with no process boundary of its own: a CVS
//! master parser, a revdir backend, an author-map loader and a fast-import
//! emitter are all external collaborators (see `config`, `revdir`,
//! `author_map`, and `canonicalize::Emitter`). [`collate_all`] is the
//! top-level driver that runs the pipeline the other modules implement in
//! isolation: branch unification, topological sort, parent resolution,
//! per-branch collation, tag location, tail marking, and canonicalization.

pub mod atom;
pub mod author_map;
pub mod branch_head;
pub mod canonicalize;
pub mod changeset;
pub mod collate;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod file_revision;
pub mod master;
pub mod parent_resolve;
pub mod revdir;
pub mod tag;
pub mod tag_locate;
pub mod tail_mark;
pub mod topo_sort;
pub mod unify;

use indexmap::IndexMap;
use std::collections::HashMap;

pub use atom::Atom;
pub use atom::Interner;
pub use author_map::AuthorIdentity;
pub use author_map::AuthorMap;
pub use branch_head::BranchHead;
pub use branch_head::Tip;
pub use canonicalize::Emitter;
pub use canonicalize::EmittedCommit;
pub use canonicalize::FileOp;
pub use changeset::Changeset;
pub use changeset::ChangesetArena;
pub use changeset::ChangesetId;
pub use collate::BranchCollation;
pub use collate::CollateBranchInput;
pub use config::CollationConfig;
pub use diagnostics::Diagnostics;
pub use error::Anomaly;
pub use error::CollateError;
pub use error::CollateResult;
pub use file_revision::FileRevision;
pub use file_revision::FileRevisionArena;
pub use file_revision::FileRevisionId;
pub use file_revision::Timestamp;
pub use master::DirId;
pub use master::Master;
pub use master::MasterIndex;
pub use master::RevisionNumber;
pub use revdir::PackSession;
pub use revdir::Revdir;
pub use tag::Tag;
pub use unify::MasterBranchHead;

/// One master's contribution to one output branch, as the caller (a CVS
/// master parser) reports it. This is the input contract of §6 broken out
/// per (master, branch) pair rather than per master, since collation needs
/// both the name-level view ([`MasterBranchHead`]) and the cursor-level view
/// ([`CollateBranchInput`]) of the same fact.
#[derive(Clone, Debug)]
pub struct MasterBranchRecord {
    pub master: MasterIndex,
    pub dir: DirId,
    pub name: Atom,
    pub degree: u32,
    pub tip: Option<FileRevisionId>,
    pub parent_name: Option<Atom>,
    /// True when this per-master branch is a bare continuation of its
    /// parent branch (no commits of its own on this master).
    pub is_continuation: bool,
}

/// Everything produced by [`collate_all`]: the resolved output branches, the
/// Changeset graph, the canonical emission order, and the anomaly counts
/// accumulated along the way.
pub struct CollationOutput {
    pub heads: IndexMap<Atom, BranchHead>,
    pub topo_order: Vec<Atom>,
    pub changesets: ChangesetArena,
    /// Each branch's own commit chain (oldest first), keyed by branch name.
    /// Includes synthetic branches created by the Tag Locator.
    pub collations: IndexMap<Atom, Vec<ChangesetId>>,
    pub canonical_order: Vec<ChangesetId>,
    /// Owning branch name for every Changeset, derived from `collations`;
    /// what [`canonicalize::drive_emission`] needs to label each commit.
    pub branch_of: HashMap<ChangesetId, Atom>,
    pub diagnostics: Diagnostics,
}

/// Runs the full collation pipeline: unify branch names across masters,
/// topologically sort and resolve parents, collate each branch in that
/// order, resolve tags (possibly growing the output branch list with
/// synthetic branches), mark tails, and canonicalize the emission order.
pub fn collate_all(
    per_master: &[Vec<MasterBranchRecord>],
    arena: &FileRevisionArena,
    masters: &[Master],
    tags: &[Tag],
    config: &CollationConfig,
    interner: &mut impl Interner,
) -> CollateResult<CollationOutput> {
    let per_master_heads: Vec<Vec<MasterBranchHead>> = per_master
        .iter()
        .map(|records| {
            records
                .iter()
                .map(|r| MasterBranchHead {
                    name: r.name.clone(),
                    degree: r.degree,
                    tip: r.tip,
                    parent_name: r.parent_name.clone(),
                })
                .collect()
        })
        .collect();
    let head_slices: Vec<&[MasterBranchHead]> = per_master_heads.iter().map(Vec::as_slice).collect();

    let mut heads = unify::unify_branches(head_slices.iter().copied());
    let mut topo_order = topo_sort::topological_sort(&heads, head_slices.iter().copied())?;
    parent_resolve::resolve_parents(&heads, head_slices.iter().copied())?;

    let mut diagnostics = Diagnostics::default();
    let mut changesets = ChangesetArena::default();
    let mut collations: IndexMap<Atom, Vec<ChangesetId>> = IndexMap::new();

    for name in &topo_order {
        let inputs: Vec<CollateBranchInput> = per_master
            .iter()
            .flat_map(|records| records.iter())
            .filter(|r| &r.name == name)
            .map(|r| CollateBranchInput {
                master: r.master,
                dir: r.dir,
                tip: r.tip,
                is_continuation: r.is_continuation,
            })
            .collect();
        if inputs.is_empty() {
            continue;
        }

        let head = &heads[name];
        let presumed_parent = head.parent_name().and_then(|p| heads.get(&p));
        let collation = collate::collate_branch(
            name,
            &inputs,
            config,
            arena,
            &mut changesets,
            presumed_parent,
            &heads,
            &mut diagnostics,
        );
        if let Some(&newest) = collation.chain.last() {
            head.advance_to_git(newest);
        }
        collations.insert(name.clone(), collation.chain);
    }

    for tag in tags {
        let before = topo_order.len();
        tag_locate::locate_tag(
            tag,
            arena,
            &mut changesets,
            masters,
            &mut heads,
            &mut topo_order,
            config,
            interner,
            &mut diagnostics,
        );
        if topo_order.len() > before {
            let synthetic = topo_order.last().expect("just pushed").clone();
            if let Some(commit) = tag.resolved.get() {
                collations.insert(synthetic, vec![commit]);
            }
        }
    }

    tail_mark::mark_tails(&collations, &changesets);

    let canonical_order = canonicalize::canonicalize(&collations, &topo_order, &changesets, &mut diagnostics);

    let mut branch_of = HashMap::new();
    for (name, chain) in &collations {
        for &id in chain {
            branch_of.insert(id, name.clone());
        }
    }

    Ok(CollationOutput {
        heads,
        topo_order,
        changesets,
        collations,
        canonical_order,
        branch_of,
        diagnostics,
    })
}
