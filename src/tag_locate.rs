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

//! Tag Locator: resolves a Tag's revision set to the Changeset whose revdir
//! exactly matches it, or synthesizes one for an incomplete tag.

use std::cell::Cell;

use indexmap::IndexMap;

use crate::atom::Atom;
use crate::atom::Interner;
use crate::branch_head::BranchHead;
use crate::changeset::Changeset;
use crate::changeset::ChangesetArena;
use crate::changeset::ChangesetId;
use crate::config::CollationConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Anomaly;
use crate::file_revision::FileRevisionArena;
use crate::file_revision::FileRevisionId;
use crate::master::Master;
use crate::master::RevisionNumber;
use crate::revdir::PackSession;
use crate::revdir::Revdir;
use crate::tag::Tag;

fn sorted_by_master(ids: &[FileRevisionId], arena: &FileRevisionArena) -> Vec<FileRevisionId> {
    let mut ids = ids.to_vec();
    ids.sort_by_key(|id| arena.get(*id).master.0);
    ids
}

/// `1.1` and `1.1.1.1` on the same master name the same content, since CVS
/// duplicates a file's initial revision onto the first branch commit.
fn revision_numbers_equivalent(a: &RevisionNumber, b: &RevisionNumber) -> bool {
    a == b || (a.is_trunk_root() && b.is_first_branch_rev()) || (a.is_first_branch_rev() && b.is_trunk_root())
}

fn revdir_matches(revdir: &Revdir, wanted: &[FileRevisionId], arena: &FileRevisionArena) -> bool {
    if revdir.len() != wanted.len() {
        return false;
    }
    revdir.entries().iter().zip(wanted.iter()).all(|(entry, id)| {
        let candidate = arena.get(*id);
        if entry.master != candidate.master {
            return false;
        }
        entry.revision == *id
            || revision_numbers_equivalent(&arena.get(entry.revision).revision, &candidate.revision)
    })
}

/// Walks `head`'s tip-to-root chain looking for a Changeset whose revdir
/// equals `wanted`, pruning once a candidate is no newer than `gitspace`
/// (an ancestor can never match once the walk passes the commit step 4
/// already ruled out).
fn search_branch_for_match(
    head: &BranchHead,
    gitspace: ChangesetId,
    changesets: &ChangesetArena,
    wanted: &[FileRevisionId],
    arena: &FileRevisionArena,
) -> Option<ChangesetId> {
    let gitspace_date = changesets.get(gitspace).date;
    let mut cursor = head.tip.get().and_then(|t| t.as_git());
    while let Some(id) = cursor {
        if id == gitspace {
            break;
        }
        let changeset = changesets.get(id);
        if changeset.date.0 < gitspace_date.0 {
            break;
        }
        if revdir_matches(&changeset.revdir, wanted, arena) {
            return Some(id);
        }
        cursor = changeset.parent;
    }
    None
}

fn find_branch_containing(
    target: ChangesetId,
    heads: &IndexMap<Atom, BranchHead>,
    changesets: &ChangesetArena,
) -> Option<Atom> {
    heads.iter().find_map(|(name, head)| {
        let mut cursor = head.tip.get().and_then(|t| t.as_git());
        while let Some(id) = cursor {
            if id == target {
                return Some(name.clone());
            }
            cursor = changesets.get(id).parent;
        }
        None
    })
}

fn pack_revdir(ids: &[FileRevisionId], arena: &FileRevisionArena, masters: &[Master]) -> Revdir {
    let mut session = PackSession::new(ids.len());
    for id in ids {
        let fr = arena.get(*id);
        let dir = masters[fr.master.0 as usize].dir();
        session.pack_add(fr.master, dir, *id);
    }
    session.pack_end()
}

/// Resolves one Tag against the already-collated Changeset graph, appending
/// a synthetic output branch to `heads`/`topo_order` if the tag's revision
/// set is incomplete. `heads` must already be in topological order; the
/// synthetic head is appended at the end, which stays valid since its
/// parent necessarily precedes it.
pub fn locate_tag(
    tag: &Tag,
    arena: &FileRevisionArena,
    changesets: &mut ChangesetArena,
    masters: &[Master],
    heads: &mut IndexMap<Atom, BranchHead>,
    topo_order: &mut Vec<Atom>,
    config: &CollationConfig,
    interner: &mut impl Interner,
    diagnostics: &mut Diagnostics,
) {
    let newest_live = tag
        .revisions
        .iter()
        .filter(|id| !arena.get(**id).dead)
        .max_by_key(|id| arena.get(**id).timestamp.0)
        .copied();
    let Some(anchor_id) = newest_live else {
        // Every revision the tag points at is a deletion: nothing to tag.
        return;
    };
    let anchor = arena.get(anchor_id);
    let Some(gitspace) = anchor.gitspace() else {
        diagnostics.record(Anomaly::TagPointsAtNoGitspace {
            tag: tag.name.to_string(),
        });
        return;
    };

    let wanted = sorted_by_master(&tag.revisions, arena);

    if revdir_matches(&changesets.get(gitspace).revdir, &wanted, arena) {
        tag.resolved.set(Some(gitspace));
        return;
    }

    if let Some(found) = heads
        .values()
        .find_map(|head| search_branch_for_match(head, gitspace, changesets, &wanted, arena))
    {
        tag.resolved.set(Some(found));
        return;
    }

    let parent_name = find_branch_containing(gitspace, heads, changesets);
    let parent_depth = parent_name
        .as_ref()
        .and_then(|name| heads.get(name))
        .map(|h| h.depth.get())
        .unwrap_or(0);

    let changeset = Changeset {
        parent: Some(gitspace),
        date: anchor.timestamp,
        commit_id: None,
        log: interner.intern(&format!("Synthetic commit for incomplete tag {}", tag.name)),
        author: config.synthetic_tag_author.clone(),
        revdir: pack_revdir(&wanted, arena, masters),
        serial: Cell::new(0),
        mark: Cell::new(None),
        tail: Cell::new(false),
        dead: false,
        refcount: Cell::new(0),
    };
    let new_id = changesets.push(changeset);

    let head = BranchHead::new_unresolved(tag.name.clone(), 1);
    head.set_parent(parent_name, parent_depth + 1);
    head.advance_to_git(new_id);
    heads.insert(tag.name.clone(), head);
    topo_order.push(tag.name.clone());

    tag.resolved.set(Some(new_id));
}
