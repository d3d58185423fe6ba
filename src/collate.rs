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

//! Branch Collator: the parallel walk that produces the changeset sequence
//! for one output branch and attaches it to its parent.

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::atom::Atom;
use crate::branch_head::BranchHead;
use crate::changeset::Changeset;
use crate::changeset::ChangesetArena;
use crate::changeset::ChangesetId;
use crate::config::CollationConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Anomaly;
use crate::file_revision::FileRevision;
use crate::file_revision::FileRevisionArena;
use crate::file_revision::FileRevisionId;
use crate::file_revision::Timestamp;
use crate::master::DirId;
use crate::master::MasterIndex;
use crate::revdir::PackSession;

/// One per-master branch carrying the output branch name being collated.
pub struct CollateBranchInput {
    pub master: MasterIndex,
    pub dir: DirId,
    pub tip: Option<FileRevisionId>,
    /// True when this per-master branch is a bare continuation of its
    /// parent branch rather than a true fork with commits of its own.
    pub is_continuation: bool,
}

struct Cursor {
    master: MasterIndex,
    dir: DirId,
    rev: Option<FileRevisionId>,
}

struct PendingChangeset {
    date: Timestamp,
    commit_id: Option<Atom>,
    log: Atom,
    author: Atom,
    revdir: PackSession,
    /// FileRevisions whose `gitspace` should resolve to this changeset once
    /// it is allocated.
    gitspace_targets: Vec<FileRevisionId>,
}

/// Result of collating one output branch: its commit chain, oldest first.
pub struct BranchCollation {
    pub chain: Vec<ChangesetId>,
}

fn is_dead_root(fr: &FileRevision) -> bool {
    fr.dead && fr.parent.is_none()
}

/// Two FileRevisions are eligible to coalesce into one Changeset (§4.4 step
/// 3): commit-ids agree when trusted, else closeness in time plus identical
/// log and author.
fn similar(a: &FileRevision, b: &FileRevision, config: &CollationConfig) -> bool {
    if config.trust_commit_ids {
        match (&a.commit_id, &b.commit_id) {
            (Some(x), Some(y)) => return x == y,
            (Some(_), None) | (None, Some(_)) => return false,
            (None, None) => {}
        }
    }
    a.timestamp.abs_diff(b.timestamp) < config.commit_window_secs
        && a.log == b.log
        && a.author == b.author
}

/// Same relation, applied between an already-built Changeset (whose date,
/// log, author and commit-id are those of its own leader) and a candidate
/// FileRevision, for use by the branch-join search.
fn changeset_matches(changeset: &Changeset, revision: &FileRevision, config: &CollationConfig) -> bool {
    if config.trust_commit_ids {
        match (&changeset.commit_id, &revision.commit_id) {
            (Some(x), Some(y)) => return x == y,
            (Some(_), None) | (None, Some(_)) => return false,
            (None, None) => {}
        }
    }
    changeset.date.abs_diff(revision.timestamp) < config.commit_window_secs
        && changeset.log == revision.log
        && changeset.author == revision.author
}

fn walk_branch_for_match(
    changesets: &ChangesetArena,
    start: Option<ChangesetId>,
    target: &FileRevision,
    config: &CollationConfig,
) -> Option<ChangesetId> {
    let mut cursor = start;
    while let Some(id) = cursor {
        let changeset = changesets.get(id);
        if changeset_matches(changeset, target, config) {
            return Some(id);
        }
        cursor = changeset.parent;
    }
    None
}

fn walk_branch_for_date(
    changesets: &ChangesetArena,
    start: Option<ChangesetId>,
    date: Timestamp,
) -> Option<ChangesetId> {
    let mut cursor = start;
    while let Some(id) = cursor {
        let changeset = changesets.get(id);
        if changeset.date.0 <= date.0 {
            return Some(id);
        }
        cursor = changeset.parent;
    }
    None
}

/// `git_commit_locate`: check the presumed parent branch first, then fall
/// back to scanning every output branch's committed chain.
fn locate_changeset_for(
    target: &FileRevision,
    presumed_parent: Option<&BranchHead>,
    all_heads: &IndexMap<Atom, BranchHead>,
    changesets: &ChangesetArena,
    config: &CollationConfig,
) -> Option<ChangesetId> {
    if let Some(parent) = presumed_parent
        && let Some(found) = walk_branch_for_match(changesets, parent.tip.get().and_then(|t| t.as_git()), target, config)
    {
        return Some(found);
    }
    all_heads
        .values()
        .find_map(|head| walk_branch_for_match(changesets, head.tip.get().and_then(|t| t.as_git()), target, config))
}

/// `git_branch_of_commit`: used only to produce the "possible match" hint on
/// a `BranchPointNotFound` anomaly.
fn find_owning_branch_name<'a>(
    target: &FileRevision,
    all_heads: &'a IndexMap<Atom, BranchHead>,
    changesets: &ChangesetArena,
    config: &CollationConfig,
) -> Option<&'a Atom> {
    all_heads.iter().find_map(|(name, head)| {
        if head.tail.get() {
            return None;
        }
        walk_branch_for_match(changesets, head.tip.get().and_then(|t| t.as_git()), target, config).map(|_| name)
    })
}

/// Collates the per-master branches in `inputs` — all carrying the same
/// output branch name — into the commit chain for that output branch, and
/// grafts it onto the parent branch found via `presumed_parent`.
pub fn collate_branch(
    branch_name: &Atom,
    inputs: &[CollateBranchInput],
    config: &CollationConfig,
    arena: &FileRevisionArena,
    changesets: &mut ChangesetArena,
    presumed_parent: Option<&BranchHead>,
    all_heads: &IndexMap<Atom, BranchHead>,
    diagnostics: &mut Diagnostics,
) -> BranchCollation {
    let mut cursors: SmallVec<[Cursor; 4]> = SmallVec::with_capacity(inputs.len());
    let mut birth: Option<Timestamp> = None;

    for input in inputs {
        cursors.push(Cursor {
            master: input.master,
            dir: input.dir,
            rev: input.tip,
        });
        let Some(tip) = input.tip else { continue };
        if input.is_continuation {
            arena.get(tip).tailed.set(true);
            continue;
        }

        let mut walker = Some(tip);
        while let Some(id) = walker {
            let fr = arena.get(id);
            if fr.tail.get() {
                break;
            }
            fold_birth(&mut birth, fr.timestamp);
            walker = fr.parent;
        }
        if let Some(id) = walker {
            let fr = arena.get(id);
            let include = if !fr.dead {
                true
            } else {
                match fr.parent {
                    Some(pid) => arena.get(pid).timestamp.0 != fr.timestamp.0,
                    None => true,
                }
            };
            if include {
                fold_birth(&mut birth, fr.timestamp);
            }
        }
    }

    // Sanity check: a continuation cursor whose tip predates the branch's
    // imputed birth is clock-skew noise; drop it (after warning if alive).
    for cursor in &mut cursors {
        let Some(id) = cursor.rev else { continue };
        let fr = arena.get(id);
        if !fr.tailed.get() {
            continue;
        }
        let Some(birth) = birth else { continue };
        if fr.timestamp.0 >= birth.0 {
            continue;
        }
        if !fr.dead {
            diagnostics.record(Anomaly::TipOlderThanBirth {
                branch: branch_name.to_string(),
            });
        }
        cursor.rev = None;
    }

    let mut pending: Vec<PendingChangeset> = Vec::new();

    while cursors.iter().any(|c| is_live(c, arena)) {
        cursors.retain(|c| c.rev.is_some());

        // `max_by_key` would keep the *last* cursor on a timestamp tie;
        // the original keeps the first (`latest` only moves on a strictly
        // newer date), so the leader has to be picked by hand here.
        let leader_id = cursors
            .iter()
            .filter(|c| !arena.get(c.rev.unwrap()).tailed.get())
            .map(|c| c.rev.unwrap())
            .fold(None, |best: Option<FileRevisionId>, id| match best {
                Some(best_id) if arena.get(best_id).timestamp.0 >= arena.get(id).timestamp.0 => Some(best_id),
                _ => Some(id),
            })
            .expect("leader selection requires at least one live cursor");
        let leader = arena.get(leader_id);

        let mut revdir = PackSession::new(cursors.len());
        for cursor in &cursors {
            let id = cursor.rev.unwrap();
            let fr = arena.get(id);
            if !fr.dead {
                revdir.pack_add(cursor.master, cursor.dir, id);
            }
        }
        let mut gitspace_targets = Vec::new();

        for cursor in &mut cursors {
            let id = cursor.rev.unwrap();
            if arena.get(id).tailed.get() {
                continue;
            }
            let fr = arena.get(id);
            let matches_leader = id == leader_id || similar(fr, leader, config);
            if !matches_leader {
                continue;
            }

            gitspace_targets.push(id);

            match fr.parent {
                None => cursor.rev = None,
                Some(parent_id) => {
                    let parent = arena.get(parent_id);
                    if fr.tail.get() {
                        if is_dead_root(parent) {
                            cursor.rev = None;
                        } else if birth.is_some_and(|b| b.0 < parent.timestamp.0) {
                            cursor.rev = None;
                        } else {
                            parent.tailed.set(true);
                            cursor.rev = Some(parent_id);
                        }
                    } else if !parent.dead {
                        cursor.rev = Some(parent_id);
                    } else if is_dead_root(parent) {
                        cursor.rev = None;
                    } else if parent.tail.get()
                        && parent
                            .parent
                            .is_some_and(|gp| arena.get(gp).timestamp.0 == parent.timestamp.0)
                    {
                        cursor.rev = None;
                    } else {
                        cursor.rev = Some(parent_id);
                    }
                }
            }
        }

        pending.push(PendingChangeset {
            date: leader.timestamp,
            commit_id: leader.commit_id.clone(),
            log: leader.log.clone(),
            author: leader.author.clone(),
            revdir,
            gitspace_targets,
        });
    }

    // Branch join: surviving cursors point one revision beyond this
    // branch's oldest commit.
    let mut survivors: Vec<FileRevisionId> = cursors.iter().filter_map(|c| c.rev).collect();
    survivors.sort_by(|a, b| {
        let fa = arena.get(*a);
        let fb = arena.get(*b);
        fb.tailed
            .get()
            .cmp(&fa.tailed.get())
            .then_with(|| fb.timestamp.0.cmp(&fa.timestamp.0))
            .then_with(|| a.cmp(b))
    });

    let oldest_join = survivors.iter().find(|id| !arena.get(**id).dead).copied();

    let root_parent: Option<ChangesetId> = match oldest_join {
        None => None,
        Some(p_id) => {
            let p = arena.get(p_id);
            match locate_changeset_for(p, presumed_parent, all_heads, changesets, config) {
                Some(found) => {
                    let found_date = changesets.get(found).date;
                    if let Some(prev) = pending.last()
                        && found_date.0 > prev.date.0
                    {
                        diagnostics.record(Anomaly::BranchPointLaterThanBranch {
                            child: branch_name.to_string(),
                            parent: presumed_parent
                                .map(|h| h.name.to_string())
                                .unwrap_or_default(),
                        });
                    }
                    Some(found)
                }
                None => {
                    let date_matched = presumed_parent.and_then(|parent| {
                        walk_branch_for_date(changesets, parent.tip.get().and_then(|t| t.as_git()), p.timestamp)
                    });
                    match date_matched {
                        Some(found) => {
                            diagnostics.record(Anomaly::BranchPointMatchedByDate {
                                child: branch_name.to_string(),
                                parent: presumed_parent
                                    .map(|h| h.name.to_string())
                                    .unwrap_or_default(),
                            });
                            Some(found)
                        }
                        None => {
                            let hint = find_owning_branch_name(p, all_heads, changesets, config);
                            diagnostics.record(Anomaly::branch_point_not_found(branch_name, hint));
                            None
                        }
                    }
                }
            }
        }
    };

    // A real splice onto an existing (found or date-matched) Changeset
    // crosses into another branch and needs the old commit's tail flag set.
    // Synthesizing a brand-new root does not: that root's parent is null.
    let spliced_onto_existing = root_parent.is_some();

    let mut chain_ids: Vec<ChangesetId> = Vec::with_capacity(pending.len() + 1);
    let mut parent_cursor = root_parent;

    if root_parent.is_none()
        && let Some(p_id) = oldest_join
        && !arena.get(p_id).dead
    {
        // No splice target found anywhere: synthesize a new root from the
        // surviving cursors, with the newest survivor as leader.
        let leader_id = survivors[0];
        let leader = arena.get(leader_id);
        let mut revdir = PackSession::new(survivors.len());
        for id in &survivors {
            let fr = arena.get(*id);
            if !fr.dead
                && let Some(cursor) = cursors.iter().find(|c| c.rev == Some(*id))
            {
                revdir.pack_add(cursor.master, cursor.dir, *id);
            }
        }
        let changeset = Changeset {
            parent: None,
            date: leader.timestamp,
            commit_id: leader.commit_id.clone(),
            log: leader.log.clone(),
            author: leader.author.clone(),
            revdir: revdir.pack_end(),
            serial: std::cell::Cell::new(0),
            mark: std::cell::Cell::new(None),
            tail: std::cell::Cell::new(false),
            dead: false,
            refcount: std::cell::Cell::new(0),
        };
        let id = changesets.push(changeset);
        for survivor in &survivors {
            if !arena.get(*survivor).dead {
                arena.get(*survivor).set_gitspace(id);
            }
        }
        chain_ids.push(id);
        parent_cursor = Some(id);
    }

    let mut own_oldest: Option<ChangesetId> = None;
    let mut branch_serial = chain_ids.len() as u32;
    for built in pending.into_iter().rev() {
        let changeset = Changeset {
            parent: parent_cursor,
            date: built.date,
            commit_id: built.commit_id,
            log: built.log,
            author: built.author,
            revdir: built.revdir.pack_end(),
            serial: std::cell::Cell::new(branch_serial),
            mark: std::cell::Cell::new(None),
            tail: std::cell::Cell::new(false),
            dead: false,
            refcount: std::cell::Cell::new(0),
        };
        branch_serial += 1;
        let id = changesets.push(changeset);
        for target in built.gitspace_targets {
            if !arena.get(target).set_gitspace(id) {
                diagnostics.record(Anomaly::DuplicateGitspaceAssignment);
            }
        }
        if own_oldest.is_none() {
            own_oldest = Some(id);
        }
        parent_cursor = Some(id);
        chain_ids.push(id);
    }

    if spliced_onto_existing
        && let Some(oldest) = own_oldest
    {
        changesets.get(oldest).tail.set(true);
    }

    for cursor in &cursors {
        if let Some(id) = cursor.rev {
            arena.get(id).tailed.set(false);
        }
    }

    BranchCollation { chain: chain_ids }
}

fn fold_birth(birth: &mut Option<Timestamp>, candidate: Timestamp) {
    *birth = Some(match *birth {
        None => candidate,
        Some(current) if candidate.0 < current.0 => candidate,
        Some(current) => current,
    });
}

/// A cursor keeps the main loop running only while it could still produce
/// real work: tailed cursors are done, and a dead cursor with no parent
/// (`is_dead_root`) that hasn't matched this round's leader never will —
/// it just sits there forever otherwise.
fn is_live(cursor: &Cursor, arena: &FileRevisionArena) -> bool {
    match cursor.rev {
        None => false,
        Some(id) => {
            let fr = arena.get(id);
            !fr.tailed.get() && !is_dead_root(fr)
        }
    }
}
