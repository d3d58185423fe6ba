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

//! End-to-end scenarios exercising the pipeline from raw file revisions
//! down to canonical emission order, plus a couple of cases driven at the
//! lower level (direct Changeset/collation construction) where building a
//! full `FileRevisionArena` would depend on Branch Collator edge cases this
//! suite doesn't otherwise need to pin down.

use std::cell::Cell;

use indexmap::IndexMap;
use once_cell::unsync::OnceCell;

use cvs_collate::atom::SimpleInterner;
use cvs_collate::canonicalize;
use cvs_collate::tag_locate;
use cvs_collate::tail_mark;
use cvs_collate::{
    Changeset, ChangesetArena, ChangesetId, CollationConfig, DirId, FileRevision, FileRevisionArena,
    FileRevisionId, Interner, Master, MasterIndex, MasterBranchRecord, Revdir, RevisionNumber, Tag, Timestamp,
    collate_all,
};

fn config(interner: &mut SimpleInterner) -> CollationConfig {
    CollationConfig::new(interner, 300, true)
}

fn file_revision(
    interner: &mut SimpleInterner,
    master: u32,
    revision: &str,
    t: i64,
    author: &str,
    log: &str,
    commit_id: Option<&str>,
    parent: Option<FileRevisionId>,
) -> FileRevision {
    FileRevision {
        master: MasterIndex(master),
        revision: RevisionNumber::new(interner.intern(revision)),
        timestamp: Timestamp(t),
        author: interner.intern(author),
        log: interner.intern(log),
        commit_id: commit_id.map(|c| interner.intern(c)),
        parent,
        dead: false,
        tail: Cell::new(false),
        tailed: Cell::new(false),
        gitspace: OnceCell::new(),
        emitted: Cell::new(false),
    }
}

fn trunk_record(
    interner: &mut SimpleInterner,
    master: u32,
    tip: FileRevisionId,
    degree: u32,
) -> MasterBranchRecord {
    MasterBranchRecord {
        master: MasterIndex(master),
        dir: DirId(0),
        name: interner.intern("trunk"),
        degree,
        tip: Some(tip),
        parent_name: None,
        is_continuation: false,
    }
}

#[test]
fn single_file_two_revision_trunk_collates_in_order() {
    let mut interner = SimpleInterner::default();
    let mut arena = FileRevisionArena::default();

    let rev1 = arena.push(file_revision(&mut interner, 0, "1.1", 100, "alice", "first", None, None));
    let rev2 = arena.push(file_revision(&mut interner, 0, "1.2", 200, "alice", "second", None, Some(rev1)));

    let masters = vec![Master::new(MasterIndex(0), "a", false)];
    let per_master = vec![vec![trunk_record(&mut interner, 0, rev2, 2)]];
    let cfg = config(&mut interner);

    let output = collate_all(&per_master, &arena, &masters, &[], &cfg, &mut interner).expect("collation succeeds");

    let chain = output.collations.get(&interner.intern("trunk")).expect("trunk collated");
    assert_eq!(chain.len(), 2);
    let (id0, id1) = (chain[0], chain[1]);
    assert_eq!(output.changesets.get(id0).parent, None);
    assert_eq!(output.changesets.get(id1).parent, Some(id0));
    assert_eq!(output.changesets.get(id0).date, Timestamp(100));
    assert_eq!(output.changesets.get(id1).date, Timestamp(200));
    assert_eq!(output.canonical_order, vec![id0, id1]);
    assert_eq!(output.diagnostics.total(), 0);
    assert_eq!(arena.get(rev1).gitspace(), Some(id0));
    assert_eq!(arena.get(rev2).gitspace(), Some(id1));
}

#[test]
fn two_files_with_close_timestamps_coalesce_into_one_changeset() {
    let mut interner = SimpleInterner::default();
    let mut arena = FileRevisionArena::default();

    let a1 = arena.push(file_revision(&mut interner, 0, "1.1", 100, "alice", "msg", None, None));
    let b1 = arena.push(file_revision(&mut interner, 1, "1.1", 105, "alice", "msg", None, None));

    let masters = vec![
        Master::new(MasterIndex(0), "a", false),
        Master::new(MasterIndex(1), "b", false),
    ];
    let per_master = vec![
        vec![trunk_record(&mut interner, 0, a1, 2)],
        vec![trunk_record(&mut interner, 1, b1, 2)],
    ];
    let cfg = config(&mut interner);

    let output = collate_all(&per_master, &arena, &masters, &[], &cfg, &mut interner).expect("collation succeeds");

    let chain = output.collations.get(&interner.intern("trunk")).expect("trunk collated");
    assert_eq!(chain.len(), 1, "close timestamps with matching log/author must coalesce");
    let only = output.changesets.get(chain[0]);
    assert_eq!(only.date, Timestamp(105));
    assert_eq!(only.revdir.len(), 2);
    assert_eq!(arena.get(a1).gitspace(), Some(chain[0]));
    assert_eq!(arena.get(b1).gitspace(), Some(chain[0]));
    assert_eq!(output.diagnostics.total(), 0);
}

#[test]
fn distinct_commit_ids_prevent_coalescing_despite_similar_metadata() {
    let mut interner = SimpleInterner::default();
    let mut arena = FileRevisionArena::default();

    let a1 = arena.push(file_revision(
        &mut interner,
        0,
        "1.1",
        100,
        "alice",
        "msg",
        Some("C1"),
        None,
    ));
    let b1 = arena.push(file_revision(
        &mut interner,
        1,
        "1.1",
        101,
        "alice",
        "msg",
        Some("C2"),
        None,
    ));

    let masters = vec![
        Master::new(MasterIndex(0), "a", false),
        Master::new(MasterIndex(1), "b", false),
    ];
    let per_master = vec![
        vec![trunk_record(&mut interner, 0, a1, 2)],
        vec![trunk_record(&mut interner, 1, b1, 2)],
    ];
    let cfg = config(&mut interner);

    let output = collate_all(&per_master, &arena, &masters, &[], &cfg, &mut interner).expect("collation succeeds");

    let chain = output.collations.get(&interner.intern("trunk")).expect("trunk collated");
    assert_eq!(chain.len(), 2, "mismatched commit-ids must not coalesce");
    let (id0, id1) = (chain[0], chain[1]);

    let older = output.changesets.get(id0);
    assert_eq!(older.date, Timestamp(100));
    assert_eq!(older.revdir.len(), 1, "b is not introduced until the second commit");

    let newer = output.changesets.get(id1);
    assert_eq!(newer.date, Timestamp(101));
    assert_eq!(newer.parent, Some(id0));
    assert_eq!(newer.revdir.len(), 2, "a is carried forward unchanged alongside the new b revision");

    assert_eq!(output.diagnostics.total(), 0);
}

fn leaf(interner: &mut SimpleInterner, parent: Option<ChangesetId>, date: i64, revdir: Revdir) -> Changeset {
    Changeset {
        parent,
        date: Timestamp(date),
        commit_id: None,
        log: interner.intern("msg"),
        author: interner.intern("alice"),
        revdir,
        serial: Cell::new(0),
        mark: Cell::new(None),
        tail: Cell::new(false),
        dead: false,
        refcount: Cell::new(0),
    }
}

/// A fork three levels deep (trunk -> b1 -> b2): each branch's own oldest
/// commit, and only that commit, must come out of the Tail Marker tail-set,
/// and the Canonicalizer's date polish must still respect every branch's
/// own root as a floor when pulling an earlier-dated commit forward.
#[test]
fn nested_branch_forks_mark_only_their_own_root_commit_tail() {
    let mut interner = SimpleInterner::default();
    let mut changesets = ChangesetArena::default();

    let trunk_root = changesets.push(leaf(&mut interner, None, 100, Revdir::default()));
    let trunk_tip = changesets.push(leaf(&mut interner, Some(trunk_root), 300, Revdir::default()));
    let b1_commit = changesets.push(leaf(&mut interner, Some(trunk_root), 120, Revdir::default()));
    let b2_commit = changesets.push(leaf(&mut interner, Some(b1_commit), 140, Revdir::default()));

    let mut collations: IndexMap<cvs_collate::Atom, Vec<ChangesetId>> = IndexMap::new();
    collations.insert(interner.intern("trunk"), vec![trunk_root, trunk_tip]);
    collations.insert(interner.intern("b1"), vec![b1_commit]);
    collations.insert(interner.intern("b2"), vec![b2_commit]);
    let topo_order = vec![interner.intern("trunk"), interner.intern("b1"), interner.intern("b2")];

    tail_mark::mark_tails(&collations, &changesets);

    assert!(!changesets.get(trunk_root).tail.get());
    assert!(!changesets.get(trunk_tip).tail.get());
    assert!(changesets.get(b1_commit).tail.get());
    assert!(changesets.get(b2_commit).tail.get());

    let mut diagnostics = cvs_collate::Diagnostics::default();
    let order = canonicalize::canonicalize(&collations, &topo_order, &changesets, &mut diagnostics);

    assert_eq!(order, vec![trunk_root, b1_commit, b2_commit, trunk_tip]);
    assert_eq!(diagnostics.total(), 0);
}

#[test]
fn tag_matching_an_existing_changeset_exactly_resolves_without_synthesizing() {
    let mut interner = SimpleInterner::default();
    let mut arena = FileRevisionArena::default();
    let mut changesets = ChangesetArena::default();
    let masters = vec![
        Master::new(MasterIndex(0), "a", false),
        Master::new(MasterIndex(1), "b", false),
        Master::new(MasterIndex(2), "c", false),
    ];

    let a1 = arena.push(file_revision(&mut interner, 0, "1.1", 199, "alice", "msg", None, None));
    let b1 = arena.push(file_revision(&mut interner, 1, "1.1", 200, "alice", "msg", None, None));
    let c1 = arena.push(file_revision(&mut interner, 2, "1.1", 201, "alice", "msg", None, None));

    let mut session = cvs_collate::PackSession::new(3);
    session.pack_add(MasterIndex(0), DirId(0), a1);
    session.pack_add(MasterIndex(1), DirId(0), b1);
    session.pack_add(MasterIndex(2), DirId(0), c1);
    let changeset = leaf(&mut interner, None, 201, session.pack_end());
    let cid = changesets.push(changeset);
    arena.get(a1).set_gitspace(cid);
    arena.get(b1).set_gitspace(cid);
    arena.get(c1).set_gitspace(cid);

    let trunk = interner.intern("trunk");
    let head = cvs_collate::BranchHead::new_unresolved(trunk.clone(), 2);
    head.advance_to_git(cid);
    let mut heads = IndexMap::new();
    heads.insert(trunk.clone(), head);
    let mut topo_order = vec![trunk];

    let tag = Tag::new(interner.intern("REL-1"), vec![c1, a1, b1]);
    let cfg = config(&mut interner);
    let mut diagnostics = cvs_collate::Diagnostics::default();

    tag_locate::locate_tag(
        &tag,
        &arena,
        &mut changesets,
        &masters,
        &mut heads,
        &mut topo_order,
        &cfg,
        &mut interner,
        &mut diagnostics,
    );

    assert_eq!(tag.resolved.get(), Some(cid));
    assert_eq!(heads.len(), 1, "an exact match must not create a synthetic branch");
    assert_eq!(diagnostics.total(), 0);
}

#[test]
fn tag_with_an_incomplete_revision_set_synthesizes_its_own_branch() {
    let mut interner = SimpleInterner::default();
    let mut arena = FileRevisionArena::default();
    let mut changesets = ChangesetArena::default();
    let masters = vec![
        Master::new(MasterIndex(0), "a", false),
        Master::new(MasterIndex(1), "b", false),
        Master::new(MasterIndex(2), "c", false),
    ];

    let a1 = arena.push(file_revision(&mut interner, 0, "1.1", 100, "alice", "msg", None, None));
    let b1 = arena.push(file_revision(&mut interner, 1, "1.1", 105, "alice", "msg", None, None));
    let c1 = arena.push(file_revision(&mut interner, 2, "1.1", 110, "alice", "msg", None, None));

    let mut base_session = cvs_collate::PackSession::new(2);
    base_session.pack_add(MasterIndex(0), DirId(0), a1);
    base_session.pack_add(MasterIndex(1), DirId(0), b1);
    let base = leaf(&mut interner, None, 105, base_session.pack_end());
    let base_id = changesets.push(base);
    arena.get(a1).set_gitspace(base_id);
    arena.get(b1).set_gitspace(base_id);

    let mut tip_session = cvs_collate::PackSession::new(3);
    tip_session.pack_add(MasterIndex(0), DirId(0), a1);
    tip_session.pack_add(MasterIndex(1), DirId(0), b1);
    tip_session.pack_add(MasterIndex(2), DirId(0), c1);
    let tip = leaf(&mut interner, Some(base_id), 110, tip_session.pack_end());
    let tip_id = changesets.push(tip);
    arena.get(c1).set_gitspace(tip_id);

    let trunk = interner.intern("trunk");
    let head = cvs_collate::BranchHead::new_unresolved(trunk.clone(), 2);
    head.advance_to_git(tip_id);
    head.set_parent(None, 1);
    let mut heads = IndexMap::new();
    heads.insert(trunk.clone(), head);
    let mut topo_order = vec![trunk];

    // Tag references only a and c, skipping b: no Changeset's revdir has
    // exactly this two-file shape, so the tag must synthesize its own.
    let tag = Tag::new(interner.intern("ODD"), vec![a1, c1]);
    let cfg = config(&mut interner);
    let mut diagnostics = cvs_collate::Diagnostics::default();

    tag_locate::locate_tag(
        &tag,
        &arena,
        &mut changesets,
        &masters,
        &mut heads,
        &mut topo_order,
        &cfg,
        &mut interner,
        &mut diagnostics,
    );

    let resolved = tag.resolved.get().expect("incomplete tag still resolves, via synthesis");
    assert_ne!(resolved, tip_id);
    assert_ne!(resolved, base_id);
    assert_eq!(changesets.get(resolved).parent, Some(tip_id));
    assert_eq!(changesets.get(resolved).revdir.len(), 2);
    assert_eq!(heads.len(), 2);
    assert_eq!(topo_order.len(), 2);
    assert_eq!(heads[&tag.name].depth.get(), 2);
    assert_eq!(diagnostics.total(), 0);
}

#[test]
fn every_live_file_revision_gets_a_gitspace_link_and_revdirs_stay_deep_path_ordered() {
    let mut interner = SimpleInterner::default();
    let mut arena = FileRevisionArena::default();

    let a1 = arena.push(file_revision(&mut interner, 0, "1.1", 100, "alice", "msg", None, None));
    let b1 = arena.push(file_revision(&mut interner, 1, "1.1", 105, "alice", "msg", None, None));

    let masters = vec![
        Master::new(MasterIndex(0), "a", false),
        Master::new(MasterIndex(1), "b", false),
    ];
    let per_master = vec![
        vec![trunk_record(&mut interner, 0, a1, 2)],
        vec![trunk_record(&mut interner, 1, b1, 2)],
    ];
    let cfg = config(&mut interner);

    let output = collate_all(&per_master, &arena, &masters, &[], &cfg, &mut interner).expect("collation succeeds");

    for id in [a1, b1] {
        assert!(arena.get(id).gitspace().is_some(), "every live revision must end up collated");
    }

    for (id, changeset) in output.changesets.iter() {
        assert!(
            changeset.revdir.entries().windows(2).all(|w| w[0].master < w[1].master),
            "revdir entries must stay sorted by MasterIndex"
        );
        assert!(output.branch_of.contains_key(&id), "every changeset must be attributed to a branch");
    }
}
