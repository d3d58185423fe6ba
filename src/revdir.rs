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

//! The packed, iterable snapshot of file revisions belonging to a
//! Changeset ("revdir").
//!
//! The facility is an external collaborator in the system design; only its
//! iterator contract is specified (`pack_alloc`/`pack_init`/`pack_add`/
//! `pack_end`, `iter_next`/`iter_next_dir`/`iter_same_dir`). This module
//! gives a reference implementation adequate to drive the collator, the tag
//! locator, and the canonicalizer's merge-join, grounded in the same
//! trait-behind-storage idiom as `OpStore` in the teacher crate.

use crate::file_revision::FileRevisionId;
use crate::master::DirId;
use crate::master::MasterIndex;

/// One (file, revision) pair in a packed directory snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevdirEntry {
    pub master: MasterIndex,
    pub dir: DirId,
    pub revision: FileRevisionId,
}

/// A compact, ordered snapshot of file revisions, iterable in deep-path
/// order (i.e. by `MasterIndex`, since Masters are globally enumerated in
/// that order).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Revdir {
    entries: Vec<RevdirEntry>,
}

impl Revdir {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RevdirEntry] {
        &self.entries
    }

    pub fn iter(&self) -> RevdirIter<'_> {
        RevdirIter {
            entries: &self.entries,
            pos: 0,
        }
    }

    pub fn get(&self, master: MasterIndex) -> Option<FileRevisionId> {
        self.entries
            .binary_search_by_key(&master, |e| e.master)
            .ok()
            .map(|i| self.entries[i].revision)
    }
}

/// Scoped builder for a [`Revdir`] (`pack_init` .. `pack_end`). Acquired via
/// [`PackSession::new`] and consumed by [`PackSession::pack_end`]; Rust's
/// borrow checker enforces the single-owner, non-nested scoping the source
/// achieved with a process-wide scratch buffer.
pub struct PackSession {
    entries: Vec<RevdirEntry>,
}

impl PackSession {
    /// `pack_alloc(n)` + `pack_init`: reserve space for `capacity_hint`
    /// entries and open a new packing scope.
    pub fn new(capacity_hint: usize) -> Self {
        PackSession {
            entries: Vec::with_capacity(capacity_hint),
        }
    }

    /// `pack_add(rev, dir)`.
    pub fn pack_add(&mut self, master: MasterIndex, dir: DirId, revision: FileRevisionId) {
        self.entries.push(RevdirEntry {
            master,
            dir,
            revision,
        });
    }

    /// `pack_end`: closes the scope and returns the packed, deep-path
    /// ordered [`Revdir`].
    pub fn pack_end(mut self) -> Revdir {
        self.entries.sort_by_key(|e| e.master);
        debug_assert!(
            self.entries.windows(2).all(|w| w[0].master != w[1].master),
            "pack_add called twice for the same master in one changeset"
        );
        Revdir {
            entries: self.entries,
        }
    }
}

/// Forward iterator over a [`Revdir`] in deep-path order, supporting the
/// `iter_next_dir`/`iter_same_dir` fast-skip contract used by the
/// canonicalizer's merge-join.
pub struct RevdirIter<'a> {
    entries: &'a [RevdirEntry],
    pos: usize,
}

impl<'a> RevdirIter<'a> {
    pub fn peek(&self) -> Option<&'a RevdirEntry> {
        self.entries.get(self.pos)
    }

    /// `iter_next`.
    pub fn advance(&mut self) -> Option<&'a RevdirEntry> {
        let entry = self.entries.get(self.pos)?;
        self.pos += 1;
        Some(entry)
    }

    /// `iter_next_dir`: skip past every remaining entry sharing the current
    /// entry's directory bucket.
    pub fn skip_dir(&mut self) {
        let Some(dir) = self.peek().map(|e| e.dir) else {
            return;
        };
        while let Some(entry) = self.peek() {
            if entry.dir != dir {
                break;
            }
            self.pos += 1;
        }
    }
}

impl<'a> Iterator for RevdirIter<'a> {
    type Item = &'a RevdirEntry;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}

/// `iter_same_dir(a, b)`: true iff both iterators currently sit in the same
/// packed directory bucket, letting a merge-join fast-skip the whole
/// directory when both sides agree.
pub fn iter_same_dir(a: &RevdirIter<'_>, b: &RevdirIter<'_>) -> bool {
    match (a.peek(), b.peek()) {
        (Some(a), Some(b)) => a.dir == b.dir,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_revision::FileRevisionId;

    fn fr(n: u32) -> FileRevisionId {
        FileRevisionId::new_for_test(n)
    }

    #[test]
    fn pack_end_sorts_by_master_order_regardless_of_add_order() {
        let mut session = PackSession::new(2);
        session.pack_add(MasterIndex(2), DirId(0), fr(0));
        session.pack_add(MasterIndex(0), DirId(0), fr(1));
        session.pack_add(MasterIndex(1), DirId(0), fr(2));
        let revdir = session.pack_end();
        let order: Vec<u32> = revdir.entries().iter().map(|e| e.master.0).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn skip_dir_advances_past_whole_bucket() {
        let mut session = PackSession::new(3);
        session.pack_add(MasterIndex(0), DirId(0), fr(0));
        session.pack_add(MasterIndex(1), DirId(0), fr(1));
        session.pack_add(MasterIndex(2), DirId(1), fr(2));
        let revdir = session.pack_end();
        let mut iter = revdir.iter();
        iter.skip_dir();
        assert_eq!(iter.peek().unwrap().master, MasterIndex(2));
    }

    #[test]
    fn same_dir_detects_shared_bucket() {
        let mut session_a = PackSession::new(1);
        session_a.pack_add(MasterIndex(0), DirId(5), fr(0));
        let a = session_a.pack_end();

        let mut session_b = PackSession::new(1);
        session_b.pack_add(MasterIndex(0), DirId(5), fr(1));
        let b = session_b.pack_end();

        assert!(iter_same_dir(&a.iter(), &b.iter()));
    }
}
