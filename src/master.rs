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

//! Masters (per-file histories) and revision numbers.

use std::cmp::Ordering;
use std::fmt;

use crate::atom::Atom;

/// An interned dotted-integer CVS revision number, e.g. `1.2` or `1.1.1.1`.
///
/// Equality is by identity of the interned components; two
/// `RevisionNumber`s built from the same digits via the same interner are
/// `==` in O(1).
#[derive(Clone, Eq)]
pub struct RevisionNumber {
    components: Vec<u32>,
    text: Atom,
}

impl RevisionNumber {
    pub fn new(text: Atom) -> Self {
        let components = text
            .as_str()
            .split('.')
            .map(|part| part.parse().expect("revision number component must be numeric"))
            .collect();
        RevisionNumber { components, text }
    }

    /// Number of dotted components, used as the branch-stability tiebreak
    /// in the branch unifier.
    pub fn degree(&self) -> usize {
        self.components.len()
    }

    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    pub fn components(&self) -> &[u32] {
        &self.components
    }

    /// `true` for the root revision of trunk, `1.1`.
    pub fn is_trunk_root(&self) -> bool {
        self.components == [1, 1]
    }

    /// `true` for the first revision on a first-level branch off trunk,
    /// `1.1.1.1` — treated as equivalent to `1.1` when comparing tag
    /// revision sets for the same master (see the Tag Locator).
    pub fn is_first_branch_rev(&self) -> bool {
        self.components == [1, 1, 1, 1]
    }
}

impl PartialEq for RevisionNumber {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl fmt::Debug for RevisionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RevisionNumber({})", self.text)
    }
}

impl fmt::Display for RevisionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text.as_str())
    }
}

/// A stable index assigned to each [`Master`] in deep-path enumeration
/// order. Used everywhere the original implementation relied on comparing
/// pointers, so that results are reproducible across runs and allocators
/// (see the design notes on pointer identity as an ordering key).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct MasterIndex(pub u32);

/// A handle to a Master's containing directory, supplied by the (external)
/// master parser and cached on the `Master` so the revdir packer and the
/// collator's cursors can fast-skip whole directories without restring the
/// path on every comparison.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DirId(pub u32);

/// One per-file history container.
#[derive(Debug)]
pub struct Master {
    index: MasterIndex,
    /// Semantic path after suffix stripping (e.g. `,v` removal), used for
    /// grouping and for deep-path ordering.
    path: String,
    /// Output file-operation name: equal to `path` except for a handful of
    /// basename rewrites (`.cvsignore` -> `.gitignore`).
    output_name: String,
    executable: bool,
    dir: DirId,
}

/// Basename rewrites applied when deriving the output file-operation name
/// from a master's semantic path.
const BASENAME_REWRITES: &[(&str, &str)] = &[(".cvsignore", ".gitignore")];

impl Master {
    pub fn new(index: MasterIndex, path: impl Into<String>, executable: bool) -> Self {
        Self::with_dir(index, path, executable, DirId(index.0))
    }

    pub fn with_dir(
        index: MasterIndex,
        path: impl Into<String>,
        executable: bool,
        dir: DirId,
    ) -> Self {
        let path = path.into();
        let output_name = rewrite_basename(&path);
        Master {
            index,
            path,
            output_name,
            executable,
            dir,
        }
    }

    pub fn index(&self) -> MasterIndex {
        self.index
    }

    pub fn dir(&self) -> DirId {
        self.dir
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    pub fn is_executable(&self) -> bool {
        self.executable
    }

    fn components(&self) -> impl Iterator<Item = &str> {
        self.path.split('/')
    }
}

fn rewrite_basename(path: &str) -> String {
    let (dir, base) = match path.rsplit_once('/') {
        Some((dir, base)) => (Some(dir), base),
        None => (None, path),
    };
    let rewritten = BASENAME_REWRITES
        .iter()
        .find(|(from, _)| *from == base)
        .map(|(_, to)| *to);
    match (dir, rewritten) {
        (Some(dir), Some(to)) => format!("{dir}/{to}"),
        (None, Some(to)) => to.to_owned(),
        (_, None) => path.to_owned(),
    }
}

/// Deep-path order: lexicographic on path components, where a path that is
/// a strict prefix of another (i.e. has fewer components but otherwise
/// matches) sorts first. This is exactly slice/iterator comparison of the
/// `/`-separated components, so the Masters list — sorted once in this
/// order at enumeration time — also orders every Changeset's revdir
/// correctly without a secondary sort.
impl PartialEq for Master {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}
impl Eq for Master {}

impl PartialOrd for Master {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Master {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components().cmp(other.components())
    }
}
