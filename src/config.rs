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

//! Collation configuration. No file or CLI parsing lives here — that stays
//! with the (out-of-scope) caller; this is just the knob set the collator
//! and tag locator read from.

use crate::atom::Atom;
use crate::atom::Interner;

/// The commit-coalescence window and related tunables.
#[derive(Clone, Debug)]
pub struct CollationConfig {
    /// Maximum timestamp difference, in seconds, permitted between two
    /// FileRevisions coalesced into one Changeset (the "commit window").
    pub commit_window_secs: u64,
    /// Whether to trust matching commit-ids as a sufficient coalescence
    /// condition (see the similarity relation in the Branch Collator).
    pub trust_commit_ids: bool,
    /// Author identity used on synthetic Changesets created by the Tag
    /// Locator for an incomplete tag.
    pub synthetic_tag_author: Atom,
}

impl CollationConfig {
    pub fn new(interner: &mut impl Interner, commit_window_secs: u64, trust_commit_ids: bool) -> Self {
        CollationConfig {
            commit_window_secs,
            trust_commit_ids,
            synthetic_tag_author: interner.intern("cvs-collate"),
        }
    }
}
