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

//! Tags: named sets of file revisions, resolved to a Changeset by the Tag
//! Locator.

use std::cell::Cell;

use crate::atom::Atom;
use crate::changeset::ChangesetId;
use crate::file_revision::FileRevisionId;

pub struct Tag {
    pub name: Atom,
    pub revisions: Vec<FileRevisionId>,
    pub resolved: Cell<Option<ChangesetId>>,
}

impl Tag {
    pub fn new(name: Atom, revisions: Vec<FileRevisionId>) -> Self {
        Tag {
            name,
            revisions,
            resolved: Cell::new(None),
        }
    }
}
