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

//! Author map lookup contract.
//!
//! Loading author-map files (`login = Full Name <email> [tz]` lines) is an
//! external concern, same as the rest of the master-parsing pipeline — see
//! `SPEC_FULL.md` §4.8. This module only states the read-side interface the
//! collator and emitter depend on to turn a short login into a full
//! identity.

use std::collections::HashMap;

use crate::atom::Atom;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorIdentity {
    pub full_name: Atom,
    pub email: Atom,
    pub timezone: Option<Atom>,
}

pub trait AuthorMap {
    fn resolve(&self, login: &Atom) -> Option<&AuthorIdentity>;
}

/// A simple in-memory author map, useful for tests and for callers that
/// already parsed their author file elsewhere.
#[derive(Default)]
pub struct InMemoryAuthorMap {
    table: HashMap<Atom, AuthorIdentity>,
}

impl InMemoryAuthorMap {
    pub fn insert(&mut self, login: Atom, identity: AuthorIdentity) {
        self.table.insert(login, identity);
    }
}

impl AuthorMap for InMemoryAuthorMap {
    fn resolve(&self, login: &Atom) -> Option<&AuthorIdentity> {
        self.table.get(login)
    }
}
