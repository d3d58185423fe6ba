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

//! Symbol interning.
//!
//! The real atom table (string/small-value interning so that equality
//! reduces to pointer comparison) is an external collaborator per the
//! system design — this module only states the contract an [`Atom`] must
//! satisfy, plus a reference implementation good enough to drive the rest
//! of the crate and its tests without depending on an outside interner.

use std::fmt;
use std::rc::Rc;

/// An interned string. Two `Atom`s produced by the same [`Interner`] from
/// equal strings compare equal in O(1) and are cheap to clone.
#[derive(Clone, Eq)]
pub struct Atom(Rc<str>);

impl Atom {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl std::hash::Hash for Atom {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Atom({:?})", self.0)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Atom {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Contract for the external interning facility: turn a string into an
/// [`Atom`], deduplicating so repeated values share identity.
pub trait Interner {
    fn intern(&mut self, value: &str) -> Atom;
}

/// A simple in-process interner, sufficient for tests and for any caller
/// that does not already have its own atom table.
#[derive(Default)]
pub struct SimpleInterner {
    table: std::collections::HashMap<Rc<str>, Atom>,
}

impl Interner for SimpleInterner {
    fn intern(&mut self, value: &str) -> Atom {
        if let Some(atom) = self.table.get(value) {
            return atom.clone();
        }
        let rc: Rc<str> = Rc::from(value);
        let atom = Atom(rc.clone());
        self.table.insert(rc, atom.clone());
        atom
    }
}
