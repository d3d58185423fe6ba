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

//! The two-tier error taxonomy: fatal errors that abort the run, and
//! anomalies that are logged and counted while collation continues.

use thiserror::Error;

use crate::atom::Atom;

/// Fatal: the run cannot produce a meaningful result and aborts.
#[derive(Debug, Error)]
pub enum CollateError {
    #[error("branch cycle detected while topologically sorting output branches")]
    BranchCycle,
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolated(String),
}

pub type CollateResult<T> = Result<T, CollateError>;

/// Anomaly: logged, counted, collation continues.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Anomaly {
    #[error("branch {branch}: tip commit is older than the branch's imputed birth date")]
    TipOlderThanBirth { branch: String },

    #[error("branch point {child} -> {parent} is later than the branch it joins")]
    BranchPointLaterThanBranch { child: String, parent: String },

    #[error("branch point {child} -> {parent} matched by date, not by revision set")]
    BranchPointMatchedByDate { child: String, parent: String },

    #[error("branch point for {child} not found{possible_match}")]
    BranchPointNotFound {
        child: String,
        possible_match: PossibleMatchHint,
    },

    #[error("tag {tag} points at a commit with no gitspace link")]
    TagPointsAtNoGitspace { tag: String },

    #[error("lost tag {tag}: could not be resolved or synthesized")]
    LostTag { tag: String },

    #[error("file revision allocated to multiple changesets (first writer wins)")]
    DuplicateGitspaceAssignment,

    #[error("commit emitted with a parent dated after it: {commit} after {parent}")]
    ParentDateAfterChildDate { commit: String, parent: String },
}

/// Formats as nothing when absent, or `" (possible match on branch X)"` when
/// present — kept as its own `Display` impl so `Anomaly`'s derive stays a
/// plain `#[error("...")]` format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PossibleMatchHint(pub Option<String>);

impl std::fmt::Display for PossibleMatchHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(branch) => write!(f, " (possible match on branch {branch})"),
            None => Ok(()),
        }
    }
}

impl Anomaly {
    pub fn branch_point_not_found(child: &Atom, possible_match: Option<&Atom>) -> Self {
        Anomaly::BranchPointNotFound {
            child: child.to_string(),
            possible_match: PossibleMatchHint(possible_match.map(|a| a.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_point_not_found_hint_is_included_only_when_present() {
        let without = Anomaly::BranchPointNotFound {
            child: "b1".into(),
            possible_match: PossibleMatchHint(None),
        };
        assert_eq!(
            without.to_string(),
            "branch point for b1 not found"
        );

        let with = Anomaly::BranchPointNotFound {
            child: "b1".into(),
            possible_match: PossibleMatchHint(Some("b2".into())),
        };
        assert_eq!(
            with.to_string(),
            "branch point for b1 not found (possible match on branch b2)"
        );
    }
}
