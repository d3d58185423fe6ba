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

//! The diagnostic channel anomalies are routed through: logs via `tracing`
//! and keeps the counts the caller is owed at the end of a run.

use std::collections::HashMap;

use crate::error::Anomaly;

/// Accumulates anomalies raised during a collation run. Anomalies never
/// abort the run (see `error::CollateError` for what does); this sink is
/// how "the final count is surfaced to the caller" is implemented.
#[derive(Default)]
pub struct Diagnostics {
    counts: HashMap<&'static str, u32>,
    log: Vec<Anomaly>,
}

impl Diagnostics {
    pub fn record(&mut self, anomaly: Anomaly) {
        tracing::warn!(kind = anomaly.kind_name(), "{anomaly}");
        *self.counts.entry(anomaly.kind_name()).or_insert(0) += 1;
        self.log.push(anomaly);
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn count(&self, kind: &str) -> u32 {
        self.counts.get(kind).copied().unwrap_or(0)
    }

    pub fn all(&self) -> &[Anomaly] {
        &self.log
    }
}

impl Anomaly {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Anomaly::TipOlderThanBirth { .. } => "TipOlderThanBirth",
            Anomaly::BranchPointLaterThanBranch { .. } => "BranchPointLaterThanBranch",
            Anomaly::BranchPointMatchedByDate { .. } => "BranchPointMatchedByDate",
            Anomaly::BranchPointNotFound { .. } => "BranchPointNotFound",
            Anomaly::TagPointsAtNoGitspace { .. } => "TagPointsAtNoGitspace",
            Anomaly::LostTag { .. } => "LostTag",
            Anomaly::DuplicateGitspaceAssignment => "DuplicateGitspaceAssignment",
            Anomaly::ParentDateAfterChildDate { .. } => "ParentDateAfterChildDate",
        }
    }
}
