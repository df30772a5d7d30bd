// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Tool
//!
//! The central aggregate: a registered, verified unit of executable logic.
//! Identity is `(name, semantic_version)`; content is addressed by
//! SHA-256(source) truncated to 8 hex chars. A tool is never mutated in
//! place — repair produces a new row with a bumped PATCH version and a
//! [`crate::domain::patch::ToolPatch`] edge to the predecessor.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::ids::ToolId;

/// `MAJOR.MINOR.PATCH`, ASCII dotted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SemanticVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SemanticVersion {
    pub const INITIAL: SemanticVersion = SemanticVersion { major: 0, minor: 1, patch: 0 };

    pub fn bump_minor(self) -> Self {
        Self { major: self.major, minor: self.minor + 1, patch: 0 }
    }

    pub fn bump_patch(self) -> Self {
        Self { major: self.major, minor: self.minor, patch: self.patch + 1 }
    }

    pub fn bump_major(self) -> Self {
        Self { major: self.major + 1, minor: 0, patch: 0 }
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid semantic version: {0}")]
pub struct SemanticVersionParseError(String);

impl FromStr for SemanticVersion {
    type Err = SemanticVersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(SemanticVersionParseError(s.to_string()));
        }
        let parse = |p: &str| p.parse::<u32>().map_err(|_| SemanticVersionParseError(s.to_string()));
        Ok(Self {
            major: parse(parts[0])?,
            minor: parse(parts[1])?,
            patch: parse(parts[2])?,
        })
    }
}

/// SHA-256 of source text, truncated to 8 hex chars, as embedded in filenames.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    pub fn compute(source: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        let digest = hasher.finalize();
        Self(hex::encode(digest)[..8].to_string())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse permission tag attached to a tool, gating which modules the AST
/// check allows for its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Capability {
    CalcOnly,
    NetworkRead,
    FileWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolStatus {
    Provisional,
    Verified,
    Deprecated,
    Failed,
}

/// Highest verification stage a tool has passed, ordered so that
/// `verification_stage >= ContractValid` is directly expressible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VerificationStage {
    AstSecurity,
    SelfTest,
    ContractValid,
    Integration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Fetch,
    Calculation,
    Composite,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Fetch => "fetch",
            Category::Calculation => "calculation",
            Category::Composite => "composite",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `(category, indicator, data_type, input_requirements)` stored with each
/// Tool, used for structured lookup by [`crate::application::registry_service`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaTags {
    pub category: Option<Category>,
    pub indicator: Option<String>,
    pub data_type: Option<String>,
    pub input_requirements: Vec<String>,
}

/// Parameter name -> type tag, e.g. `{"prices": "list[float]"}`.
pub type ArgsSchema = HashMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub id: ToolId,
    pub name: String,
    pub semantic_version: SemanticVersion,
    pub source_text: String,
    pub file_path: String,
    pub content_hash: ContentHash,
    pub args_schema: ArgsSchema,
    pub capabilities: BTreeSet<Capability>,
    pub status: ToolStatus,
    pub verification_stage: VerificationStage,
    pub schema_tags: SchemaTags,
    pub contract_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tool {
    /// `capabilities subseteq allowed-for-category` (spec invariant).
    pub fn capabilities_allowed_for(&self, allowed: &BTreeSet<Capability>) -> bool {
        self.capabilities.is_subset(allowed)
    }

    /// `content_hash` matches `sha256(source_text)[:8]` — spec invariant #1.
    pub fn content_hash_matches_source(&self) -> bool {
        ContentHash::compute(&self.source_text) == self.content_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_bump_policy() {
        let v = SemanticVersion::INITIAL;
        assert_eq!(v.bump_minor().to_string(), "0.2.0");
        assert_eq!(v.bump_patch().to_string(), "0.1.1");
        assert_eq!(v.bump_major().to_string(), "1.0.0");
    }

    #[test]
    fn version_round_trips_through_display_and_parse() {
        let v = SemanticVersion { major: 1, minor: 2, patch: 3 };
        assert_eq!(v.to_string().parse::<SemanticVersion>().unwrap(), v);
    }

    #[test]
    fn content_hash_is_deterministic() {
        let a = ContentHash::compute("def f(): pass");
        let b = ContentHash::compute("def f(): pass");
        assert_eq!(a, b);
        assert_eq!(a.0.len(), 8);
    }

    #[test]
    fn content_hash_changes_with_source() {
        let a = ContentHash::compute("def f(): pass");
        let b = ContentHash::compute("def g(): pass");
        assert_ne!(a, b);
    }
}
