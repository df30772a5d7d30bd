// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Registry (C2). Owns the on-disk tool store and delegates metadata
//! persistence to a [`ToolRepository`]. File write and row insert commit
//! together — `register` rolls back the file write if the row insert fails,
//! so the two never diverge (spec §4.2 "file on disk and DB row commit
//! together").

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::domain::repository::{RepositoryError, ToolFilter, ToolRepository};
use crate::domain::tool::{
    Capability, Category, ContentHash, SchemaTags, SemanticVersion, Tool, ToolStatus, VerificationStage,
};
use crate::domain::ids::ToolId;

use std::collections::BTreeSet;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("failed to write tool source file: {0}")]
    FileWrite(String),
}

/// Everything the Gateway needs to register a freshly-verified tool.
pub struct ToolRegistration {
    pub name: String,
    pub source_text: String,
    pub args_schema: crate::domain::tool::ArgsSchema,
    pub capabilities: BTreeSet<Capability>,
    pub category: Category,
    pub verification_stage: VerificationStage,
    pub contract_id: Option<String>,
    pub patch_of: Option<ToolId>,
}

pub struct RegistryService {
    repo: Arc<dyn ToolRepository>,
    artifacts_root: PathBuf,
}

impl RegistryService {
    pub fn new(repo: Arc<dyn ToolRepository>, artifacts_root: impl Into<PathBuf>) -> Self {
        Self { repo, artifacts_root: artifacts_root.into() }
    }

    /// `{artifacts_root}/{category_or_generated}/{name}_v{version}_{hash8}.py`
    /// (spec §4.2, §6.3). Patches share the predecessor's category
    /// directory; a freshly-classified synthesis uses "generated" until
    /// `update_schema` narrows it.
    fn file_path(&self, category_dir: &str, name: &str, version: SemanticVersion, hash: &ContentHash) -> PathBuf {
        self.artifacts_root.join(category_dir).join(format!("{name}_v{version}_{hash}.py"))
    }

    /// `register(tool_data) -> Tool` (spec §4.2). Rejects duplicate
    /// `content_hash` by returning the existing tool instead of inserting a
    /// second row — the idempotence property spec §8 requires.
    pub async fn register(&self, data: ToolRegistration) -> Result<Tool, RegistryError> {
        let content_hash = ContentHash::compute(&data.source_text);

        if let Some(existing) = self.repo.get_by_hash(&content_hash).await? {
            return Ok(existing);
        }

        let version = self.next_version(&data.name, data.patch_of.is_some()).await?;
        let category_dir = data.category.as_str();
        let file_path = self.file_path(category_dir, &data.name, version, &content_hash);

        self.write_source_file(&file_path, &data.source_text).await?;

        let now = Utc::now();
        let tool = Tool {
            id: ToolId::new(),
            name: data.name,
            semantic_version: version,
            source_text: data.source_text,
            file_path: file_path.to_string_lossy().into_owned(),
            content_hash,
            args_schema: data.args_schema,
            capabilities: data.capabilities,
            status: ToolStatus::Provisional,
            verification_stage: data.verification_stage,
            schema_tags: SchemaTags { category: Some(data.category), ..Default::default() },
            contract_id: data.contract_id,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.repo.insert(&tool).await {
            let _ = tokio::fs::remove_file(&file_path).await;
            return Err(e.into());
        }

        Ok(tool)
    }

    /// MINOR bump for a new `name`; PATCH bump when a `patch_of` relation is
    /// declared (spec §4.2, §9 resolving the bump-policy open question in
    /// favor of the spec's stated rule over the inconsistent legacy source).
    async fn next_version(&self, name: &str, is_patch: bool) -> Result<SemanticVersion, RegistryError> {
        let versions = self.repo.list_versions(name).await?;
        Ok(match versions.first() {
            None => SemanticVersion::INITIAL,
            Some(latest) if is_patch => latest.semantic_version.bump_patch(),
            Some(latest) => latest.semantic_version.bump_minor(),
        })
    }

    async fn write_source_file(&self, path: &Path, source: &str) -> Result<(), RegistryError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RegistryError::FileWrite(e.to_string()))?;
        }
        tokio::fs::write(path, source).await.map_err(|e| RegistryError::FileWrite(e.to_string()))
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Tool>, RegistryError> {
        Ok(self.repo.get_by_name(name).await?)
    }

    pub async fn get_by_hash(&self, hash: &ContentHash) -> Result<Option<Tool>, RegistryError> {
        Ok(self.repo.get_by_hash(hash).await?)
    }

    pub async fn find_by_schema(&self, filter: &ToolFilter) -> Result<Option<Tool>, RegistryError> {
        Ok(self.repo.find_by_schema(filter).await?)
    }

    pub async fn list(&self, filter: &ToolFilter) -> Result<Vec<Tool>, RegistryError> {
        Ok(self.repo.list(filter).await?)
    }

    pub async fn update_schema(&self, tool_id: ToolId, tags: SchemaTags) -> Result<(), RegistryError> {
        Ok(self.repo.update_schema_tags(tool_id, tags).await?)
    }

    pub async fn mark_status(&self, tool_id: ToolId, status: ToolStatus) -> Result<(), RegistryError> {
        Ok(self.repo.mark_status(tool_id, status).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::InMemoryToolRepository;

    fn registration(name: &str, source: &str) -> ToolRegistration {
        ToolRegistration {
            name: name.to_string(),
            source_text: source.to_string(),
            args_schema: Default::default(),
            capabilities: BTreeSet::from([Capability::CalcOnly]),
            category: Category::Calculation,
            verification_stage: VerificationStage::ContractValid,
            contract_id: Some("calc_ma".to_string()),
            patch_of: None,
        }
    }

    #[tokio::test]
    async fn register_writes_source_file_and_row_together() {
        let dir = tempfile::tempdir().unwrap();
        let service = RegistryService::new(Arc::new(InMemoryToolRepository::new()), dir.path());
        let tool = service.register(registration("calc_ma", "def f(): return 1")).await.unwrap();
        let contents = tokio::fs::read_to_string(&tool.file_path).await.unwrap();
        assert_eq!(contents, "def f(): return 1");
    }

    #[tokio::test]
    async fn duplicate_content_hash_returns_existing_tool_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let service = RegistryService::new(Arc::new(InMemoryToolRepository::new()), dir.path());
        let first = service.register(registration("calc_ma", "def f(): return 1")).await.unwrap();
        let second = service.register(registration("calc_ma_dup", "def f(): return 1")).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn second_registration_under_same_name_bumps_minor() {
        let dir = tempfile::tempdir().unwrap();
        let service = RegistryService::new(Arc::new(InMemoryToolRepository::new()), dir.path());
        let a = service.register(registration("calc_ma", "def f(): return 1")).await.unwrap();
        let b = service.register(registration("calc_ma", "def f(): return 2")).await.unwrap();
        assert_eq!(a.semantic_version, SemanticVersion::INITIAL);
        assert_eq!(b.semantic_version, SemanticVersion::INITIAL.bump_minor());
    }

    #[tokio::test]
    async fn patch_relation_bumps_patch_not_minor() {
        let dir = tempfile::tempdir().unwrap();
        let service = RegistryService::new(Arc::new(InMemoryToolRepository::new()), dir.path());
        let base = service.register(registration("calc_ma", "def f(): return 1")).await.unwrap();
        let mut patch_reg = registration("calc_ma", "def f(): return 2");
        patch_reg.patch_of = Some(base.id);
        let patched = service.register(patch_reg).await.unwrap();
        assert_eq!(patched.semantic_version, base.semantic_version.bump_patch());
    }
}
