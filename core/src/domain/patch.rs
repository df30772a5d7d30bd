// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! ToolPatch — a repair edge linking a failed base tool to the error report
//! that drove the repair and (on success) the resulting tool.

use serde::{Deserialize, Serialize};

use crate::domain::ids::{ErrorReportId, PatchId, ToolId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolPatch {
    pub patch_id: PatchId,
    pub error_report_id: ErrorReportId,
    pub base_tool_id: ToolId,
    pub resulting_tool_id: Option<ToolId>,
    /// Short tag describing the repair strategy, e.g. "import-replacement".
    pub approach: String,
    /// `None` when the patch was accepted by the Gateway.
    pub failure_reason: Option<String>,
}

impl ToolPatch {
    pub fn succeeded(&self) -> bool {
        self.failure_reason.is_none() && self.resulting_tool_id.is_some()
    }
}
