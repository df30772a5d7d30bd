// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! ErrorReport — an analyzed failure, feeding the Refiner (C9).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::ErrorKind;
use crate::domain::ids::{ErrorReportId, TraceId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub error_report_id: ErrorReportId,
    pub trace_id: TraceId,
    pub error_kind: ErrorKind,
    /// Extracted from the model's `text_response`, falling back to
    /// `reasoning_trace`, truncated to 2000 chars (spec §4.8).
    pub root_cause: String,
    pub created_at: DateTime<Utc>,
}

impl ErrorReport {
    pub const ROOT_CAUSE_MAX_CHARS: usize = 2000;

    pub fn new(trace_id: TraceId, error_kind: ErrorKind, root_cause: impl Into<String>) -> Self {
        let mut root_cause = root_cause.into();
        if root_cause.len() > Self::ROOT_CAUSE_MAX_CHARS {
            root_cause.truncate(Self::ROOT_CAUSE_MAX_CHARS);
        }
        Self {
            error_report_id: ErrorReportId::new(),
            trace_id,
            error_kind,
            root_cause,
            created_at: Utc::now(),
        }
    }
}
