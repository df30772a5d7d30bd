// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0

pub mod ids;
pub mod tool;
pub mod trace;
pub mod error_report;
pub mod patch;
pub mod checkpoint;
pub mod contract;
pub mod constraints;
pub mod errors;
pub mod repository;
pub mod llm;
pub mod data_provider;
