// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Application layer — use-cases orchestrating the domain model and
//! infrastructure adapters. The Gateway is the single writer to the
//! Registry; Synthesizer and Refiner hold a Gateway handle, never a
//! repository handle directly.

pub mod contracts_table;
pub mod executor_service;
pub mod gateway;
pub mod refiner;
pub mod registry_service;
pub mod repository_factory;
pub mod schema_extraction;
pub mod synthesizer;
pub mod task_executor;
pub mod verifier;
