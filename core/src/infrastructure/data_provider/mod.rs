// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Market-data access. The concrete production client is out of scope
//! (spec Non-goals); what lives here is the record-replay cache wrapper
//! (spec §6.3) and a deterministic synthetic sample generator used to
//! bootstrap self-tests and the Verifier's integration stage.

pub mod cached;
pub mod sample;

pub use cached::CachedDataProvider;
pub use sample::DeterministicSampleProvider;
