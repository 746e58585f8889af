//! Harvest engine
//!
//! This module contains:
//! - Run phases and their allowed transitions
//! - Seed-term discovery of entity names
//! - Per-entity extraction
//! - The orchestrator that sequences a full run

mod discovery;
mod extraction;
mod orchestrator;
mod phase;

#[cfg(test)]
mod fake;

pub use discovery::{discover, Discovery, DiscoverySettings};
pub use extraction::{extract, Extraction, ExtractionPolicy};
pub use orchestrator::{run_harvest, select_candidates, Orchestrator, RunReport};
pub use phase::RunPhase;
