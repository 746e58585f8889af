//! Run phase definitions for tracking harvest progress
//!
//! This module defines every phase a run passes through and the transitions
//! allowed between them.

use crate::catalog::EntityKind;
use std::fmt;

/// Represents the current phase of a harvest run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    // ===== Setup Phases =====
    /// Verifying credentials with a canary search
    AuthCheck,

    /// Reading prior run state from the catalog
    LoadExisting,

    // ===== Remote Phases =====
    /// Paging seed terms to surface entity names
    Discover,

    /// Extracting items of discovered brands
    ExtractBrands,

    /// Extracting items of discovered restaurants
    ExtractRestaurants,

    /// Extracting items of discovered categories
    ExtractCategories,

    // ===== Closing Phases =====
    /// Writing the aggregate file and run log
    Persist,

    /// Run finished
    Done,

    /// Authentication failed; nothing was written
    Aborted,
}

impl RunPhase {
    /// Returns true if the run can make no further progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Returns the extraction phase of an entity kind
    pub fn extracting(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Brand => Self::ExtractBrands,
            EntityKind::Restaurant => Self::ExtractRestaurants,
            EntityKind::Category => Self::ExtractCategories,
        }
    }

    /// Checks whether the run may move from this phase to `next`
    ///
    /// Phases are strictly sequential. The only shortcuts are `Aborted` from
    /// `AuthCheck` and an early `Persist` from any extraction phase.
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        use RunPhase::*;

        match (*self, next) {
            (AuthCheck, LoadExisting) | (AuthCheck, Aborted) => true,
            (LoadExisting, Discover) => true,
            (Discover, ExtractBrands) => true,
            (ExtractBrands, ExtractRestaurants) => true,
            (ExtractRestaurants, ExtractCategories) => true,
            (ExtractBrands, Persist)
            | (ExtractRestaurants, Persist)
            | (ExtractCategories, Persist) => true,
            (Persist, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AuthCheck => "auth-check",
            Self::LoadExisting => "load-existing",
            Self::Discover => "discover",
            Self::ExtractBrands => "extract-brands",
            Self::ExtractRestaurants => "extract-restaurants",
            Self::ExtractCategories => "extract-categories",
            Self::Persist => "persist",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        write!(f, "{}", name)
    }
}
