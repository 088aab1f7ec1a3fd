//! Stable handles used to reference markets without cyclic references.
//!
//! Per SPEC_FULL.md §9 design notes, markets, pairs, and opportunities never
//! hold references to each other directly. Instead every entity carries the
//! `(venue, external_id)` pair as a handle and callers look the market up in
//! a registry when they need it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two venues this crate compares markets across.
///
/// Closed to two variants deliberately: the spec is explicitly a two-venue
/// matcher, not an open marketplace registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Venue {
    VenueA,
    VenueB,
}

impl Venue {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::VenueA => Self::VenueB,
            Self::VenueB => Self::VenueA,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VenueA => "venue_a",
            Self::VenueB => "venue_b",
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The venue-local identifier for a market, opaque outside the venue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExternalId(String);

impl ExternalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExternalId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ExternalId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// The `(venue, external_id)` identity of a `NormalizedMarket` — unique
/// within a pipeline run (SPEC_FULL.md §3 invariant).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarketHandle {
    pub venue: Venue,
    pub external_id: ExternalId,
}

impl MarketHandle {
    #[must_use]
    pub fn new(venue: Venue, external_id: impl Into<ExternalId>) -> Self {
        Self {
            venue,
            external_id: external_id.into(),
        }
    }
}

impl fmt::Display for MarketHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.venue, self.external_id)
    }
}

/// Opaque identifier for an emitted `ArbitrageOpportunity`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpportunityId(String);

impl OpportunityId {
    #[must_use]
    pub fn new(a: &MarketHandle, b: &MarketHandle) -> Self {
        // Deterministic within a run: ordered by the pair enumeration, not
        // by wall-clock, so re-running against a warm cache reproduces the
        // same id (testable property 7 — bit-identical modulo timestamps).
        Self(format!("{a}__{b}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OpportunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn venue_other_is_involutive() {
        assert_eq!(Venue::VenueA.other(), Venue::VenueB);
        assert_eq!(Venue::VenueB.other(), Venue::VenueA);
    }

    #[test]
    fn opportunity_id_is_deterministic() {
        let a = MarketHandle::new(Venue::VenueA, "m1");
        let b = MarketHandle::new(Venue::VenueB, "m2");
        assert_eq!(OpportunityId::new(&a, &b), OpportunityId::new(&a, &b));
    }
}
