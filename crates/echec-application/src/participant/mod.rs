//! Participant enrichment and the session-wide profile cache.

mod enricher;
mod lookup;

pub use enricher::{EnrichmentReport, ParticipantEnricher};
pub use lookup::{LookupGeneration, LookupPass, MergeOutcome, ParticipantLookup, Reservation};
