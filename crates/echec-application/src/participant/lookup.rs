use echec_core::participant::ParticipantProfile;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;

/// Identity epoch of the lookup.
///
/// Every change of signed-in identity advances the generation. Fetches carry
/// the generation they were scheduled under, and completions tagged with an
/// older one are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LookupGeneration(u64);

impl LookupGeneration {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Owner of the reservations taken by one enrichment pass.
///
/// Reservations stay in flight only while their pass is alive. When the pass
/// is dropped without finishing (its future was dropped or aborted), the
/// next pass may take them over.
#[derive(Debug, Default)]
pub struct LookupPass {
    owner: Arc<()>,
}

impl LookupPass {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Result of asking to fetch an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// The caller now owns the fetch for this identifier.
    Acquired,
    /// A profile is already cached.
    Cached,
    /// A live pass is still fetching this identifier.
    InFlight,
    /// The generation is no longer current.
    Stale,
}

/// Result of merging a fetched profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    /// An entry already existed; the earlier write is kept.
    Duplicate,
    /// The generation is no longer current; nothing was written.
    Stale,
}

#[derive(Debug, Default)]
struct LookupTable {
    generation: u64,
    entries: HashMap<String, ParticipantProfile>,
    in_flight: HashMap<String, Weak<()>>,
}

/// Session-wide cache of participant profiles keyed by user identifier.
///
/// Entries are append-only and the first successful write for a key wins,
/// so concurrent merges commute. The only way to drop entries is
/// [`ParticipantLookup::advance_generation`] with `clear = true`.
#[derive(Debug, Default)]
pub struct ParticipantLookup {
    table: RwLock<LookupTable>,
}

impl ParticipantLookup {
    /// Creates an empty lookup at generation zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn generation(&self) -> LookupGeneration {
        LookupGeneration(self.table.read().await.generation)
    }

    /// Starts a new identity epoch.
    ///
    /// Outstanding reservations are forgotten; their completions will be
    /// reported as stale. With `clear` every cached profile is dropped too.
    pub async fn advance_generation(&self, clear: bool) -> LookupGeneration {
        let mut table = self.table.write().await;
        table.generation += 1;
        table.in_flight.clear();
        if clear {
            tracing::debug!(
                "[ParticipantLookup] Clearing {} cached profiles",
                table.entries.len()
            );
            table.entries.clear();
        }
        LookupGeneration(table.generation)
    }

    /// Claims the fetch for `participant_id` on behalf of `pass`, unless it
    /// is cached or a live pass is already fetching it.
    pub async fn reserve(
        &self,
        pass: &LookupPass,
        generation: LookupGeneration,
        participant_id: &str,
    ) -> Reservation {
        let mut table = self.table.write().await;
        if table.generation != generation.0 {
            return Reservation::Stale;
        }
        if table.entries.contains_key(participant_id) {
            return Reservation::Cached;
        }
        if let Some(owner) = table.in_flight.get(participant_id) {
            if owner.strong_count() > 0 {
                return Reservation::InFlight;
            }
            tracing::debug!(
                "[ParticipantLookup] Taking over orphaned reservation for '{}'",
                participant_id
            );
        }
        table
            .in_flight
            .insert(participant_id.to_string(), Arc::downgrade(&pass.owner));
        Reservation::Acquired
    }

    /// Gives up a reservation without writing an entry (profile missing,
    /// fetch failed or cancelled). Stale generations are ignored.
    pub async fn release(&self, generation: LookupGeneration, participant_id: &str) {
        let mut table = self.table.write().await;
        if table.generation == generation.0 {
            table.in_flight.remove(participant_id);
        }
    }

    /// Completes a reservation with a fetched profile.
    pub async fn merge(
        &self,
        generation: LookupGeneration,
        participant_id: &str,
        profile: ParticipantProfile,
    ) -> MergeOutcome {
        let mut table = self.table.write().await;
        if table.generation != generation.0 {
            return MergeOutcome::Stale;
        }
        table.in_flight.remove(participant_id);
        if table.entries.contains_key(participant_id) {
            return MergeOutcome::Duplicate;
        }
        table.entries.insert(participant_id.to_string(), profile);
        MergeOutcome::Inserted
    }

    pub async fn get(&self, participant_id: &str) -> Option<ParticipantProfile> {
        self.table.read().await.entries.get(participant_id).cloned()
    }

    pub async fn contains(&self, participant_id: &str) -> bool {
        self.table.read().await.entries.contains_key(participant_id)
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.read().await.entries.is_empty()
    }

    /// Number of identifiers currently being fetched by a live pass.
    pub async fn in_flight(&self) -> usize {
        self.table
            .read()
            .await
            .in_flight
            .values()
            .filter(|owner| owner.strong_count() > 0)
            .count()
    }

    /// Copy of all cached entries, for joining against summaries.
    pub async fn snapshot(&self) -> HashMap<String, ParticipantProfile> {
        self.table.read().await.entries.clone()
    }
}
