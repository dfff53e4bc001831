//! Version-stamped counter ledger.
//!
//! A ledger merges three sources of truth for a family of per-key counters:
//!
//! * **fetches**: authoritative snapshots from the backend, each stamped with
//!   a [`FetchTicket`] taken *before* the request went out;
//! * **events**: live increments from the socket, admitted only when they
//!   arrive after the last applied fetch was issued and de-duplicated by id;
//! * **overlays**: pending optimistic commands (mark-read) that zero one key
//!   or every key until the backend confirms or rejects them.
//!
//! The displayed count of a key is derived from those three on every read,
//! so applying them in any order yields the same result.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// How many admitted event ids are remembered for de-duplication.
pub const SEEN_EVENT_CAP: usize = 1024;

/// How a ledger counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerMode {
    /// Any count per key (unread messages per conversation).
    Tally,
    /// Each key counts at most once (one notification, one order).
    Flag,
}

/// Stamp taken before a fetch is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    issued_at: DateTime<Utc>,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The snapshot replaced the base counts.
    Applied,
    /// A newer fetch was already applied; the snapshot was discarded.
    Stale,
}

/// Identifies one pending optimistic command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId(Uuid);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// What an optimistic command zeroes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope<K> {
    Key(K),
    All,
}

impl<K: PartialEq> Scope<K> {
    fn covers(&self, key: &K) -> bool {
        match self {
            Scope::Key(k) => k == key,
            Scope::All => true,
        }
    }
}

#[derive(Debug, Clone)]
struct LoggedEvent<K> {
    key: K,
    at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct Overlay<K> {
    scope: Scope<K>,
    issued_at: DateTime<Utc>,
    pre_image: u32,
}

#[derive(Debug, Clone)]
pub struct CounterLedger<K> {
    mode: LedgerMode,
    base: HashMap<K, u32>,
    events: Vec<LoggedEvent<K>>,
    overlays: HashMap<CommandId, Overlay<K>>,
    /// Admitted event ids, oldest first. Survives pruning of `events`.
    seen: SeenIds,
    next_seq: u64,
    applied_seq: Option<u64>,
    as_of: Option<DateTime<Utc>>,
}

impl<K> CounterLedger<K>
where
    K: Clone + Eq + Hash,
{
    pub fn new(mode: LedgerMode) -> Self {
        Self {
            mode,
            base: HashMap::new(),
            events: Vec::new(),
            overlays: HashMap::new(),
            seen: SeenIds::default(),
            next_seq: 0,
            applied_seq: None,
            as_of: None,
        }
    }

    pub fn mode(&self) -> LedgerMode {
        self.mode
    }

    /// Issue time of the last applied fetch.
    pub fn as_of(&self) -> Option<DateTime<Utc>> {
        self.as_of
    }

    pub fn pending_commands(&self) -> usize {
        self.overlays.len()
    }

    // -----------------------------------------------------------------------
    // Fetches
    // -----------------------------------------------------------------------

    pub fn begin_fetch(&mut self, now: DateTime<Utc>) -> FetchTicket {
        let seq = self.next_seq;
        self.next_seq += 1;
        FetchTicket {
            seq,
            issued_at: now,
        }
    }

    /// Replace the base counts with `snapshot` unless a newer fetch won.
    ///
    /// Logged events at or before the ticket's issue time are covered by the
    /// snapshot and dropped; later ones stay on top of the new base.
    pub fn apply_fetch<I>(&mut self, ticket: FetchTicket, snapshot: I) -> FetchOutcome
    where
        I: IntoIterator<Item = (K, u32)>,
    {
        if self.applied_seq.is_some_and(|applied| ticket.seq <= applied) {
            return FetchOutcome::Stale;
        }

        self.base = snapshot
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(key, count)| (key, self.clamp(count)))
            .collect();
        self.applied_seq = Some(ticket.seq);
        self.as_of = Some(ticket.issued_at);
        self.events.retain(|e| e.at > ticket.issued_at);

        FetchOutcome::Applied
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Admit a live increment for `key`. Returns whether it counted.
    pub fn record_event(&mut self, key: K, event_id: &str, at: DateTime<Utc>) -> bool {
        if self.as_of.is_some_and(|as_of| at <= as_of) {
            return false;
        }
        if self.seen.contains(event_id) {
            return false;
        }
        if self.mode == LedgerMode::Flag
            && (self.base.contains_key(&key) || self.events.iter().any(|e| e.key == key))
        {
            return false;
        }

        self.seen.insert(event_id);
        self.events.push(LoggedEvent {
            key,
            at,
        });
        true
    }

    // -----------------------------------------------------------------------
    // Optimistic commands
    // -----------------------------------------------------------------------

    /// Start an optimistic command. Scoped counts read as zero from here on.
    pub fn begin_command(&mut self, scope: Scope<K>, now: DateTime<Utc>) -> CommandId {
        let pre_image = match &scope {
            Scope::Key(key) => self.count(key),
            Scope::All => self.total(),
        };
        let id = CommandId(Uuid::new_v4());
        self.overlays.insert(
            id,
            Overlay {
                scope,
                issued_at: now,
                pre_image,
            },
        );
        id
    }

    /// The backend confirmed the command. Returns its pre-image.
    pub fn commit(&mut self, id: CommandId) -> Option<u32> {
        let overlay = self.overlays.remove(&id)?;

        // A fetch issued after the command already reflects it.
        if self.as_of.map_or(true, |as_of| as_of < overlay.issued_at) {
            match &overlay.scope {
                Scope::Key(key) => {
                    self.base.remove(key);
                }
                Scope::All => self.base.clear(),
            }
            self.events
                .retain(|e| e.at > overlay.issued_at || !overlay.scope.covers(&e.key));
        }

        Some(overlay.pre_image)
    }

    /// The backend rejected the command. Returns its pre-image.
    pub fn rollback(&mut self, id: CommandId) -> Option<u32> {
        self.overlays.remove(&id).map(|o| o.pre_image)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn count(&self, key: &K) -> u32 {
        let cutoff = self
            .overlays
            .values()
            .filter(|o| o.scope.covers(key))
            .map(|o| o.issued_at)
            .max();

        let events = self
            .events
            .iter()
            .filter(|e| &e.key == key && cutoff.map_or(true, |c| e.at > c))
            .count() as u32;

        let raw = match cutoff {
            Some(_) => events,
            None => self.base.get(key).copied().unwrap_or(0) + events,
        };
        self.clamp(raw)
    }

    pub fn total(&self) -> u32 {
        let keys: HashSet<&K> = self
            .base
            .keys()
            .chain(self.events.iter().map(|e| &e.key))
            .collect();
        keys.into_iter().map(|k| self.count(k)).sum()
    }

    /// Forget everything, e.g. on logout. Ticket numbering keeps going so
    /// fetches issued before the reset stay stale.
    pub fn reset(&mut self) {
        self.base.clear();
        self.events.clear();
        self.overlays.clear();
        self.seen.clear();
        self.applied_seq = self.next_seq.checked_sub(1);
        self.as_of = None;
    }

    fn clamp(&self, count: u32) -> u32 {
        match self.mode {
            LedgerMode::Tally => count,
            LedgerMode::Flag => count.min(1),
        }
    }
}

/// Insertion-ordered set of event ids, capped at [`SEEN_EVENT_CAP`].
#[derive(Debug, Clone, Default)]
struct SeenIds {
    ids: HashSet<String>,
    order: VecDeque<String>,
}

impl SeenIds {
    fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    fn insert(&mut self, id: &str) {
        if !self.ids.insert(id.to_string()) {
            return;
        }
        self.order.push_back(id.to_string());
        while self.order.len() > SEEN_EVENT_CAP {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
    }

    fn clear(&mut self) {
        self.ids.clear();
        self.order.clear();
    }
}
