//! Self-describing resource identifiers and the allocator that mints them.
//!
//! An [`Ident`] is a kind tag followed by a decimal sequence number
//! (`ET3`, `E17`, `T2`, `A40`). No two kinds can produce the same string,
//! so identifiers stay unique even if collections share a backing store.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The resource namespaces that receive identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentKind {
    /// Event schema.
    EventType,
    /// Posted event instance.
    Event,
    /// Registered trigger.
    Trigger,
    /// Generated alert.
    Alert,
}

impl IdentKind {
    /// Every kind.
    pub const ALL: [Self; 4] = [Self::EventType, Self::Event, Self::Trigger, Self::Alert];

    /// Prefix written in front of the sequence number.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::EventType => "ET",
            Self::Event => "E",
            Self::Trigger => "T",
            Self::Alert => "A",
        }
    }
}

impl fmt::Display for IdentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EventType => "event type",
            Self::Event => "event",
            Self::Trigger => "trigger",
            Self::Alert => "alert",
        };
        f.write_str(name)
    }
}

/// Identifier of a stored resource.
///
/// Serialized as a bare string. Identifiers coming from clients are not
/// required to be well formed; [`Ident::sequence`] only succeeds for ids
/// minted by an [`IdentAllocator`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct Ident(String);

impl Ident {
    /// Wraps an arbitrary string as an identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the empty identifier.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Returns the sequence number if this identifier was minted for `kind`.
    #[must_use]
    pub fn sequence(&self, kind: IdentKind) -> Option<u64> {
        let digits = self.0.strip_prefix(kind.prefix())?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Ident {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Ident {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Ident {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Mints monotonically increasing identifiers, one counter per kind.
///
/// Constructed once at startup and shared by every service that creates
/// resources. Each allocation is a single atomic increment, so concurrent
/// callers never observe the same value.
#[derive(Debug, Default)]
pub struct IdentAllocator {
    counters: [AtomicU64; 4],
}

impl IdentAllocator {
    /// Creates an allocator whose first identifier for each kind is `1`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next identifier for `kind`.
    pub fn next(&self, kind: IdentKind) -> Ident {
        let n = self.counter(kind).fetch_add(1, Ordering::SeqCst).saturating_add(1);
        Ident(format!("{}{n}", kind.prefix()))
    }

    /// Advances the counter for `kind` past an identifier that already exists.
    ///
    /// Identifiers of another kind or not minted by an allocator are ignored.
    pub fn observe(&self, kind: IdentKind, id: &Ident) {
        if let Some(n) = id.sequence(kind) {
            self.counter(kind).fetch_max(n, Ordering::SeqCst);
        }
    }

    fn counter(&self, kind: IdentKind) -> &AtomicU64 {
        let [event_type, event, trigger, alert] = &self.counters;
        match kind {
            IdentKind::EventType => event_type,
            IdentKind::Event => event,
            IdentKind::Trigger => trigger,
            IdentKind::Alert => alert,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    #[test]
    fn next_is_prefixed_and_monotonic() {
        let alloc = IdentAllocator::new();
        assert_eq!(alloc.next(IdentKind::Trigger).as_str(), "T1");
        assert_eq!(alloc.next(IdentKind::Trigger).as_str(), "T2");
        assert_eq!(alloc.next(IdentKind::EventType).as_str(), "ET1");
        assert_eq!(alloc.next(IdentKind::Event).as_str(), "E1");
        assert_eq!(alloc.next(IdentKind::Alert).as_str(), "A1");
    }

    #[test]
    fn sequence_rejects_other_kinds() {
        let id = Ident::from("ET12");
        assert_eq!(id.sequence(IdentKind::EventType), Some(12));
        // "ET12" starts with "E" but "T12" is not a number
        assert_eq!(id.sequence(IdentKind::Event), None);
        assert_eq!(Ident::from("E").sequence(IdentKind::Event), None);
        assert_eq!(Ident::from("nosuch").sequence(IdentKind::Alert), None);
    }

    #[test]
    fn observe_skips_past_existing_ids() {
        let alloc = IdentAllocator::new();
        alloc.observe(IdentKind::Alert, &Ident::from("A41"));
        alloc.observe(IdentKind::Alert, &Ident::from("A7"));
        alloc.observe(IdentKind::Alert, &Ident::from("T99"));
        assert_eq!(alloc.next(IdentKind::Alert).as_str(), "A42");
        assert_eq!(alloc.next(IdentKind::Trigger).as_str(), "T1");
    }

    #[test]
    fn concurrent_allocations_never_collide() {
        let alloc = Arc::new(IdentAllocator::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let alloc = Arc::clone(&alloc);
            handles.push(std::thread::spawn(move || {
                (0..500)
                    .map(|_| alloc.next(IdentKind::Event))
                    .collect::<Vec<_>>()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            let Ok(ids) = handle.join() else {
                panic!("allocator thread panicked");
            };
            for id in ids {
                assert!(seen.insert(id), "duplicate identifier");
            }
        }
        assert_eq!(seen.len(), 4000);
    }

    #[test]
    fn serde_is_transparent() {
        let id = Ident::from("T5");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"T5\"");
    }
}
