//! Process-wide slot registry.
//!
//! The registry is the append-only store that assigns each distinct call
//! signature a stable integer slot, in first-registration order. It is the
//! only component with process-wide mutable state besides the dispatch
//! table cache, and the only discipline it needs is safety under concurrent
//! first-registration:
//!
//! - registering two *different* new signatures concurrently never corrupts
//!   the sequence or issues duplicate indices;
//! - registering the *same* new signature concurrently yields exactly one
//!   winner, and every caller observes that one index.
//!
//! There is no removal API. A slot, once assigned, names its signature for
//! the lifetime of the process.
//!
//! # Warm-up
//!
//! Dispatch tables snapshot the registry when they are built, so a
//! signature a backend type will serve must be registered before the first
//! instance of that type is constructed. [`prime`] registers a signature
//! ahead of any call for exactly this purpose.

use std::fmt;
use std::sync::OnceLock;

use indexmap::IndexSet;
use parking_lot::RwLock;
use rustc_hash::FxBuildHasher;
use tracing::debug;

use crate::signature::{ArgType, OpKind, SigRef, Signature};
use crate::value::ArgList;

/// The stable index assigned to one call signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(usize);

impl Slot {
    pub(crate) fn from_index(index: usize) -> Self {
        Slot(index)
    }

    /// Position of this slot in every dispatch table.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type SigSet = IndexSet<Signature, FxBuildHasher>;

/// Append-only store mapping each distinct signature to a stable [`Slot`].
#[derive(Debug)]
pub struct SlotRegistry {
    signatures: RwLock<SigSet>,
}

impl SlotRegistry {
    /// Create an empty registry.
    ///
    /// Capabilities always go through [`global`]; standalone registries
    /// exist for tests and tooling.
    pub fn new() -> Self {
        Self {
            signatures: RwLock::new(IndexSet::with_hasher(FxBuildHasher)),
        }
    }

    /// Idempotently register a signature, returning its slot.
    ///
    /// The first registration of a new signature appends it and assigns the
    /// index equal to the sequence length before the append; every later
    /// registration of the same signature returns that same slot.
    pub fn register(&self, op: OpKind, args: &[ArgType]) -> Slot {
        if let Some(index) = self.signatures.read().get_index_of(&SigRef { op, args }) {
            return Slot(index);
        }

        let mut set = self.signatures.write();
        let (index, fresh) = set.insert_full(Signature::new(op, args));
        if fresh {
            debug!(slot = index, signature = %set[index], "registered new call signature");
        }
        Slot(index)
    }

    /// Number of distinct signatures registered so far.
    pub fn len(&self) -> usize {
        self.signatures.read().len()
    }

    /// Whether no signature has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ordered copy of every signature registered so far.
    ///
    /// Dispatch tables are built from exactly one such snapshot; signatures
    /// registered afterwards do not appear in tables built from it.
    pub fn snapshot(&self) -> Vec<Signature> {
        self.signatures.read().iter().cloned().collect()
    }
}

impl Default for SlotRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide registry every capability resolves against.
pub fn global() -> &'static SlotRegistry {
    static GLOBAL: OnceLock<SlotRegistry> = OnceLock::new();
    GLOBAL.get_or_init(SlotRegistry::new)
}

/// Register a signature ahead of any call.
///
/// Dispatch tables only contain slots for signatures known when the first
/// instance of a backend type is constructed. Call sites that run late can
/// be primed at startup so every table built afterwards covers them.
///
/// ```
/// use slotcall::{registry, OpKind};
///
/// let slot = registry::prime::<(i64, f64, &str)>(OpKind::Emit);
/// assert_eq!(registry::prime::<(i64, f64, &str)>(OpKind::Emit), slot);
/// ```
pub fn prime<A: ArgList>(op: OpKind) -> Slot {
    global().register(op, A::TYPES)
}

/// One-shot slot cache for a single textual call site.
///
/// A call site's argument types never change, so its slot can be resolved
/// once and reused. The [`emit!`](crate::emit), [`emit_to!`](crate::emit_to)
/// and [`capture!`](crate::capture) macros declare one of these per
/// expansion.
pub struct CallSite {
    slot: OnceLock<Slot>,
}

impl CallSite {
    /// A site whose slot has not been resolved yet.
    pub const fn new() -> Self {
        Self {
            slot: OnceLock::new(),
        }
    }

    /// Resolve the slot through the global registry, caching the answer.
    pub fn resolve(&self, op: OpKind, args: &'static [ArgType]) -> Slot {
        *self.slot.get_or_init(|| global().register(op, args))
    }
}

impl Default for CallSite {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn registration_is_idempotent() {
        let registry = SlotRegistry::new();
        let args = [ArgType::Int, ArgType::Str];

        let first = registry.register(OpKind::Emit, &args);
        let second = registry.register(OpKind::Emit, &args);

        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn new_signatures_get_the_next_index() {
        let registry = SlotRegistry::new();

        let a = registry.register(OpKind::Emit, &[ArgType::Int]);
        let b = registry.register(OpKind::Emit, &[ArgType::Float]);
        let c = registry.register(OpKind::Capture, &[ArgType::Int]);

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(c.index(), 2);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn op_kind_is_part_of_identity() {
        let registry = SlotRegistry::new();

        let plain = registry.register(OpKind::Emit, &[ArgType::Str]);
        let targeted = registry.register(OpKind::EmitTo, &[ArgType::Str]);

        assert_ne!(plain, targeted);
    }

    #[test]
    fn snapshot_preserves_registration_order() {
        let registry = SlotRegistry::new();
        registry.register(OpKind::Emit, &[ArgType::Bool]);
        registry.register(OpKind::Capture, &[ArgType::Char, ArgType::Char]);

        let snapshot = registry.snapshot();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].op(), OpKind::Emit);
        assert_eq!(snapshot[0].args(), &[ArgType::Bool]);
        assert_eq!(snapshot[1].op(), OpKind::Capture);
        assert_eq!(snapshot[1].args(), &[ArgType::Char, ArgType::Char]);
    }

    #[test]
    fn call_site_resolves_once_and_sticks() {
        let site = CallSite::new();
        let types = <(bool, bool, char, char) as ArgList>::TYPES;

        let first = site.resolve(OpKind::Capture, types);
        let second = site.resolve(OpKind::Capture, types);

        assert_eq!(first, second);
        assert_eq!(global().register(OpKind::Capture, types), first);
    }
}
