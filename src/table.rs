//! Invoker synthesis and per-type dispatch tables.
//!
//! A dispatch table is the per-backend-type array of invokers, one per slot
//! the registry knew when the table was built. Construction is lazy (the
//! first [`Capability::new`](crate::Capability::new) for a backend type
//! builds its table) and memoized for the remainder of the process, keyed
//! by `TypeId`, so every instance of a type shares one table.
//!
//! # Snapshot semantics
//!
//! A table only contains slots for signatures registered up to the moment
//! it was built. A signature first registered afterwards is *not*
//! retroactively added; dispatching through it is out of contract and
//! panics at the call site (see [`Capability`](crate::Capability)).
//!
//! # Construction-time failure
//!
//! Synthesis asks the backend type whether it implements each registered
//! signature. A rejection aborts the whole build with
//! [`TableError::MissingOperation`]; a partial table is never published.

use std::any::{type_name, Any, TypeId};
use std::io;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

use crate::backend::Backend;
use crate::registry::{self, Slot};
use crate::signature::{OpKind, Signature};
use crate::value::Value;

/// Errors raised while building a dispatch table.
#[derive(Debug, Error)]
pub enum TableError {
    /// The backend type lacks an implementation for a registered signature.
    #[error("`{backend}` has no implementation for `{signature}` (slot {slot})")]
    MissingOperation {
        /// Type name of the backend whose table was being built.
        backend: &'static str,
        /// The signature the backend rejected.
        signature: Signature,
        /// The slot that signature occupies in the registry.
        slot: Slot,
    },
}

/// Ephemeral carrier of one call's actual arguments.
///
/// Built by the capability per call and dropped when the call returns;
/// never stored or copied beyond that call.
pub struct Bundle<'a> {
    values: Vec<Value>,
    target: Option<&'a mut dyn io::Write>,
}

impl<'a> Bundle<'a> {
    /// Bundle for a plain or materializing call.
    pub fn plain(values: Vec<Value>) -> Self {
        Self {
            values,
            target: None,
        }
    }

    /// Bundle for a targeted call, with its fixed leading destination.
    pub fn targeted(values: Vec<Value>, target: &'a mut dyn io::Write) -> Self {
        Self {
            values,
            target: Some(target),
        }
    }

    /// The trailing argument values, in call order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Take the destination out of the bundle.
    ///
    /// Panics if the bundle was not built for a targeted call. Slot
    /// resolution and bundle construction derive from the same call site,
    /// so a mismatch here is a bug in the dispatch plumbing, not a runtime
    /// condition.
    pub fn take_target(&mut self) -> &'a mut dyn io::Write {
        self.target
            .take()
            .expect("targeted invoker called without a destination")
    }
}

/// Ephemeral output location for a materializing call.
#[derive(Debug, Default)]
pub struct ResultSlot {
    value: Option<Value>,
}

impl ResultSlot {
    /// An empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the materialized value. Exactly one store per call.
    pub fn set(&mut self, value: Value) {
        debug_assert!(self.value.is_none(), "result slot written twice");
        self.value = Some(value);
    }

    /// Take the materialized value out of the slot.
    pub fn take(&mut self) -> Option<Value> {
        self.value.take()
    }
}

/// Opaque callable bridging a generic call to one backend's implementation.
///
/// The receiver is the capability's type-erased backend; the invoker
/// downcasts it to the concrete type it was synthesized against, which is
/// legal because a table for `T` only ever holds invokers synthesized
/// against `T`.
pub type Invoker =
    Box<dyn Fn(&dyn Any, &mut Bundle<'_>, Option<&mut ResultSlot>) -> io::Result<()> + Send + Sync>;

/// Synthesize the invoker binding `signature` to `T`'s implementation.
fn synthesize<T: Backend>(signature: &Signature, slot: Slot) -> Result<Invoker, TableError> {
    if !T::supports(signature) {
        return Err(TableError::MissingOperation {
            backend: type_name::<T>(),
            signature: signature.clone(),
            slot,
        });
    }

    let op = signature.op();
    Ok(Box::new(move |receiver, bundle, ret| {
        let backend = receiver
            .downcast_ref::<T>()
            .expect("invoker called with a receiver of a foreign backend type");
        match op {
            OpKind::Emit => backend.emit(bundle.values()),
            OpKind::EmitTo => {
                let out = bundle.take_target();
                backend.emit_to(out, bundle.values())
            }
            OpKind::Capture => {
                let ret = ret.expect("materializing invoker called without a result slot");
                ret.set(Value::Str(backend.capture(bundle.values())));
                Ok(())
            }
        }
    }))
}

/// Per-backend-type array of invokers indexed by slot.
///
/// Immutable once built; shared by every instance of the backend type.
pub struct DispatchTable {
    backend: &'static str,
    entries: Vec<Invoker>,
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchTable")
            .field("backend", &self.backend)
            .field("slots", &self.entries.len())
            .finish()
    }
}

impl DispatchTable {
    fn build<T: Backend>() -> Result<Self, TableError> {
        let backend = type_name::<T>();
        let signatures = registry::global().snapshot();

        let mut entries = Vec::with_capacity(signatures.len());
        for (index, signature) in signatures.iter().enumerate() {
            entries.push(synthesize::<T>(signature, Slot::from_index(index))?);
        }

        debug!(backend, slots = entries.len(), "dispatch table built");
        Ok(Self { backend, entries })
    }

    /// The invoker bound at `slot`, if the slot predates this table.
    pub fn invoker(&self, slot: Slot) -> Option<&Invoker> {
        self.entries.get(slot.index())
    }

    /// Number of slots this table was built with.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table was built before any signature was registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Type name of the backend this table was synthesized against.
    pub fn backend_name(&self) -> &'static str {
        self.backend
    }
}

type TableMap = FxHashMap<TypeId, Arc<DispatchTable>>;

fn cache() -> &'static RwLock<TableMap> {
    static TABLES: OnceLock<RwLock<TableMap>> = OnceLock::new();
    TABLES.get_or_init(|| RwLock::new(TableMap::default()))
}

/// The memoized dispatch table for `T`, building it on first use.
///
/// Under concurrent first construction at most one build wins; every caller
/// observes the same finished table, never a partial one. A failed build is
/// not memoized, but the failure does not change with retries, since the
/// missing operation has to be fixed in the backend itself.
pub fn lookup<T: Backend>() -> Result<Arc<DispatchTable>, TableError> {
    let key = TypeId::of::<T>();
    if let Some(table) = cache().read().get(&key) {
        return Ok(Arc::clone(table));
    }

    let built = Arc::new(DispatchTable::build::<T>()?);
    let mut map = cache().write();
    Ok(Arc::clone(map.entry(key).or_insert(built)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::ArgType;
    use crate::value::ArgList;
    use pretty_assertions::assert_eq;
    use std::io::Write as _;

    struct Plain;

    impl Backend for Plain {
        fn emit(&self, _args: &[Value]) -> io::Result<()> {
            Ok(())
        }

        fn emit_to(&self, out: &mut dyn io::Write, args: &[Value]) -> io::Result<()> {
            for value in args {
                writeln!(out, "{value}")?;
            }
            Ok(())
        }

        fn capture(&self, args: &[Value]) -> String {
            args.iter().map(|v| format!("{v}\n")).collect()
        }
    }

    // Rejects every five-float shape; unique to this module's tests.
    struct NoQuintFloats;

    impl Backend for NoQuintFloats {
        fn supports(signature: &Signature) -> bool {
            signature.args() != &[ArgType::Float; 5]
        }

        fn emit(&self, _args: &[Value]) -> io::Result<()> {
            Ok(())
        }

        fn emit_to(&self, _out: &mut dyn io::Write, _args: &[Value]) -> io::Result<()> {
            Ok(())
        }

        fn capture(&self, _args: &[Value]) -> String {
            String::new()
        }
    }

    #[test]
    fn tables_are_memoized_per_type() {
        let first = lookup::<Plain>().unwrap();
        let second = lookup::<Plain>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.backend_name(), type_name::<Plain>());
    }

    #[test]
    fn unsupported_signature_aborts_the_build() {
        registry::prime::<(f32, f32, f32, f32, f32)>(OpKind::Emit);

        let err = lookup::<NoQuintFloats>().unwrap_err();
        match err {
            TableError::MissingOperation {
                backend, signature, ..
            } => {
                assert_eq!(backend, type_name::<NoQuintFloats>());
                assert_eq!(signature.args(), &[ArgType::Float; 5]);
            }
        }
    }

    #[test]
    fn out_of_range_slot_has_no_invoker() {
        let table = lookup::<Plain>().unwrap();
        assert!(table.invoker(Slot::from_index(usize::MAX)).is_none());
    }

    #[test]
    fn result_slot_hands_back_exactly_what_was_stored() {
        let mut slot = ResultSlot::new();
        assert!(slot.take().is_none());

        slot.set(Value::Str("done".to_owned()));
        assert_eq!(slot.take(), Some(Value::Str("done".to_owned())));
        assert!(slot.take().is_none());
    }

    #[test]
    fn synthesized_invoker_runs_the_concrete_operation() {
        let signature = Signature::new(OpKind::Capture, <(i64, &str) as ArgList>::TYPES);
        let invoker = synthesize::<Plain>(&signature, Slot::from_index(0)).unwrap();

        let plain = Plain;
        let receiver: &dyn Any = &plain;
        let mut bundle = Bundle::plain(vec![Value::Int(5), Value::Str("ok".to_owned())]);
        let mut ret = ResultSlot::new();

        invoker(receiver, &mut bundle, Some(&mut ret)).unwrap();

        assert_eq!(ret.take(), Some(Value::Str("5\nok\n".to_owned())));
    }
}
