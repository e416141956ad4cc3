//! The capability base callers hold.
//!
//! A [`Capability`] owns one type-erased backend instance and a reference
//! to that type's dispatch table, bound once at construction. Callers only
//! ever see the three generic operations; slots, registries and tables stay
//! behind this surface.
//!
//! Every call follows the same protocol:
//!
//! 1. resolve the slot for (operation kind, trailing argument types) via
//!    the global registry; registration is idempotent, so a warm call site
//!    pays one
//!    read-locked hash lookup;
//! 2. move the actual arguments into an ephemeral [`Bundle`], including the
//!    fixed leading destination for targeted calls;
//! 3. allocate a [`ResultSlot`] if the operation materializes a value;
//! 4. invoke the table entry at the resolved slot with (backend, bundle,
//!    slot);
//! 5. return the materialized value, if any; the invoker contract
//!    guarantees the slot is populated.
//!
//! # Warm-up discipline
//!
//! A table only contains slots for signatures registered before the first
//! instance of its backend type was constructed. Calling an operation whose
//! signature was registered later is out of contract and panics with a
//! "stale dispatch table" message; register such signatures up front with
//! [`registry::prime`](crate::registry::prime).

use std::any::Any;
use std::io;
use std::sync::Arc;

use crate::backend::Backend;
use crate::registry::{self, CallSite, Slot};
use crate::signature::OpKind;
use crate::table::{self, Bundle, DispatchTable, ResultSlot, TableError};
use crate::value::{ArgList, Value};

/// A type-erased backend bound to its type's dispatch table.
pub struct Capability {
    backend: Box<dyn Any + Send + Sync>,
    table: Arc<DispatchTable>,
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capability").finish_non_exhaustive()
    }
}

impl Capability {
    /// Wrap `backend`, building (or reusing) the dispatch table for its
    /// type.
    ///
    /// Fails when the backend type lacks an implementation for any
    /// signature already registered; a partial table is never constructed.
    pub fn new<T: Backend>(backend: T) -> Result<Self, TableError> {
        let table = table::lookup::<T>()?;
        Ok(Self {
            backend: Box::new(backend),
            table,
        })
    }

    /// Plain operation: effect only, no destination, no result.
    pub fn emit<A: ArgList>(&self, args: A) -> io::Result<()> {
        let slot = registry::global().register(OpKind::Emit, A::TYPES);
        self.emit_at(slot, args)
    }

    /// [`emit`](Self::emit) with the slot cached at the call site.
    pub fn emit_sited<A: ArgList>(&self, site: &CallSite, args: A) -> io::Result<()> {
        let slot = site.resolve(OpKind::Emit, A::TYPES);
        self.emit_at(slot, args)
    }

    /// Targeted operation: effect against `out`.
    ///
    /// The destination is not part of the call's signature; two calls with
    /// the same trailing argument types share a slot regardless of where
    /// their output goes.
    pub fn emit_to<A: ArgList>(&self, out: &mut dyn io::Write, args: A) -> io::Result<()> {
        let slot = registry::global().register(OpKind::EmitTo, A::TYPES);
        self.emit_to_at(slot, out, args)
    }

    /// [`emit_to`](Self::emit_to) with the slot cached at the call site.
    pub fn emit_to_sited<A: ArgList>(
        &self,
        site: &CallSite,
        out: &mut dyn io::Write,
        args: A,
    ) -> io::Result<()> {
        let slot = site.resolve(OpKind::EmitTo, A::TYPES);
        self.emit_to_at(slot, out, args)
    }

    /// Materializing operation: the string the backend builds from the
    /// arguments.
    pub fn capture<A: ArgList>(&self, args: A) -> String {
        let slot = registry::global().register(OpKind::Capture, A::TYPES);
        self.capture_at(slot, args)
    }

    /// [`capture`](Self::capture) with the slot cached at the call site.
    pub fn capture_sited<A: ArgList>(&self, site: &CallSite, args: A) -> String {
        let slot = site.resolve(OpKind::Capture, A::TYPES);
        self.capture_at(slot, args)
    }

    fn emit_at<A: ArgList>(&self, slot: Slot, args: A) -> io::Result<()> {
        let mut bundle = Bundle::plain(collect(args));
        self.run(slot, &mut bundle, None)
    }

    fn emit_to_at<A: ArgList>(
        &self,
        slot: Slot,
        out: &mut dyn io::Write,
        args: A,
    ) -> io::Result<()> {
        let mut bundle = Bundle::targeted(collect(args), out);
        self.run(slot, &mut bundle, None)
    }

    fn capture_at<A: ArgList>(&self, slot: Slot, args: A) -> String {
        let mut bundle = Bundle::plain(collect(args));
        let mut ret = ResultSlot::new();
        self.run(slot, &mut bundle, Some(&mut ret))
            .expect("materializing invokers write the result slot, not I/O");
        ret.take()
            .and_then(Value::into_string)
            .expect("materializing invoker must populate the result slot")
    }

    fn run(
        &self,
        slot: Slot,
        bundle: &mut Bundle<'_>,
        ret: Option<&mut ResultSlot>,
    ) -> io::Result<()> {
        let invoker = self.table.invoker(slot).unwrap_or_else(|| {
            panic!(
                "stale dispatch table for `{}`: slot {} was registered after the table \
                 was built with {} slots; prime the signature before constructing the \
                 first instance",
                self.table.backend_name(),
                slot,
                self.table.len(),
            )
        });
        let receiver: &dyn Any = self.backend.as_ref();
        invoker(receiver, bundle, ret)
    }
}

fn collect<A: ArgList>(args: A) -> Vec<Value> {
    let mut values = Vec::with_capacity(A::TYPES.len());
    args.push_values(&mut values);
    values
}
