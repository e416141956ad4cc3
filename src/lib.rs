//! # slotcall
//!
//! Open-signature dispatch tables for generic capability operations.
//!
//! Ordinary dynamic dispatch fixes the set of method signatures when the
//! capability is defined. `slotcall` instead lets the set of call shapes
//! grow for the lifetime of the process: every distinct (operation,
//! trailing-argument-types) pair is assigned a stable slot on first
//! registration, and each backend type gets a dispatch table with one
//! invoker per slot known when its first instance was constructed.
//!
//! ## Architecture
//!
//! ```text
//! caller ──► Capability ──► DispatchTable[slot] ──► Invoker ──► Backend
//!                │                 ▲
//!                │ resolve         │ build (lazy, once per type,
//!                ▼                 │        snapshot of the registry)
//!           SlotRegistry ──────────┘
//! ```
//!
//! - [`signature`]: call-shape identity, the operation kind plus trailing
//!   argument types; the fixed leading destination of a targeted call is
//!   excluded from identity.
//! - [`registry`]: process-wide, append-only slot assignment; idempotent
//!   and safe under concurrent first-registration.
//! - [`table`]: invoker synthesis and per-type memoized dispatch tables;
//!   a backend missing an implementation fails at build time, never as a
//!   silent no-op at call time.
//! - [`capability`]: the object callers hold; forwards every generic call
//!   through its table at the slot resolved for the call's signature.
//! - [`value`] / [`backend`]: the argument representation and the concrete
//!   implementation surface, plus the reference [`LinePrinter`].
//!
//! ## Warm-up discipline
//!
//! A dispatch table only covers signatures registered before the first
//! instance of its backend type was constructed. Register late call sites
//! up front with [`registry::prime`]; dispatching a signature registered
//! after a table was built panics with a "stale dispatch table" message.
//!
//! ## Example
//!
//! ```
//! use slotcall::{registry, Capability, LinePrinter, OpKind};
//!
//! // Every signature a backend will serve must be known before its first
//! // instance is constructed.
//! registry::prime::<(i64, f64, &str)>(OpKind::Capture);
//!
//! let printer = Capability::new(LinePrinter)?;
//! let text = printer.capture((5i64, 2.5, "Hello, world!"));
//! assert_eq!(text, "5\n2.5\nHello, world!\n");
//! # Ok::<(), slotcall::TableError>(())
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod backend;
pub mod capability;
mod macros;
pub mod registry;
pub mod signature;
pub mod table;
pub mod value;

// Re-exports
pub use backend::{Backend, LinePrinter};
pub use capability::Capability;
pub use registry::{CallSite, Slot, SlotRegistry};
pub use signature::{ArgType, OpKind, Signature};
pub use table::{Bundle, DispatchTable, Invoker, ResultSlot, TableError};
pub use value::{ArgList, IntoValue, Value};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
