//! Call-shape identity.
//!
//! A [`Signature`] names one call shape: the generic operation invoked plus
//! the ordered list of trailing argument types. The fixed leading
//! destination of a targeted call is not part of identity: two calls with
//! the same trailing arguments share a signature no matter where their
//! output goes.

use std::fmt;

use indexmap::Equivalent;

/// The generic operation a call shape belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Effectful operation with no destination and no result.
    Emit,
    /// Effectful operation against a fixed leading destination.
    EmitTo,
    /// Operation that materializes a value.
    Capture,
}

impl OpKind {
    /// Stable lowercase name, used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            OpKind::Emit => "emit",
            OpKind::EmitTo => "emit_to",
            OpKind::Capture => "capture",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The type tag of one trailing argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgType {
    /// Signed integer.
    Int,
    /// Floating-point number.
    Float,
    /// Boolean.
    Bool,
    /// Single character.
    Char,
    /// String.
    Str,
}

impl ArgType {
    /// Stable lowercase name, used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ArgType::Int => "int",
            ArgType::Float => "float",
            ArgType::Bool => "bool",
            ArgType::Char => "char",
            ArgType::Str => "str",
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of one call shape.
///
/// Two signatures are equal iff their operation kind and every trailing
/// argument type match. Signatures are pure data; the behavior they resolve
/// to lives in the per-type dispatch tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    op: OpKind,
    args: Vec<ArgType>,
}

impl Signature {
    /// Build a signature from an operation kind and trailing argument types.
    pub fn new(op: OpKind, args: impl Into<Vec<ArgType>>) -> Self {
        Self {
            op,
            args: args.into(),
        }
    }

    /// The operation kind this shape belongs to.
    pub fn op(&self) -> OpKind {
        self.op
    }

    /// Trailing argument types, in call order.
    pub fn args(&self) -> &[ArgType] {
        &self.args
    }

    /// Number of trailing arguments.
    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.op)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

/// Borrowed view of a signature, for registry lookups without allocating.
///
/// Hashes identically to [`Signature`]: `Vec<ArgType>` and `&[ArgType]`
/// share the slice `Hash` implementation.
#[derive(Hash)]
pub(crate) struct SigRef<'a> {
    pub op: OpKind,
    pub args: &'a [ArgType],
}

impl Equivalent<Signature> for SigRef<'_> {
    fn equivalent(&self, key: &Signature) -> bool {
        self.op == key.op && self.args == key.args.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(value: &impl Hash) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn equality_requires_op_and_every_arg_to_match() {
        let a = Signature::new(OpKind::Emit, [ArgType::Int, ArgType::Str]);
        let b = Signature::new(OpKind::Emit, [ArgType::Int, ArgType::Str]);
        let c = Signature::new(OpKind::EmitTo, [ArgType::Int, ArgType::Str]);
        let d = Signature::new(OpKind::Emit, [ArgType::Str, ArgType::Int]);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn sig_ref_hashes_like_the_owned_signature() {
        let owned = Signature::new(OpKind::Capture, [ArgType::Float, ArgType::Bool]);
        let borrowed = SigRef {
            op: OpKind::Capture,
            args: &[ArgType::Float, ArgType::Bool],
        };

        assert_eq!(hash_of(&owned), hash_of(&borrowed));
        assert!(borrowed.equivalent(&owned));
    }

    #[test]
    fn display_is_compact() {
        let sig = Signature::new(OpKind::Emit, [ArgType::Int, ArgType::Float, ArgType::Str]);
        assert_eq!(sig.to_string(), "emit(int, float, str)");

        let empty = Signature::new(OpKind::Capture, []);
        assert_eq!(empty.to_string(), "capture()");
    }
}
