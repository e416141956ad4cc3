//! Runtime argument values and tuple argument lists.
//!
//! Arguments cross the dispatch boundary as [`Value`]s, a small tagged
//! union covering the primitive shapes the signatures describe. Call sites
//! pass their arguments as plain tuples; [`ArgList`] turns a tuple into its
//! static type-tag list and moves the actual values into the bundle.

use std::fmt;

use crate::signature::ArgType;

/// A single dispatched argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Signed integer.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Single character.
    Char(char),
    /// String.
    Str(String),
}

impl Value {
    /// The type tag this value carries in a signature.
    pub fn arg_type(&self) -> ArgType {
        match self {
            Value::Int(_) => ArgType::Int,
            Value::Float(_) => ArgType::Float,
            Value::Bool(_) => ArgType::Bool,
            Value::Char(_) => ArgType::Char,
            Value::Str(_) => ArgType::Str,
        }
    }

    /// Consume the value as a string, if it is one.
    pub fn into_string(self) -> Option<String> {
        match self {
            Value::Str(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
        }
    }
}

/// Conversion of one concrete argument into a [`Value`].
///
/// The tag is an associated constant so a whole tuple's type list can be
/// assembled at compile time without constructing any value.
pub trait IntoValue {
    /// The tag recorded in the call signature for this argument type.
    const TAG: ArgType;

    /// Move the argument into its dispatched representation.
    fn into_value(self) -> Value;
}

macro_rules! int_into_value {
    ($($ty:ty),*) => {
        $(
            impl IntoValue for $ty {
                const TAG: ArgType = ArgType::Int;

                fn into_value(self) -> Value {
                    Value::Int(self as i64)
                }
            }
        )*
    };
}

int_into_value!(i8, i16, i32, i64, u8, u16, u32);

impl IntoValue for f32 {
    const TAG: ArgType = ArgType::Float;

    fn into_value(self) -> Value {
        Value::Float(f64::from(self))
    }
}

impl IntoValue for f64 {
    const TAG: ArgType = ArgType::Float;

    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl IntoValue for bool {
    const TAG: ArgType = ArgType::Bool;

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoValue for char {
    const TAG: ArgType = ArgType::Char;

    fn into_value(self) -> Value {
        Value::Char(self)
    }
}

impl IntoValue for &str {
    const TAG: ArgType = ArgType::Str;

    fn into_value(self) -> Value {
        Value::Str(self.to_owned())
    }
}

impl IntoValue for String {
    const TAG: ArgType = ArgType::Str;

    // Owned strings move into the bundle without a copy.
    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

/// An ordered list of call arguments with a statically known shape.
///
/// Implemented for tuples of arity 0 through 8 whose components implement
/// [`IntoValue`]. The empty tuple is a zero-argument call.
pub trait ArgList {
    /// Trailing argument types, in call order.
    const TYPES: &'static [ArgType];

    /// Move the actual arguments into `out`, preserving call order.
    fn push_values(self, out: &mut Vec<Value>);
}

impl ArgList for () {
    const TYPES: &'static [ArgType] = &[];

    fn push_values(self, _out: &mut Vec<Value>) {}
}

macro_rules! impl_arg_list {
    ($($name:ident),+) => {
        impl<$($name: IntoValue),+> ArgList for ($($name,)+) {
            const TYPES: &'static [ArgType] = &[$($name::TAG),+];

            #[allow(non_snake_case)]
            fn push_values(self, out: &mut Vec<Value>) {
                let ($($name,)+) = self;
                $(out.push($name.into_value());)+
            }
        }
    };
}

impl_arg_list!(A);
impl_arg_list!(A, B);
impl_arg_list!(A, B, C);
impl_arg_list!(A, B, C, D);
impl_arg_list!(A, B, C, D, E);
impl_arg_list!(A, B, C, D, E, F);
impl_arg_list!(A, B, C, D, E, F, G);
impl_arg_list!(A, B, C, D, E, F, G, H);
