//! The concrete implementation surface and the reference line-writer.

use std::fmt::Write as _;
use std::io::{self, Write};

use crate::signature::Signature;
use crate::value::Value;

/// A concrete implementation of the generic operations.
///
/// A backend receives the trailing arguments of every call as a slice of
/// [`Value`]s; the dispatch plumbing guarantees the slice matches the shape
/// of the resolved signature. A backend that only implements some
/// argument-type lists overrides [`supports`](Backend::supports); any
/// registered signature it rejects aborts construction of its dispatch
/// table with [`TableError::MissingOperation`](crate::TableError::MissingOperation)
/// rather than degrading to a partial table.
pub trait Backend: Send + Sync + 'static {
    /// Whether this backend implements the operation for the exact
    /// argument-type list `signature` describes.
    fn supports(signature: &Signature) -> bool
    where
        Self: Sized,
    {
        let _ = signature;
        true
    }

    /// Plain operation: perform an effect with no destination and no result.
    fn emit(&self, args: &[Value]) -> io::Result<()>;

    /// Targeted operation: perform an effect against `out`.
    fn emit_to(&self, out: &mut dyn Write, args: &[Value]) -> io::Result<()>;

    /// Materializing operation: produce the string form of the arguments.
    fn capture(&self, args: &[Value]) -> String;
}

/// Reference backend: writes every argument on its own line.
///
/// `emit` targets standard output, `emit_to` the given destination and
/// `capture` a fresh string; all three produce identical text for the same
/// arguments.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinePrinter;

impl Backend for LinePrinter {
    fn emit(&self, args: &[Value]) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for value in args {
            writeln!(out, "{value}")?;
        }
        Ok(())
    }

    fn emit_to(&self, out: &mut dyn Write, args: &[Value]) -> io::Result<()> {
        for value in args {
            writeln!(out, "{value}")?;
        }
        Ok(())
    }

    fn capture(&self, args: &[Value]) -> String {
        let mut text = String::new();
        for value in args {
            // Writing to a String cannot fail.
            let _ = writeln!(text, "{value}");
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn stream_and_string_forms_agree() {
        let args = [
            Value::Int(5),
            Value::Float(2.5),
            Value::Str("Hello, world!".to_owned()),
        ];

        let mut stream = Vec::new();
        LinePrinter.emit_to(&mut stream, &args).unwrap();

        assert_eq!(LinePrinter.capture(&args), "5\n2.5\nHello, world!\n");
        assert_eq!(String::from_utf8(stream).unwrap(), "5\n2.5\nHello, world!\n");
    }

    #[test]
    fn no_arguments_produce_no_output() {
        assert_eq!(LinePrinter.capture(&[]), "");
    }
}
