//! Call-site macros with one-shot slot caching.
//!
//! A textual call site's argument types are fixed, so its slot never
//! changes. Each macro expansion declares a hidden
//! [`CallSite`](crate::registry::CallSite) and resolves the slot through it
//! exactly once, no matter how often the site runs.

/// Plain operation through a capability, resolving the slot once per call
/// site.
///
/// ```
/// use slotcall::{registry, Capability, LinePrinter, OpKind};
///
/// registry::prime::<(i64, f64, &str)>(OpKind::Emit);
/// let printer = Capability::new(LinePrinter)?;
///
/// slotcall::emit!(printer, 5i64, 2.5, "Hello, world!")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[macro_export]
macro_rules! emit {
    ($cap:expr $(, $arg:expr)* $(,)?) => {{
        static __SITE: $crate::registry::CallSite = $crate::registry::CallSite::new();
        $cap.emit_sited(&__SITE, ($($arg,)*))
    }};
}

/// Targeted operation through a capability, resolving the slot once per
/// call site. The destination is not part of the cached signature.
///
/// ```
/// use slotcall::{registry, Capability, LinePrinter, OpKind};
///
/// registry::prime::<(bool, char)>(OpKind::EmitTo);
/// let printer = Capability::new(LinePrinter)?;
///
/// let mut out = Vec::new();
/// slotcall::emit_to!(printer, &mut out, true, 'x')?;
/// assert_eq!(out, b"true\nx\n");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[macro_export]
macro_rules! emit_to {
    ($cap:expr, $out:expr $(, $arg:expr)* $(,)?) => {{
        static __SITE: $crate::registry::CallSite = $crate::registry::CallSite::new();
        $cap.emit_to_sited(&__SITE, $out, ($($arg,)*))
    }};
}

/// Materializing operation through a capability, resolving the slot once
/// per call site.
///
/// ```
/// use slotcall::{registry, Capability, LinePrinter, OpKind};
///
/// registry::prime::<(i64, &str)>(OpKind::Capture);
/// let printer = Capability::new(LinePrinter)?;
///
/// assert_eq!(slotcall::capture!(printer, 5i64, "ok"), "5\nok\n");
/// # Ok::<(), slotcall::TableError>(())
/// ```
#[macro_export]
macro_rules! capture {
    ($cap:expr $(, $arg:expr)* $(,)?) => {{
        static __SITE: $crate::registry::CallSite = $crate::registry::CallSite::new();
        $cap.capture_sited(&__SITE, ($($arg,)*))
    }};
}
