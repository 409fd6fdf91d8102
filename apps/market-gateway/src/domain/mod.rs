//! Domain Layer - Instruments, quotes and trading sessions.
//!
//! Pure types and logic with no I/O. Everything here is safe to call from
//! any task or thread.

/// Time source abstraction.
pub mod clock;

/// Supported futures instruments.
pub mod instrument;

/// Deterministic quote synthesis.
pub mod quote;

/// Per-user session store.
pub mod session;
