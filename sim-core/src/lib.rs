//! Per-hart execution core: architectural state, the process-wide
//! dispatch table, the interrupt/trap controller, the retirement loop,
//! and the micro-thread pool, aggregated behind a single processor
//! facade (spec.md §§3-4).

pub mod config;
pub mod dispatch;
pub mod exec;
pub mod processor;
pub mod state;
pub mod trap;
pub mod vector;

pub use trap::FatalError;

/// Control-flow signal a handler raises instead of returning normally.
/// Distinct from [`FatalError`]: these are architectural outcomes the
/// execution engine expects and routes (spec.md §7 class 1), not bugs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    /// Routes to [`trap::take_trap`] with the carried cause.
    Trap(trap::TrapCause),
    /// Ends the current vector-thread burst early without halting the
    /// hart (spec.md §4.5).
    VtStop,
    /// Stops the hart and resets its ASB at the end of the current
    /// burst (spec.md §4.4).
    Halt,
}
