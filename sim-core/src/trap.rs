//! Interrupt/Trap Controller: pending-interrupt computation and trap
//! entry. Architectural faults (illegal instruction, page faults,
//! asynchronous interrupts) all funnel through [`take_trap`]; internal
//! programming bugs (bad trap number, dispatch-table corruption,
//! disassembler mismatch) are reported as [`FatalError`] and terminate the
//! process — neither class is ever silently swallowed (spec.md §7).

use crate::state::{CoreState, SR_ET, SR_PS, SR_S};
use sim_mmu::Mmu;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Trap ids below this are the synchronous architectural faults
/// (illegal instruction, page faults, ...); ids at or above
/// [`TrapCause::INTERRUPT_BASE`] are asynchronous interrupts indexed by
/// their `cause.IP` bit. An interrupt is indistinguishable from a
/// synchronous trap once it reaches [`take_trap`] (spec.md §4.3).
pub const NUM_TRAPS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapCause(pub u32);

impl TrapCause {
    pub const ILLEGAL_INSTRUCTION: TrapCause = TrapCause(0);
    pub const INSN_PAGE_FAULT: TrapCause = TrapCause(1);
    pub const LOAD_PAGE_FAULT: TrapCause = TrapCause(2);
    pub const STORE_PAGE_FAULT: TrapCause = TrapCause(3);

    pub const INTERRUPT_BASE: u32 = 8;

    pub const fn from_irq_bit(bit: u8) -> TrapCause {
        TrapCause(Self::INTERRUPT_BASE + bit as u32)
    }

    pub fn is_interrupt(self) -> bool {
        self.0 >= Self::INTERRUPT_BASE
    }

    /// Human-readable name for diagnostics (spec.md §7's "diagnostic
    /// including hart id, trap name, and pc"). Interrupt causes above the
    /// four named synchronous traps are reported by their IRQ bit.
    pub fn name(self) -> std::borrow::Cow<'static, str> {
        match self {
            Self::ILLEGAL_INSTRUCTION => "illegal_instruction".into(),
            Self::INSN_PAGE_FAULT => "insn_page_fault".into(),
            Self::LOAD_PAGE_FAULT => "load_page_fault".into(),
            Self::STORE_PAGE_FAULT => "store_page_fault".into(),
            t if t.is_interrupt() => format!("interrupt(irq={})", t.0 - Self::INTERRUPT_BASE).into(),
            t => format!("reserved({})", t.0).into(),
        }
    }
}

/// Internal invariant violations: non-recoverable programming bugs,
/// distinct from architectural faults (spec.md §7 class 2).
#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    #[error("hart {hart_id}: bad trap number {trap_id} (NUM_TRAPS={num_traps})")]
    BadTrapNumber {
        hart_id: u32,
        trap_id: u32,
        num_traps: u32,
    },
    #[error("hart {hart_id}: double fault delivering trap {trap_id} ({trap_name}) at pc={pc:#x} (traps disabled in status word)")]
    DoubleFault {
        hart_id: u32,
        trap_id: u32,
        trap_name: String,
        pc: u64,
    },
    #[error("hart {hart_id}: dispatch table corrupted at index {index}")]
    DispatchCorruption { hart_id: u32, index: usize },
    #[error("hart {hart_id}: disassembler length mismatch (expected {expected}, got {actual})")]
    DisassemblerMismatch {
        hart_id: u32,
        expected: usize,
        actual: usize,
    },
}

/// Computes `pending = cause.IP & sr.IM`; if any bit is pending and traps
/// are enabled, returns the trap cause for the lowest-numbered pending
/// bit. Called once at burst entry and again on every loop-head
/// re-entry (spec.md §4.4).
pub fn take_interrupt(state: &CoreState) -> Option<TrapCause> {
    let pending = state.pending_interrupts() & state.interrupt_mask();
    if pending == 0 || state.sr & SR_ET == 0 {
        return None;
    }
    let bit = pending.trailing_zeros() as u8;
    Some(TrapCause::from_irq_bit(bit))
}

/// Trap entry. Requires `t < NUM_TRAPS` and `sr.ET != 0`; either
/// violation is fatal (bad internal trap number, or the trap handler
/// itself trapping — a "double fault"). `badvaddr` is unconditionally
/// refreshed from the MMU regardless of trap cause (spec.md §4, Open
/// Question: preserve this behavior).
pub fn take_trap(state: &mut CoreState, mmu: &dyn Mmu, t: TrapCause) -> Result<(), FatalError> {
    if t.0 >= NUM_TRAPS {
        return Err(FatalError::BadTrapNumber {
            hart_id: state.id,
            trap_id: t.0,
            num_traps: NUM_TRAPS,
        });
    }
    if state.sr & SR_ET == 0 {
        tracing::error!(
            "hart {}: double fault delivering trap {} ({}) at pc={:#x}",
            state.id,
            t.0,
            t.name(),
            state.pc
        );
        return Err(FatalError::DoubleFault {
            hart_id: state.id,
            trap_id: t.0,
            trap_name: t.name().into_owned(),
            pc: state.pc,
        });
    }
    let old_sr = state.sr;
    let old_supervisor = old_sr & SR_S != 0;
    state.sr = (old_sr & !SR_ET & !SR_PS) | SR_S | if old_supervisor { SR_PS } else { 0 };
    state.set_exccode(t.0 as u64);
    state.epc = state.pc;
    state.pc = state.evec;
    state.badvaddr = mmu.badvaddr();
    tracing::warn!(
        "hart {}: trap {} ({}) delivered, epc={:#x} -> evec={:#x}",
        state.id,
        t.0,
        t.name(),
        state.epc,
        state.pc
    );
    Ok(())
}

/// Wraparound-safe "did the timer just cross `compare`" predicate
/// (Design Note "Counter-wrap detection for timer"). Treats `count` as
/// climbing a circular number line: fires iff `compare` lies in the
/// half-open arc `(pre_count, post_count]`, whether or not that arc
/// wraps past `u64::MAX`. Fires exactly once per crossing.
pub fn timer_crossed(pre_count: u64, added: u64, compare: u64) -> bool {
    let (post, wrapped) = pre_count.overflowing_add(added);
    if wrapped {
        compare > pre_count || compare <= post
    } else {
        pre_count < compare && compare <= post
    }
}

/// Cross-thread IPI mailbox (spec.md §4.3, §5). `deliver_ipi` is the only
/// externally-callable state mutator besides `step`, and may be called
/// from any thread; multiple racing deliveries coalesce into a single
/// pending bit rather than a count. Both fields use release/acquire
/// ordering so a concurrently-stepping hart observes them no later than
/// its next instruction boundary.
#[derive(Default)]
pub struct IpiChannel {
    pending: AtomicBool,
    run: AtomicBool,
}

impl IpiChannel {
    pub fn new() -> Arc<IpiChannel> {
        Arc::new(IpiChannel::default())
    }

    /// Asynchronously requests delivery. Safe to call from any thread,
    /// including concurrently with another `deliver`.
    pub fn deliver(&self) {
        self.pending.store(true, Ordering::Release);
        self.run.store(true, Ordering::Release);
    }

    /// Drains the pending bit, returning whether it was set. Called at
    /// every instruction boundary by the execution engine.
    pub fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn run_requested(&self) -> bool {
        self.run.load(Ordering::Acquire)
    }
}
