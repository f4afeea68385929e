//! Execution Engine: the fetch -> decode -> dispatch -> commit loop
//! (spec.md §4.4). Owns the `count`/`cycle` timer bookkeeping for the
//! burst and folds IPI delivery and interrupt recognition in at every
//! instruction boundary.

use crate::config::FeatureConfig;
use crate::dispatch::DispatchTable;
use crate::state::{Asb, SR_EC};
use crate::trap::{take_interrupt, take_trap, timer_crossed, IpiChannel, TrapCause, IRQ_TIMER_BIT};
use crate::trap::FatalError;
use crate::Exception;
use sim_mmu::Mmu;
use sim_perf::PerfWorker;

/// Result of one `step` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    /// Instructions retired this burst, including trap/interrupt
    /// boundaries (spec.md §4.4 "Cycle accounting").
    pub retired: u64,
    /// Whether a `halt` signal reset the processor mid-burst.
    pub halted: bool,
}

/// Merges a pending IPI into the hart's architectural state. Called at
/// burst entry and again at every loop-head re-entry so delivery is
/// visible no later than the hart's next instruction boundary.
fn sync_ipi(asb: &mut Asb, ipi: &IpiChannel) {
    if ipi.take_pending() {
        asb.state
            .set_irq_pending(crate::state::IRQ_IPI_BIT, true);
    }
    if ipi.run_requested() {
        asb.state.run = true;
    }
}

/// `step(n, noisy)`: attempts to retire up to `n` instructions. Returns
/// immediately, retiring nothing, if `run` is false. See spec.md §4.4 for
/// the full per-instruction contract; the quiet path is free to unroll
/// internally (not modeled here) as long as it stays observably identical.
pub fn step(
    asb: &mut Asb,
    mmu: &mut dyn Mmu,
    table: &DispatchTable,
    perf: &mut PerfWorker,
    ipi: &IpiChannel,
    config: &FeatureConfig,
    n: u32,
    noisy: bool,
) -> Result<StepReport, FatalError> {
    sync_ipi(asb, ipi);
    if !asb.state.run {
        return Ok(StepReport {
            retired: 0,
            halted: false,
        });
    }

    let mut retired: u64 = 0;
    let mut halted = false;

    for _ in 0..n {
        sync_ipi(asb, ipi);

        if let Some(cause) = take_interrupt(&asb.state) {
            perf.record_interrupt();
            take_trap(&mut asb.state, mmu, cause)?;
            asb.state.clamp_zero_register();
            retired += 1;
            continue;
        }

        let pc = asb.state.pc;
        let compressed = asb.state.sr & SR_EC != 0;
        let outcome = match mmu.load_insn(pc, compressed) {
            Ok(insn) => {
                if noisy {
                    tracing::trace!(
                        "hart {} pc={:#x} insn={:#010x}",
                        asb.state.id,
                        pc,
                        insn
                    );
                }
                table.invoke(&mut asb.state, mmu, insn, pc)
            }
            Err(_) => Err(Exception::Trap(TrapCause::INSN_PAGE_FAULT)),
        };

        retired += 1;

        match outcome {
            Ok(next_pc) => {
                asb.state.pc = next_pc;
                asb.state.clamp_zero_register();
            }
            Err(Exception::Trap(t)) => {
                perf.record_trap();
                take_trap(&mut asb.state, mmu, t)?;
                asb.state.clamp_zero_register();
            }
            Err(Exception::VtStop) => {
                asb.state.clamp_zero_register();
                break;
            }
            Err(Exception::Halt) => {
                asb.state.clamp_zero_register();
                halted = true;
                break;
            }
        }
    }

    let pre_count = asb.state.count;
    asb.state.count = asb.state.count.wrapping_add(retired);
    asb.state.cycle = asb.state.cycle.wrapping_add(retired);
    if timer_crossed(pre_count, retired, asb.state.compare) {
        asb.state.set_irq_pending(IRQ_TIMER_BIT, true);
    }
    perf.record_retired(retired);

    if halted {
        asb.reset(config);
    }

    Ok(StepReport { retired, halted })
}
