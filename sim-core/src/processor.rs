//! Processor facade (spec.md §4.6): the thing an embedder actually
//! constructs. Aggregates the ASB, the process-wide dispatch table, the
//! IPI channel, and the performance counters behind `new`/`init`/
//! `reset`/`step`/`deliver_ipi`, and binds the MMU to its cache/TLB
//! statistics sinks.

use crate::config::FeatureConfig;
use crate::dispatch::{global_table, DispatchTable, InstrDef};
use crate::state::Asb;
use crate::trap::IpiChannel;
use crate::exec::{self, StepReport};
use sim_mmu::{Mmu, StatsHandle};
use sim_perf::PerfWorker;
use std::sync::Arc;

/// Ties together everything one simulated hart needs to run. Generic
/// over the MMU implementation the way the teacher workspace's CPU core
/// is generic over its bus, so tests can swap in `sim_mmu::TestMmu`
/// without the facade knowing about it.
pub struct Processor<M: Mmu> {
    mmu: M,
    asb: Asb,
    dispatch: Arc<DispatchTable>,
    perf: PerfWorker,
    config: FeatureConfig,
    ipi: Arc<IpiChannel>,
    icsim: Option<StatsHandle>,
    dcsim: Option<StatsHandle>,
    itlbsim: Option<StatsHandle>,
    dtlbsim: Option<StatsHandle>,
}

impl<M: Mmu> Processor<M> {
    /// Builds the process-wide dispatch table from `registry` (a no-op
    /// past the first call anywhere in the process, spec.md §4.2 Design
    /// Note) and a fresh, un-reset ASB. Call [`Processor::init`] before
    /// stepping.
    pub fn new(mmu: M, config: FeatureConfig, registry: &[InstrDef]) -> Self {
        Self {
            mmu,
            asb: Asb::new_primary(0),
            dispatch: global_table(registry),
            perf: PerfWorker::new(),
            config,
            ipi: IpiChannel::new(),
            icsim: None,
            dcsim: None,
            itlbsim: None,
            dtlbsim: None,
        }
    }

    /// One-time setup for a hart: assigns its id, allocates its
    /// micro-thread pool, wires the four cache/TLB statistics sinks into
    /// both this facade (for ordered teardown printing) and the MMU (for
    /// counter bumping), and resets the ASB to its post-reset state.
    pub fn init(
        &mut self,
        id: u32,
        ut_count: usize,
        icsim: Option<StatsHandle>,
        dcsim: Option<StatsHandle>,
        itlbsim: Option<StatsHandle>,
        dtlbsim: Option<StatsHandle>,
    ) {
        self.asb.state.id = id;
        self.asb.reset(&self.config);
        self.asb.init_microthreads(ut_count, &self.config);

        self.mmu.set_icsim(icsim.clone());
        self.mmu.set_dcsim(dcsim.clone());
        self.mmu.set_itlbsim(itlbsim.clone());
        self.mmu.set_dtlbsim(dtlbsim.clone());
        self.icsim = icsim;
        self.dcsim = dcsim;
        self.itlbsim = itlbsim;
        self.dtlbsim = dtlbsim;

        tracing::info!("hart {id}: initialized with {ut_count} micro-threads");
    }

    /// Resets the ASB and performance counters, and every attached
    /// statistics sink, to their post-reset state. Identity (`id`) and
    /// the sink bindings themselves survive, but the micro-thread pool
    /// does not (spec.md §4.1) — a later vector instruction needs
    /// [`Processor::init`]'s micro-thread count re-applied via
    /// [`crate::state::Asb::init_microthreads`] before it can run again.
    pub fn reset(&mut self) {
        self.asb.reset(&self.config);
        self.perf.reset();
        for sink in [&self.icsim, &self.dcsim, &self.itlbsim, &self.dtlbsim]
            .into_iter()
            .flatten()
        {
            sink.reset();
        }
    }

    /// Retires up to `n` instructions. See [`exec::step`] for the full
    /// per-instruction contract.
    ///
    /// A [`crate::trap::FatalError`] is, by definition, not an architectural outcome a
    /// caller can recover from (spec.md §7 class 2) — it is logged with
    /// the hart id, trap name, and pc baked into its `Display` impl and
    /// the process is terminated here, at the facade boundary, rather
    /// than threaded back through every caller as a `Result`.
    pub fn step(&mut self, n: u32, noisy: bool) -> StepReport {
        exec::step(
            &mut self.asb,
            &mut self.mmu,
            &self.dispatch,
            &mut self.perf,
            &self.ipi,
            &self.config,
            n,
            noisy,
        )
        .unwrap_or_else(|err| {
            tracing::error!("hart {}: {err}", self.asb.state.id);
            std::process::exit(1);
        })
    }

    /// Requests IPI delivery on this hart. Safe to call from the thread
    /// that owns this `Processor`; a concurrently-stepping hart should
    /// instead hold a clone of [`Processor::ipi_channel`] and call
    /// [`IpiChannel::deliver`] directly, since `Processor` itself is not
    /// `Sync`.
    pub fn deliver_ipi(&mut self) {
        self.ipi.deliver();
        self.perf.record_ipi();
    }

    /// A cloneable handle to this hart's IPI mailbox, for a sender
    /// running on another thread (spec.md §5).
    pub fn ipi_channel(&self) -> Arc<IpiChannel> {
        Arc::clone(&self.ipi)
    }

    pub fn perf(&self) -> &PerfWorker {
        &self.perf
    }

    pub fn asb(&self) -> &Asb {
        &self.asb
    }

    pub fn asb_mut(&mut self) -> &mut Asb {
        &mut self.asb
    }

    pub fn mmu(&self) -> &M {
        &self.mmu
    }

    pub fn mmu_mut(&mut self) -> &mut M {
        &mut self.mmu
    }
}

impl<M: Mmu> Drop for Processor<M> {
    /// Prints and releases every attached statistics sink in a fixed
    /// order: icache, ITLB, dcache, DTLB (spec.md §4.6).
    fn drop(&mut self) {
        if let Some(sink) = self.icsim.take() {
            sink.print_stats("icache");
        }
        if let Some(sink) = self.itlbsim.take() {
            sink.print_stats("itlb");
        }
        if let Some(sink) = self.dcsim.take() {
            sink.print_stats("dcache");
        }
        if let Some(sink) = self.dtlbsim.take() {
            sink.print_stats("dtlb");
        }
    }
}
