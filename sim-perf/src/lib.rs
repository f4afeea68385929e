//! Free-running instrumentation counters, split out of `sim-core` so the
//! hot retirement loop can be built without pulling in reporting machinery
//! — the same split the teacher workspace draws between `aero-cpu-core`
//! and `aero-perf`.

use serde::{Deserialize, Serialize};

/// Snapshot of a hart's bookkeeping counters. Distinct from the
/// architectural `count`/`cycle` registers in `sim-core::state::Asb`
/// (those are part of the simulated machine's visible state and feed
/// timer-interrupt delivery); this is diagnostic-only and never read back
/// by simulated programs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerfCounters {
    pub retired: u64,
    pub cycles: u64,
    pub traps: u64,
    pub interrupts: u64,
    pub ipis: u64,
}

impl PerfCounters {
    pub fn reset(&mut self) {
        *self = PerfCounters::default();
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("PerfCounters serialization cannot fail")
    }
}

/// Accumulates [`PerfCounters`] as the execution engine retires
/// instructions and delivers traps/interrupts/IPIs. One `PerfWorker` per
/// hart, owned by the processor facade alongside the ASB.
#[derive(Debug, Default)]
pub struct PerfWorker {
    counters: PerfCounters,
}

impl PerfWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters(&self) -> &PerfCounters {
        &self.counters
    }

    pub fn reset(&mut self) {
        self.counters.reset();
    }

    /// Records `n` retired instructions and `n` elapsed cycles, matching
    /// the execution engine's "one boundary crossed == one cycle" rule.
    pub fn record_retired(&mut self, n: u64) {
        self.counters.retired += n;
        self.counters.cycles += n;
    }

    pub fn record_trap(&mut self) {
        self.counters.traps += 1;
    }

    pub fn record_interrupt(&mut self) {
        self.counters.interrupts += 1;
    }

    pub fn record_ipi(&mut self) {
        self.counters.ipis += 1;
    }

    pub fn print_stats(&self, label: &str) {
        tracing::info!("{label}: {}", self.counters.to_json());
    }
}
