use sim_core::config::FeatureConfig;
use sim_core::dispatch::InstrDef;
use sim_core::processor::Processor;
use sim_core::state::IRQ_TIMER_BIT;
use sim_core::Exception;
use sim_mmu::TestMmu;

fn nop(
    state: &mut sim_core::state::CoreState,
    _mmu: &mut dyn sim_mmu::Mmu,
    _insn: u32,
    pc: u64,
) -> Result<u64, Exception> {
    state.xpr[1] = 1;
    Ok(pc + 4)
}

fn registry() -> Vec<InstrDef> {
    vec![InstrDef {
        name: "nop",
        opcode: 0x13,
        mask: 0x7F,
        handler: nop,
    }]
}

#[test]
fn end_to_end_wraparound_sets_timer_irq() {
    let mut mmu = TestMmu::new(0x1000);
    mmu.store_word(0, 0x13);
    mmu.store_word(4, 0x13);
    let reg = registry();
    let mut proc = Processor::new(mmu, FeatureConfig::default(), &reg);
    proc.init(0, 0, None, None, None, None);
    proc.asb_mut().state.run = true;
    proc.asb_mut().state.count = u64::MAX - 1;
    proc.asb_mut().state.compare = 0;

    proc.step(2, false);
    assert_ne!(
        proc.asb().state.pending_interrupts() & (1 << IRQ_TIMER_BIT),
        0
    );
}

#[test]
fn no_crossing_leaves_timer_irq_clear() {
    let mut mmu = TestMmu::new(0x1000);
    mmu.store_word(0, 0x13);
    let reg = registry();
    let mut proc = Processor::new(mmu, FeatureConfig::default(), &reg);
    proc.init(0, 0, None, None, None, None);
    proc.asb_mut().state.run = true;
    proc.asb_mut().state.count = 10;
    proc.asb_mut().state.compare = 100;

    proc.step(1, false);
    assert_eq!(
        proc.asb().state.pending_interrupts() & (1 << IRQ_TIMER_BIT),
        0
    );
}
