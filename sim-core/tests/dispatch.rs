use sim_core::dispatch::{DispatchTable, InstrDef};
use sim_core::state::CoreState;
use sim_core::trap::TrapCause;
use sim_core::Exception;
use sim_mmu::{Mmu, TestMmu};

fn addi(
    state: &mut CoreState,
    _mmu: &mut dyn Mmu,
    insn: u32,
    pc: u64,
) -> Result<u64, Exception> {
    let rd = ((insn >> 7) & 0x1F) as usize;
    state.xpr[rd] = 7;
    Ok(pc + 4)
}

fn jal(
    _state: &mut CoreState,
    _mmu: &mut dyn Mmu,
    _insn: u32,
    _pc: u64,
) -> Result<u64, Exception> {
    Ok(0x2000)
}

#[test]
fn distinct_opcodes_land_in_distinct_table_slots() {
    let registry = [
        InstrDef {
            name: "addi",
            opcode: 0x13,
            mask: 0x7F,
            handler: addi,
        },
        InstrDef {
            name: "jal",
            opcode: 0x6F,
            mask: 0x7F,
            handler: jal,
        },
    ];
    let table = DispatchTable::build(&registry);
    let mut mmu = TestMmu::new(0x10);
    let mut state = CoreState::zeroed(0, -1);

    let next = table.invoke(&mut state, &mut mmu, 0x13 | (3 << 7), 0x100).unwrap();
    assert_eq!(next, 0x104);
    assert_eq!(state.xpr[3], 7);

    let next = table.invoke(&mut state, &mut mmu, 0x6F, 0x100).unwrap();
    assert_eq!(next, 0x2000);
}

#[test]
fn empty_table_traps_everything() {
    let table = DispatchTable::build(&[]);
    let mut mmu = TestMmu::new(0x10);
    let mut state = CoreState::zeroed(0, -1);
    let err = table.invoke(&mut state, &mut mmu, 0x13, 0x100);
    assert!(matches!(
        err,
        Err(Exception::Trap(TrapCause::ILLEGAL_INSTRUCTION))
    ));
}
