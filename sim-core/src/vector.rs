//! Vector configuration (spec.md §4.5). The micro-thread pool itself
//! lives on [`crate::state::Asb`]; this module only computes `vlmax` and
//! applies `setvl`.

use crate::state::{CoreState, MAX_UTS};

/// Recomputes `vlmax` from `(nxpr_use, nfpr_use, nxfpr_bank,
/// vecbanks_count)` and clamps it to [`MAX_UTS`].
pub fn vcfg(state: &mut CoreState) {
    let used = state.nxpr_use + state.nfpr_use;
    let raw = if used < 2 {
        state.nxfpr_bank * state.vecbanks_count
    } else {
        (state.nxfpr_bank / (used - 1)) * state.vecbanks_count
    };
    state.vlmax = raw.min(MAX_UTS as u32);
}

/// `vl := min(vlmax, requested)`. Negative requests clamp to zero
/// (spec.md §8, documented implementation-defined choice for `k < 0`).
pub fn setvl(state: &mut CoreState, requested: i64) -> u32 {
    let requested = requested.max(0) as u32;
    state.vl = state.vlmax.min(requested);
    state.vl
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(nxpr_use: u32, nfpr_use: u32, nxfpr_bank: u32, vecbanks_count: u32) -> CoreState {
        let mut s = CoreState::zeroed(0, -1);
        s.nxpr_use = nxpr_use;
        s.nfpr_use = nfpr_use;
        s.nxfpr_bank = nxfpr_bank;
        s.vecbanks_count = vecbanks_count;
        s
    }

    #[test]
    fn vcfg_with_no_registers_in_use() {
        let mut s = state_with(0, 0, 256, 8);
        vcfg(&mut s);
        assert_eq!(s.vlmax, (256u32 * 8).min(MAX_UTS as u32));
    }

    #[test]
    fn vcfg_divides_banks_across_registers_in_use() {
        let mut s = state_with(2, 2, 256, 8);
        vcfg(&mut s);
        let expected = ((256 / (2 + 2 - 1)) * 8).min(MAX_UTS as u32);
        assert_eq!(s.vlmax, expected);
    }

    #[test]
    fn vcfg_clamps_to_max_uts() {
        let mut s = state_with(0, 0, 4096, 8);
        vcfg(&mut s);
        assert_eq!(s.vlmax, MAX_UTS as u32);
    }

    #[test]
    fn setvl_clamps_to_vlmax() {
        let mut s = CoreState::zeroed(0, -1);
        s.vlmax = 16;
        assert_eq!(setvl(&mut s, 100), 16);
        assert_eq!(s.vl, 16);
    }

    #[test]
    fn setvl_passes_through_below_vlmax() {
        let mut s = CoreState::zeroed(0, -1);
        s.vlmax = 16;
        assert_eq!(setvl(&mut s, 5), 5);
    }

    #[test]
    fn setvl_clamps_negative_requests_to_zero() {
        let mut s = CoreState::zeroed(0, -1);
        s.vlmax = 16;
        assert_eq!(setvl(&mut s, -1), 0);
    }
}
