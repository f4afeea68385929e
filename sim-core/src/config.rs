//! Build-time feature gating, consulted once at processor construction
//! rather than as per-write `cfg!` branches (Design Note "Build-time
//! feature gating").

/// Which optional architectural extensions this processor instance was
/// built with. `set_sr` forces the corresponding enable bit in `sr` to
/// zero for every extension this config disables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureConfig {
    pub fpu: bool,
    pub vector: bool,
    pub compressed: bool,
    pub bit64: bool,
}

impl Default for FeatureConfig {
    /// All optional extensions present; the common case for a simulator
    /// built to exercise the full ISA.
    fn default() -> Self {
        Self {
            fpu: true,
            vector: true,
            compressed: true,
            bit64: true,
        }
    }
}

impl FeatureConfig {
    pub const fn scalar_only() -> Self {
        Self {
            fpu: false,
            vector: false,
            compressed: false,
            bit64: true,
        }
    }
}
