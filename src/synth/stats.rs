use std::time::Duration;

#[derive(Debug, Default)]
pub(crate) struct Statistics {
    pub(crate) global: GlobalStats,
    pub(crate) labels: LabelStats,
    pub(crate) learn: LearnStats,
    pub(crate) repair: RepairStats,
}

#[derive(Debug, Default)]
pub(crate) struct GlobalStats {
    pub(crate) samples: u32,
    pub(crate) iterations: u32,
    pub(crate) synthesis_time: Duration,
}

/// Label class counts over all outputs and samples.
#[derive(Debug, Default)]
pub(crate) struct LabelStats {
    pub(crate) dont_care: u32,
    pub(crate) must_one: u32,
    pub(crate) must_zero: u32,
}

/// Cube counts of the learned initial candidates.
#[derive(Debug, Default)]
pub(crate) struct LearnStats {
    pub(crate) must_one_cubes: u32,
    pub(crate) must_zero_cubes: u32,
}

#[derive(Debug, Default)]
pub(crate) struct RepairStats {
    pub(crate) expansions: u32,
    pub(crate) shrinks: u32,
}
