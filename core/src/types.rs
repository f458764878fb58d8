//! Shared primitive types used across the entire simulation.

/// A simulation tick. One tick = one simulated month.
pub type Tick = u64;

/// Stable identifier of a household. Never reused within a replicate.
pub type HouseholdId = u64;

/// Index of a house in `World::houses`. Houses are never removed.
pub type HouseId = usize;

/// Months per year, used to annualise monthly flows.
pub const MONTHS_IN_YEAR: f64 = 12.0;

/// Number of quality quartiles used for quartile-level reporting.
pub const N_QUARTILES: usize = 4;

/// Map a quality level onto its 1-based quartile.
pub fn quality_quartile(quality: usize, n_quality: usize) -> usize {
    if n_quality == 0 {
        return 1;
    }
    (quality * N_QUARTILES / n_quality).min(N_QUARTILES - 1) + 1
}
