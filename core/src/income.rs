//! Empirical gross employment income given age.
//!
//! The source table has rows of five numeric fields:
//!   age_min, age_max, ln(income_min), ln(income_max), probability_mass
//!
//! At load time income bounds are exponentiated to linear units and the
//! probability mass is turned into a running cumulative probability that
//! restarts at every age group (a fixed-size block of rows). Once the
//! running sum reaches 0.9999 it is clamped to exactly 1.0.
//!
//! Queries scan the bins in table order; the percentile only selects the
//! bin, the returned value is drawn uniformly between its bounds from the
//! replicate's master stream.

use crate::{
    error::{SimError, SimResult},
    rng::SimRng,
};

/// Cumulative probability at or above which a bin saturates to 1.0.
pub const CUMULATIVE_SATURATION: f64 = 0.9999;

/// Queries at or above the table's maximum age are nudged this far below it.
pub const MAX_AGE_NUDGE: f64 = 1e-7;

#[derive(Debug, Clone, PartialEq)]
pub struct IncomeBin {
    pub age_min: f64,
    pub age_max: f64,
    pub income_min: f64,
    pub income_max: f64,
    pub cumulative_probability: f64,
}

impl IncomeBin {
    /// Half-open age range [age_min, age_max).
    pub fn contains_age(&self, age: f64) -> bool {
        age >= self.age_min && age < self.age_max
    }
}

/// The loaded, immutable-by-default income table.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomeTable {
    bins: Vec<IncomeBin>,
}

impl IncomeTable {
    /// Load from a CSV file with one header line.
    pub fn load(path: &str, rows_per_age_group: usize) -> SimResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SimError::DataFile {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        let table = Self::parse(&content, rows_per_age_group).map_err(|e| match e {
            SimError::DataFile { reason, .. } => SimError::DataFile {
                path: path.to_string(),
                reason,
            },
            other => other,
        })?;
        log::debug!("Loaded {} income bins from {path}", table.bins.len());
        Ok(table)
    }

    /// Parse CSV text. The first non-empty line is a header and is skipped.
    pub fn parse(content: &str, rows_per_age_group: usize) -> SimResult<Self> {
        let mut rows = Vec::new();
        for (line_no, line) in content
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty())
            .skip(1)
        {
            let fields: Vec<f64> = line
                .split(',')
                .map(|f| f.trim().trim_matches('"').parse::<f64>())
                .collect::<Result<_, _>>()
                .map_err(|e| data_error(format!("line {}: {e}", line_no + 1)))?;
            if fields.len() < 5 {
                return Err(data_error(format!(
                    "line {}: expected 5 fields, got {}",
                    line_no + 1,
                    fields.len()
                )));
            }
            rows.push([fields[0], fields[1], fields[2], fields[3], fields[4]]);
        }
        Self::from_rows(&rows, rows_per_age_group)
    }

    /// Build from raw rows (log income bounds, per-row probability mass).
    pub fn from_rows(rows: &[[f64; 5]], rows_per_age_group: usize) -> SimResult<Self> {
        if rows.is_empty() {
            return Err(data_error("income table has no rows".into()));
        }
        if rows_per_age_group == 0 || rows.len() % rows_per_age_group != 0 {
            return Err(data_error(format!(
                "{} rows do not split into age groups of {rows_per_age_group}",
                rows.len()
            )));
        }

        let mut bins: Vec<IncomeBin> = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let [age_min, age_max, ln_min, ln_max, mass] = *row;
            if age_max <= age_min {
                return Err(data_error(format!("row {i}: empty age range")));
            }
            if mass < 0.0 {
                return Err(data_error(format!("row {i}: negative probability mass")));
            }
            let mut cumulative = mass;
            if i % rows_per_age_group != 0 {
                let prev = &bins[i - 1];
                if prev.age_min != age_min || prev.age_max != age_max {
                    return Err(data_error(format!(
                        "row {i}: age range changes inside an age group"
                    )));
                }
                cumulative += prev.cumulative_probability;
            } else if let Some(prev) = bins.last() {
                if age_min < prev.age_min {
                    return Err(data_error(format!("row {i}: age groups out of order")));
                }
            }
            if cumulative >= CUMULATIVE_SATURATION {
                cumulative = 1.0;
            }
            bins.push(IncomeBin {
                age_min,
                age_max,
                income_min: ln_min.exp(),
                income_max: ln_max.exp(),
                cumulative_probability: cumulative,
            });
        }
        Ok(Self { bins })
    }

    pub fn bins(&self) -> &[IncomeBin] {
        &self.bins
    }

    pub fn min_age(&self) -> f64 {
        self.bins.iter().map(|b| b.age_min).fold(f64::INFINITY, f64::min)
    }

    pub fn max_age(&self) -> f64 {
        self.bins.iter().map(|b| b.age_max).fold(f64::NEG_INFINITY, f64::max)
    }
}

fn data_error(reason: String) -> SimError {
    SimError::DataFile {
        path: "<income table>".into(),
        reason,
    }
}

/// Stochastic income generator over an `IncomeTable`.
///
/// Owns its copy of the table: `shock()` mutates it in place for the rest
/// of the sampler's life, and repeated shocks compound.
#[derive(Debug, Clone)]
pub struct IncomeSampler {
    table: IncomeTable,
    min_age: f64,
    max_age: f64,
    annual_income_floor: f64,
}

impl IncomeSampler {
    pub fn new(table: IncomeTable, annual_income_floor: f64) -> Self {
        let min_age = table.min_age();
        let max_age = table.max_age();
        Self {
            table,
            min_age,
            max_age,
            annual_income_floor,
        }
    }

    pub fn table(&self) -> &IncomeTable {
        &self.table
    }

    pub fn annual_income_floor(&self) -> f64 {
        self.annual_income_floor
    }

    /// Clamp an age into [min_age, max_age).
    pub fn bound_age(&self, age: f64) -> f64 {
        if age < self.min_age {
            self.min_age
        } else if age >= self.max_age {
            self.max_age - MAX_AGE_NUDGE
        } else {
            age
        }
    }

    /// First bin, in table order, containing `age` with cumulative
    /// probability at or above `percentile`.
    pub fn select_bin(&self, age: f64, percentile: f64) -> Option<&IncomeBin> {
        let age = self.bound_age(age);
        self.table
            .bins
            .iter()
            .find(|b| b.contains_age(age) && b.cumulative_probability >= percentile)
    }

    /// Annual gross employment income for a household of this age and
    /// income percentile. Never below the annualised income support.
    pub fn annual_gross_income(&self, age: f64, percentile: f64, rng: &mut SimRng) -> f64 {
        let income = match self.select_bin(age, percentile) {
            Some(bin) => {
                let u = rng.next_f64();
                bin.income_min + u * (bin.income_max - bin.income_min)
            }
            None => 0.0,
        };
        income.max(self.annual_income_floor)
    }

    /// Permanently scale every bin's income bounds by `factor`.
    pub fn shock(&mut self, factor: f64) {
        for bin in &mut self.table.bins {
            bin.income_min *= factor;
            bin.income_max *= factor;
        }
        log::info!("Income table shocked by factor {factor:.4}");
    }
}
