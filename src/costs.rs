use std::iter::Sum;

/// The costs of one call (or of a set of merged calls).
///
/// Time and cycles accumulate, so combining two cost vectors adds them. Memory and peak memory
/// are watermarks, so combining keeps the larger value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Costs {
    /// Wall time, in the profiler's unit (microseconds or nanoseconds, depending on its version).
    pub time: u64,
    /// Memory usage, in bytes.
    pub memory: u64,
    /// CPU cycles.
    pub cycles: u64,
    /// Peak memory usage, in bytes.
    pub peak_memory: u64,
}

/// One of the four fields of [`Costs`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CostKind {
    /// [`Costs::time`]
    Time,
    /// [`Costs::memory`]
    Memory,
    /// [`Costs::cycles`]
    Cycles,
    /// [`Costs::peak_memory`]
    PeakMemory,
}

impl CostKind {
    /// All cost fields, in the order reports list them.
    pub const ALL: [CostKind; 4] = [
        CostKind::Cycles,
        CostKind::Memory,
        CostKind::PeakMemory,
        CostKind::Time,
    ];

    /// The short name used for this field in reports.
    pub fn name(self) -> &'static str {
        match self {
            CostKind::Time => "time",
            CostKind::Memory => "mem",
            CostKind::Cycles => "cycles",
            CostKind::PeakMemory => "peakmem",
        }
    }
}

impl Costs {
    /// No cost at all; the identity of [`Costs::combine`].
    pub const ZERO: Costs = Costs::new(0, 0, 0, 0);

    /// Costs in the column order of the profile format.
    pub const fn new(time: u64, memory: u64, cycles: u64, peak_memory: u64) -> Self {
        Costs {
            time,
            memory,
            cycles,
            peak_memory,
        }
    }

    /// Combine two cost vectors: time and cycles add up, memory and peak memory take the max.
    ///
    /// This is commutative and associative, so any fold over a set of costs gives the same
    /// result regardless of order.
    #[must_use]
    pub fn combine(self, other: Costs) -> Costs {
        Costs {
            time: self.time.saturating_add(other.time),
            memory: self.memory.max(other.memory),
            cycles: self.cycles.saturating_add(other.cycles),
            peak_memory: self.peak_memory.max(other.peak_memory),
        }
    }

    /// The value of a single field.
    pub fn get(&self, kind: CostKind) -> u64 {
        match kind {
            CostKind::Time => self.time,
            CostKind::Memory => self.memory,
            CostKind::Cycles => self.cycles,
            CostKind::PeakMemory => self.peak_memory,
        }
    }
}

impl Sum for Costs {
    fn sum<I: Iterator<Item = Costs>>(iter: I) -> Self {
        iter.fold(Costs::ZERO, Costs::combine)
    }
}

/// How severe each of a node's own costs is relative to the whole profile.
///
/// Every field lies in `0.0..=1.0`, where 1 is the worst.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CostRatings {
    /// Rating of [`Costs::time`].
    pub time: f64,
    /// Rating of [`Costs::memory`].
    pub memory: f64,
    /// Rating of [`Costs::cycles`].
    pub cycles: f64,
    /// Rating of [`Costs::peak_memory`].
    pub peak_memory: f64,
}

/// Own costs at or above this share of the total get the worst rating.
const SEVERE_SHARE: f64 = 0.05;

impl CostRatings {
    /// Rate `costs` against the profile totals in `summary`.
    ///
    /// A zero cost rates 0. A cost that is at least 5% of the total rates 1. Anything in between
    /// scales linearly, so 2.5% of the total rates 0.5.
    pub fn rate(costs: &Costs, summary: &Costs) -> Self {
        let rate = |kind: CostKind| {
            let value = costs.get(kind);
            if value == 0 {
                return 0.0;
            }
            let total = summary.get(kind).max(1);
            let share = value as f64 / total as f64;
            if share >= SEVERE_SHARE {
                1.0
            } else {
                share / SEVERE_SHARE
            }
        };

        CostRatings {
            time: rate(CostKind::Time),
            memory: rate(CostKind::Memory),
            cycles: rate(CostKind::Cycles),
            peak_memory: rate(CostKind::PeakMemory),
        }
    }

    /// The rating of a single field.
    pub fn get(&self, kind: CostKind) -> f64 {
        match kind {
            CostKind::Time => self.time,
            CostKind::Memory => self.memory,
            CostKind::Cycles => self.cycles,
            CostKind::PeakMemory => self.peak_memory,
        }
    }
}
