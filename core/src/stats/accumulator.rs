//! Statistics Accumulator

use crate::math::{max, min};
use itertools::Itertools;
use num_traits::{Num, Zero};
use std::collections::HashMap;
use std::ops::AddAssign;
use std::sync::{Mutex, OnceLock};

/// Return the global statistics accumulator.
pub fn stats_accumulator() -> &'static Mutex<StatsAccumulator> {
    static DATA: OnceLock<Mutex<StatsAccumulator>> = OnceLock::new();
    DATA.get_or_init(|| Mutex::new(StatsAccumulator::default()))
}

/// Distribution statistic.
#[derive(Default, Clone, Debug)]
pub struct StatsDistribution<T>
where
    T: Num + Default + Copy + Clone,
{
    /// Sum of all values.
    sum: T,

    /// Count of all values.
    count: u64,

    /// Minimum value.
    min: Option<T>,

    /// Maximum value.
    max: Option<T>,
}

impl<T> StatsDistribution<T>
where
    T: Num + Zero + PartialOrd + AddAssign + Default + Copy + Clone,
{
    /// Accumulate another distribution into this one.
    ///
    /// * `distrib` - The distribution to fold in.
    pub fn accumulate(&mut self, distrib: Self) {
        self.sum += distrib.sum;
        self.count += distrib.count;
        self.min = merge(self.min, distrib.min, min);
        self.max = merge(self.max, distrib.max, max);
    }

    /// Report a sample value.
    ///
    /// * `val`  - Sample value.
    pub fn report(&mut self, val: T) {
        self.sum += val;
        self.count += 1;
        self.min = merge(self.min, Some(val), min);
        self.max = merge(self.max, Some(val), max);
    }

    /// Clear stats.
    pub fn clear(&mut self) {
        self.sum = T::zero();
        self.count = 0;
        self.min = None;
        self.max = None;
    }
}

fn merge<T: Copy>(a: Option<T>, b: Option<T>, f: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Aggregate different types of statistics.
#[derive(Default)]
pub struct StatsAccumulator {
    /// Counters.
    counters: HashMap<String, i64>,

    /// Memory counters.
    memory_counters: HashMap<String, u64>,

    /// Integer distribution.
    int_distribution: HashMap<String, StatsDistribution<i64>>,

    /// Percentages.
    percentages: HashMap<String, (i64, i64)>,

    /// Ratios.
    ratios: HashMap<String, (i64, i64)>,
}

impl StatsAccumulator {
    /// Accumulates a counter value.
    ///
    /// * `name` - Statistic name.
    /// * `val`  - Counter value.
    pub fn report_counter(&mut self, name: &str, val: i64) {
        *self.counters.entry(name.to_string()).or_insert(0) += val;
    }

    /// Accumulates a memory counter value.
    ///
    /// * `name` - Statistic name.
    /// * `val`  - Memory counter value.
    pub fn report_memory_counter(&mut self, name: &str, val: u64) {
        *self.memory_counters.entry(name.to_string()).or_insert(0) += val;
    }

    /// Accumulates integer distribution samples.
    ///
    /// * `name`    - Statistic name.
    /// * `distrib` - Distribution.
    pub fn report_int_distribution(&mut self, name: &str, distrib: StatsDistribution<i64>) {
        self.int_distribution
            .entry(name.to_string())
            .or_default()
            .accumulate(distrib);
    }

    /// Accumulates a percentage value.
    ///
    /// * `name`  - Statistic name.
    /// * `num`   - Numerator (actual count).
    /// * `denom` - Denominator (total count).
    pub fn report_percentage(&mut self, name: &str, num: i64, denom: i64) {
        let v = self.percentages.entry(name.to_string()).or_insert((0, 0));
        v.0 += num;
        v.1 += denom;
    }

    /// Accumulates a ratio value.
    ///
    /// * `name`  - Statistic name.
    /// * `num`   - Numerator.
    /// * `denom` - Denominator.
    pub fn report_ratio(&mut self, name: &str, num: i64, denom: i64) {
        let v = self.ratios.entry(name.to_string()).or_insert((0, 0));
        v.0 += num;
        v.1 += denom;
    }

    /// Returns the accumulated value of a counter.
    ///
    /// * `name` - Statistic name.
    pub fn counter(&self, name: &str) -> Option<i64> {
        self.counters.get(name).copied()
    }

    /// Returns the accumulated numerator and denominator of a percentage.
    ///
    /// * `name` - Statistic name.
    pub fn percentage(&self, name: &str) -> Option<(i64, i64)> {
        self.percentages.get(name).copied()
    }

    /// Prints the report grouped by category, both sorted by name.
    pub fn print(&self) {
        let mut to_print: HashMap<String, Vec<String>> = HashMap::new();
        let mut add = |name: &str, line: String| {
            let (category, title) = get_category_and_title(name);
            to_print.entry(category).or_default().push(format!("{title:-42}{line}"));
        };

        for (k, &v) in self.counters.iter().filter(|&(_, &v)| v != 0) {
            add(k, format!("               {v:12}"));
        }

        for (k, &v) in self.memory_counters.iter().filter(|&(_, &v)| v != 0) {
            let kb = v as f64 / 1024.0;
            let mib = kb / 1024.0;
            let s = if kb < 1024.0 {
                format!("                  {kb:9.2} kB")
            } else if mib < 1024.0 {
                format!("                  {mib:9.2} MiB")
            } else {
                format!("                  {:9.2} GiB", mib / 1024.0)
            };
            add(k, s);
        }

        for (k, v) in self.int_distribution.iter().filter(|(_, v)| v.count != 0) {
            let mn = v.min.unwrap_or(i64::MAX);
            let mx = v.max.unwrap_or(i64::MIN);
            let avg = v.sum as f64 / v.count as f64;
            add(k, format!("                      {avg:.3} avg [range {mn} - {mx}]"));
        }

        for (k, &(num, denom)) in self.percentages.iter().filter(|&(_, &(_, d))| d != 0) {
            let pct = (100.0 * num as f64) / denom as f64;
            add(k, format!("{num:12} / {denom:12} ({pct:.2}%)"));
        }

        for (k, &(num, denom)) in self.ratios.iter().filter(|&(_, &(_, d))| d != 0) {
            let ratio = num as f64 / denom as f64;
            add(k, format!("{num:12} / {denom:12} ({ratio:.2}x)"));
        }

        println!("Statistics:");
        for (category, items) in to_print.into_iter().sorted_by(|a, b| a.0.cmp(&b.0)) {
            println!("  {category}");
            for item in items.into_iter().sorted() {
                println!("    {item}");
            }
        }
    }

    /// Clear the accumulated statistics.
    pub fn clear(&mut self) {
        self.counters.clear();
        self.memory_counters.clear();
        self.int_distribution.clear();
        self.percentages.clear();
        self.ratios.clear();
    }
}

/// Splits a statistic name at the first `/` as the separator and returns category and title. If there is no `/`, then
/// category is the empty string.
///
/// * `s` - The statistic name to split.
fn get_category_and_title(s: &str) -> (String, String) {
    match s.split_once('/') {
        Some((category, title)) => (category.to_string(), title.to_string()),
        None => (String::new(), s.to_string()),
    }
}
