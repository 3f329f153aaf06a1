//! Id allocation across the three population sources.

use std::fmt;
use std::ops::RangeInclusive;

/// Where one third of the mock data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Json,
    Excel,
    Direct,
}

impl Source {
    /// Insertion order used by the coordinator.
    pub const ALL: [Source; 3] = [Source::Json, Source::Excel, Source::Direct];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Excel => "excel",
            Self::Direct => "direct",
        }
    }

    /// Prefix for generated names so rows can be traced to their source.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Json => "",
            Self::Excel => "Excel",
            Self::Direct => "Direct",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A contiguous block of primary keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRange {
    pub start: i32,
    pub len: u32,
}

impl IdRange {
    pub fn end(&self) -> i32 {
        self.start + self.len as i32 - 1
    }

    pub fn ids(&self) -> RangeInclusive<i32> {
        self.start..=self.end()
    }

    pub fn contains(&self, id: i32) -> bool {
        self.ids().contains(&id)
    }

    pub fn overlaps(&self, other: &IdRange) -> bool {
        self.start <= other.end() && other.start <= self.end()
    }
}

/// Device ids reserved per customer (each customer gets one to three devices).
pub const MAX_DEVICES_PER_CUSTOMER: u32 = 3;

/// Largest run [`IdPlan::split`] accepts; device ids stay well inside `i32`.
pub const MAX_ROWS_PER_TABLE: u32 = 1_000_000;

/// Keys one source may use.
///
/// `rows` covers every table keyed by a sequential id (customers, watch
/// history, favorites, payments, profiles, reviews); marks are bounded by
/// the same count. `devices` reserves room for the per-customer maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPlan {
    pub source: Source,
    pub rows: IdRange,
    pub devices: IdRange,
}

impl IdPlan {
    /// Split `total` rows per table across the sources, larger shares first
    /// (400 gives 134/133/133 and ids 1..=400).
    ///
    /// Callers validate `total` against [`MAX_ROWS_PER_TABLE`].
    pub fn split(total: u32) -> [IdPlan; 3] {
        debug_assert!(total <= MAX_ROWS_PER_TABLE);
        let base = total / 3;
        let extra = total % 3;

        let mut row_start = 1;
        let mut device_start = 1;
        std::array::from_fn(|index| {
            let len = base + u32::from((index as u32) < extra);
            let plan = IdPlan {
                source: Source::ALL[index],
                rows: IdRange { start: row_start, len },
                devices: IdRange {
                    start: device_start,
                    len: len * MAX_DEVICES_PER_CUSTOMER,
                },
            };
            row_start += len as i32;
            device_start += (len * MAX_DEVICES_PER_CUSTOMER) as i32;
            plan
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_largest_run() {
        let plans = IdPlan::split(MAX_ROWS_PER_TABLE);
        let last = plans[2];
        assert_eq!(last.rows.end(), MAX_ROWS_PER_TABLE as i32);
        assert_eq!(last.devices.end(), (MAX_ROWS_PER_TABLE * MAX_DEVICES_PER_CUSTOMER) as i32);
        assert!(!plans[0].devices.overlaps(&plans[1].devices));
    }

    #[test]
    fn test_split_400() {
        let plans = IdPlan::split(400);
        let sizes: Vec<u32> = plans.iter().map(|p| p.rows.len).collect();
        assert_eq!(sizes, vec![134, 133, 133]);
        assert_eq!(plans[0].rows.start, 1);
        assert_eq!(plans[2].rows.end(), 400);
    }

    #[test]
    fn test_ranges_disjoint_and_contiguous() {
        for total in [3, 10, 400, 601] {
            let plans = IdPlan::split(total);
            for (i, a) in plans.iter().enumerate() {
                for b in plans.iter().skip(i + 1) {
                    assert!(!a.rows.overlaps(&b.rows), "rows overlap for {}", total);
                    assert!(!a.devices.overlaps(&b.devices), "devices overlap for {}", total);
                }
            }
            for pair in plans.windows(2) {
                assert_eq!(pair[0].rows.end() + 1, pair[1].rows.start);
            }
            let covered: u32 = plans.iter().map(|p| p.rows.len).sum();
            assert_eq!(covered, total);
        }
    }

    #[test]
    fn test_device_capacity() {
        let plans = IdPlan::split(400);
        assert_eq!(plans[0].devices.ids(), 1..=402);
        assert_eq!(plans[1].devices.start, 403);
        assert!(plans[1].devices.contains(801));
        assert!(!plans[1].devices.contains(802));
    }
}
