//! Access to libjpeg-turbo's scaling-factor table.
//!
//! The library keeps its supported factors in a static table; [`TurboJpegTable`] hands
//! out a borrowed view of it without copying. [`supported`] turns it into checked
//! `turbojpeg::ScalingFactor`s for size arithmetic.

use std::cmp::Ordering;
use std::os::raw::c_int;

use thiserror::Error;
use tracing::{debug, warn};
use turbojpeg::{raw, ScalingFactor};

/// A scaling factor exactly as libjpeg-turbo lays it out (`num`, `denom`).
pub type RawFactor = raw::tjscalingfactor;

/// Source of the scaling factors a decoder supports.
pub trait FactorTable {
    /// Returns the factors in library order. The slice is read-only and owned elsewhere.
    fn scaling_factors(&self) -> &[RawFactor];
}

/// The scaling-factor table compiled into the linked libjpeg-turbo.
#[derive(Debug, Clone, Copy, Default)]
pub struct TurboJpegTable;

impl FactorTable for TurboJpegTable {
    fn scaling_factors(&self) -> &[RawFactor] {
        let mut count: c_int = 0;
        // SAFETY: tjGetScalingFactors only writes the count and returns a pointer into a
        // table the library never frees or mutates.
        let table = unsafe { raw::tjGetScalingFactors(&mut count) };

        if table.is_null() || count <= 0 {
            debug!("libjpeg-turbo returned no scaling factors (count = {})", count);
            return &[];
        }

        // SAFETY: non-null and `count` entries long, valid for the life of the process.
        unsafe { std::slice::from_raw_parts(table, count as usize) }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingError {
    #[error("numerator must be at least 1")]
    ZeroNumerator,

    #[error("denominator must be at least 1")]
    ZeroDenominator,

    #[error("scaling factor {num}/{denom} has a negative component")]
    Negative { num: i64, denom: i64 },
}

/// Converts a raw table entry, rejecting zero or negative parts.
///
/// `ScalingFactor::new` reduces the fraction and would turn 0/8 into 0/1, so the
/// check happens on the raw values first.
pub fn factor_from_raw(raw: &RawFactor) -> Result<ScalingFactor, ScalingError> {
    if raw.num < 0 || raw.denom < 0 {
        return Err(ScalingError::Negative {
            num: raw.num.into(),
            denom: raw.denom.into(),
        });
    }
    if raw.num == 0 {
        return Err(ScalingError::ZeroNumerator);
    }
    if raw.denom == 0 {
        return Err(ScalingError::ZeroDenominator);
    }
    Ok(ScalingFactor::new(raw.num as usize, raw.denom as usize))
}

/// Compares the ratios of two factors.
pub fn ratio_cmp(a: &ScalingFactor, b: &ScalingFactor) -> Ordering {
    (a.num() * b.denom()).cmp(&(b.num() * a.denom()))
}

/// Validated copies of every factor in `table`, in library order.
///
/// Entries the library should never produce (zero or negative parts) are skipped.
pub fn supported(table: &impl FactorTable) -> Vec<ScalingFactor> {
    table
        .scaling_factors()
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| match factor_from_raw(raw) {
            Ok(factor) => Some(factor),
            Err(e) => {
                warn!("Skipping scaling factor {}: {}", index, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A fixed table standing in for the library.
    pub(crate) struct FixedTable(pub Vec<RawFactor>);

    impl FixedTable {
        pub(crate) fn of(pairs: &[(c_int, c_int)]) -> Self {
            FixedTable(
                pairs
                    .iter()
                    .map(|&(num, denom)| RawFactor { num, denom })
                    .collect(),
            )
        }
    }

    impl FactorTable for FixedTable {
        fn scaling_factors(&self) -> &[RawFactor] {
            &self.0
        }
    }

    fn sf(num: usize, denom: usize) -> ScalingFactor {
        ScalingFactor::new(num, denom)
    }

    #[test]
    fn test_library_table_has_sixteen_factors() {
        let factors = supported(&TurboJpegTable);
        assert_eq!(factors.len(), 16);

        let expected = [
            (2, 1),
            (15, 8),
            (7, 4),
            (13, 8),
            (3, 2),
            (11, 8),
            (5, 4),
            (9, 8),
            (1, 1),
            (7, 8),
            (3, 4),
            (5, 8),
            (1, 2),
            (3, 8),
            (1, 4),
            (1, 8),
        ];
        for (num, denom) in expected {
            assert!(
                factors.contains(&sf(num, denom)),
                "missing {}/{}",
                num,
                denom
            );
        }
    }

    #[test]
    fn test_library_table_is_stable() {
        let first: Vec<(c_int, c_int)> = TurboJpegTable
            .scaling_factors()
            .iter()
            .map(|f| (f.num, f.denom))
            .collect();
        let second: Vec<(c_int, c_int)> = TurboJpegTable
            .scaling_factors()
            .iter()
            .map(|f| (f.num, f.denom))
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_factor_from_raw() {
        assert_eq!(factor_from_raw(&RawFactor { num: 3, denom: 8 }), Ok(sf(3, 8)));
        assert_eq!(
            factor_from_raw(&RawFactor { num: 0, denom: 8 }),
            Err(ScalingError::ZeroNumerator)
        );
        assert_eq!(
            factor_from_raw(&RawFactor { num: 1, denom: 0 }),
            Err(ScalingError::ZeroDenominator)
        );
        assert_eq!(
            factor_from_raw(&RawFactor { num: -1, denom: 8 }),
            Err(ScalingError::Negative { num: -1, denom: 8 })
        );
    }

    #[test]
    fn test_ratio_cmp() {
        assert_eq!(ratio_cmp(&sf(3, 8), &sf(1, 2)), Ordering::Less);
        assert_eq!(ratio_cmp(&sf(15, 8), &sf(7, 4)), Ordering::Greater);
        assert_eq!(ratio_cmp(&sf(1, 1), &ScalingFactor::ONE), Ordering::Equal);
    }

    #[test]
    fn test_supported_skips_invalid_entries() {
        let table = FixedTable::of(&[(1, 1), (0, 2), (3, 8), (5, -4)]);
        assert_eq!(supported(&table), vec![sf(1, 1), sf(3, 8)]);
    }
}
