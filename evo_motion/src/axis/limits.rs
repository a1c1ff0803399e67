//! Read-only soft-limit checks.

use super::{AxisSet, CoordPositions};
use evo_common::consts::MAX_AXIS;
use static_assertions::const_assert_eq;

/// Tolerance applied to soft limits by [`AxisSet::check_constraints`] [units].
pub const LIMIT_EPSILON: f64 = 1e-6;

/// Where a position lies relative to an axis' soft limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i8)]
pub enum LimitSide {
    Below = -1,
    #[default]
    Within = 0,
    Above = 1,
}

const_assert_eq!(core::mem::size_of::<LimitSide>(), 1);

impl LimitSide {
    #[inline]
    pub const fn as_i8(self) -> i8 {
        self as i8
    }
}

impl AxisSet {
    /// Classify `positions` against the soft limits of each axis.
    ///
    /// Axes outside the active coordinate set always report `Within`.
    /// Returns `true` when every axis is within its limits.
    pub fn check_constraints(
        &self,
        positions: &CoordPositions,
        failing: &mut [LimitSide; MAX_AXIS],
    ) -> bool {
        let mut in_range = true;
        for ((axis, &pos), side) in self.axes.iter().zip(positions.iter()).zip(failing.iter_mut()) {
            *side = match axis.limits {
                Some(l) if pos > l.max + LIMIT_EPSILON => LimitSide::Above,
                Some(l) if pos < l.min - LIMIT_EPSILON => LimitSide::Below,
                _ => LimitSide::Within,
            };
            in_range &= *side == LimitSide::Within;
        }
        in_range
    }
}
