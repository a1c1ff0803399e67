//! Bring-up of an [`AxisSet`] from the TOML motion configuration.
//!
//! Every configured axis joins the active coordinate set with its soft
//! limits. Axes not named in the file stay inactive.

use std::path::Path;

use evo_common::config::ConfigLoader;
use evo_common::consts::axis_index;
use evo_common::motion::{AxisConfig, MotionConfig};
use tracing::{debug, info};

use crate::axis::AxisSet;
use crate::error::{AxisError, SetupError};

/// Load, validate and apply a configuration file.
pub fn load_axis_set(path: &Path) -> Result<(MotionConfig, AxisSet), SetupError> {
    let config = MotionConfig::load_validated(path)?;
    let set = build_axis_set(&config)?;
    info!(
        path = %path.display(),
        service = %config.shared.service_name,
        axes = config.axes.len(),
        cycle_time_us = config.cycle_time_us,
        "motion configuration applied"
    );
    Ok((config, set))
}

/// Build an [`AxisSet`] for a configuration that already passed validation.
pub fn build_axis_set(config: &MotionConfig) -> Result<AxisSet, AxisError> {
    let mut set = AxisSet::new(config.cycle_time_s());
    for ax in &config.axes {
        apply_axis(&mut set, ax)?;
    }
    Ok(set)
}

fn apply_axis(set: &mut AxisSet, ax: &AxisConfig) -> Result<(), AxisError> {
    // Validated configs only carry known letters.
    let index = axis_index(ax.letter).ok_or(AxisError::UnknownAxis { index: usize::MAX })?;
    set.set_pos_limits(index, ax.min_pos_limit, ax.max_pos_limit)?;
    set.set_vel_limit(index, ax.vel_limit)?;
    set.set_acc_limit(index, ax.acc_limit)?;
    set.set_jerk_limit(index, ax.jerk_limit)?;
    set.set_ext_offset_vel_limit(index, ax.ext_offset_vel_limit)?;
    set.set_ext_offset_acc_limit(index, ax.ext_offset_acc_limit)?;
    set.set_locking_joint(index, ax.locking_joint)?;
    debug!(
        axis = %ax.letter,
        min = ax.min_pos_limit,
        max = ax.max_pos_limit,
        vel = ax.vel_limit,
        acc = ax.acc_limit,
        jerk = ax.jerk_limit,
        profile = if ax.jerk_limit > 0.0 { "s-curve" } else { "trapezoid" },
        "axis configured"
    );
    Ok(())
}

// ─── Tests ──────────────────────────────────────────────────────────
