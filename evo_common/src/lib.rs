//! EVO Common Library
//!
//! Shared constants, configuration loading utilities and the motion
//! configuration structures used by the EVO motion core.
//!
//! # Module Structure
//!
//! - [`consts`] - Axis count, axis letters and cycle-time bounds
//! - [`config`] - Configuration loading traits and types
//! - [`motion`] - Teleop / external offset axis configuration
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use evo_common::prelude::*;
//! assert_eq!(axis_index('Z'), Some(2));
//! ```

pub mod config;
pub mod consts;
pub mod motion;
pub mod prelude;
