//! LevelControl cluster (0x0008).
//!
//! `currentLevel` runs from 0 to 254; the bridge exposes it as a percentage.

use super::{ClusterCommand, OptionsBitmap};

pub const CLUSTER_NAME: &str = "LevelControl";

/// Attribute carrying the current level
pub const ATTRIBUTE_CURRENT_LEVEL: &str = "currentLevel";

/// Highest level value
pub const MAX_LEVEL: u8 = 254;

/// Device level to percent.
pub fn level_to_percent(level: u8) -> f64 {
    level.min(MAX_LEVEL) as f64 * 100.0 / MAX_LEVEL as f64
}

/// Percent to device level. Any non-zero percentage maps to at least level 1
/// so a dimmed light is never silently switched off.
pub fn percent_to_level(percent: f64) -> u8 {
    let percent = percent.clamp(0.0, 100.0);
    let level = (percent * MAX_LEVEL as f64 / 100.0).round() as u8;
    if percent > 0.0 { level.max(1) } else { 0 }
}

pub fn move_to_level_with_on_off(level: u8, transition_time: u16) -> ClusterCommand {
    ClusterCommand::new(CLUSTER_NAME, "moveToLevelWithOnOff")
        .arg("level", level)
        .arg("transitionTime", transition_time)
        .with_options(OptionsBitmap::EXECUTE_IF_OFF)
}
