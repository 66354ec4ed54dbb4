//! OnOff cluster (0x0006).

use super::ClusterCommand;

pub const CLUSTER_NAME: &str = "OnOff";

/// Attribute carrying the on/off state
pub const ATTRIBUTE_ON_OFF: &str = "onOff";

pub fn on() -> ClusterCommand {
    ClusterCommand::new(CLUSTER_NAME, "on")
}

pub fn off() -> ClusterCommand {
    ClusterCommand::new(CLUSTER_NAME, "off")
}

/// `on` or `off` depending on the requested state.
pub fn set(on_off: bool) -> ClusterCommand {
    if on_off { on() } else { off() }
}
