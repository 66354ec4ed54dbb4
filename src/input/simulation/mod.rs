//! Simulated light for running the bridge without a Matter controller.

mod light;

pub use light::{LogSink, Scenario, run_light_simulation};
