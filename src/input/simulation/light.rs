//! Light attribute simulation for testing.
//!
//! Replays the report patterns a real controller produces: hue and
//! saturation split over two messages, a lone hue change, mode switches and
//! on/off toggles.

use crate::light::{ChannelId, ChannelState, CommandSink, EndpointSender, StateSink};
use crate::matter::{AttributeReport, ClusterCommand};
use log::{info, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep};
use tokio_util::sync::CancellationToken;

/// Gap between the two halves of a split report.
const SPLIT_GAP: Duration = Duration::from_millis(50);

/// One step of the simulation cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scenario {
    /// Hue then saturation, shortly after each other
    HueSaturationPair,
    /// Only the hue changes, saturation is never reported
    HueOnly,
    ColorTemperature,
    Xy,
    /// Off, then back on
    Toggle,
}

impl Scenario {
    pub const CYCLE: [Scenario; 5] = [
        Scenario::HueSaturationPair,
        Scenario::HueOnly,
        Scenario::ColorTemperature,
        Scenario::Xy,
        Scenario::Toggle,
    ];

    /// Reports for this step, each preceded by the delay to wait before it.
    pub fn reports(&self, round: u64) -> Vec<(Duration, AttributeReport)> {
        let hue = (round * 37 % 255) as u8;
        let now = Duration::ZERO;

        match self {
            Self::HueSaturationPair => vec![
                (now, AttributeReport::new("colorMode", 0)),
                (now, AttributeReport::new("currentHue", hue)),
                (SPLIT_GAP, AttributeReport::new("currentSaturation", 254)),
            ],
            Self::HueOnly => vec![(now, AttributeReport::new("currentHue", hue))],
            Self::ColorTemperature => vec![
                (now, AttributeReport::new("colorMode", 2)),
                (
                    now,
                    AttributeReport::new("colorTemperatureMireds", 153 + (round * 29 % 347)),
                ),
            ],
            Self::Xy => vec![
                (now, AttributeReport::new("colorMode", 1)),
                (now, AttributeReport::new("currentX", 20000 + (round * 997 % 20000))),
                (SPLIT_GAP, AttributeReport::new("currentY", 21000)),
            ],
            Self::Toggle => vec![
                (now, AttributeReport::new("onOff", false)),
                (Duration::from_secs(1), AttributeReport::new("onOff", true)),
            ],
        }
    }
}

/// Spawn a task that feeds the simulation cycle into a light endpoint.
///
/// One step runs per `period`. Stops when `shutdown` is cancelled or the
/// endpoint goes away.
pub fn run_light_simulation(
    light: EndpointSender,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        let mut round: u64 = 0;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let scenario = Scenario::CYCLE[(round % Scenario::CYCLE.len() as u64) as usize];
            info!("[Sim] {}: {:?}", light.name(), scenario);

            for (delay, report) in scenario.reports(round) {
                if !delay.is_zero() {
                    sleep(delay).await;
                }
                if let Err(e) = light.send_attribute(report).await {
                    warn!("[Sim] Stopping: {}", e);
                    return;
                }
            }
            round += 1;
        }
    })
}

/// Sink that logs what a host would receive.
#[derive(Default)]
pub struct LogSink {
    name: String,
    states: Mutex<HashMap<ChannelId, ChannelState>>,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Last state published on a channel.
    pub fn last(&self, channel: ChannelId) -> Option<ChannelState> {
        self.states.lock().get(&channel).copied()
    }
}

impl StateSink for LogSink {
    fn publish(&self, channel: ChannelId, state: ChannelState) {
        let previous = self.states.lock().insert(channel, state);
        if previous != Some(state) {
            info!("[Sim] {} {} = {}", self.name, channel, state);
        }
    }
}

impl CommandSink for LogSink {
    fn send(&self, command: ClusterCommand) {
        info!(
            "[Sim] {} invoke {}.{} {}",
            self.name,
            command.cluster_name,
            command.command_name,
            serde_json::Value::Object(command.args)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::light::{ColorReconciler, LightEndpointHandle};
    use std::sync::Arc;

    #[test]
    fn test_cycle_splits_pairs() {
        let reports = Scenario::HueSaturationPair.reports(1);
        assert_eq!(reports[0].1.name, "colorMode");
        assert_eq!(reports[2].0, SPLIT_GAP);
        assert_eq!(Scenario::HueOnly.reports(3).len(), 1);

        let mireds = Scenario::ColorTemperature.reports(100)[1].1.as_u16().unwrap();
        assert!((153..=500).contains(&mireds));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulation_drives_endpoint() {
        let sink = Arc::new(LogSink::new("sim"));
        let reconciler =
            ColorReconciler::new("sim", &Config::default().color, sink.clone(), sink.clone());
        let token = CancellationToken::new();
        let handle = LightEndpointHandle::spawn(reconciler, token.clone());

        let sim = run_light_simulation(handle.sender(), Duration::from_secs(10), token.clone());
        // Two steps: the pair, then the lone hue
        sleep(Duration::from_secs(11)).await;

        match sink.last(ChannelId::Color) {
            Some(ChannelState::Hsb(color)) => {
                assert!((color.hue - 37.0 * 360.0 / 254.0).abs() < 0.01);
                assert!((color.saturation - 100.0).abs() < 0.01);
            }
            other => panic!("unexpected {:?}", other),
        }

        token.cancel();
        tokio_test::assert_ok!(sim.await);
        handle.join().await;
    }
}
