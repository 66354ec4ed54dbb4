//! Color reconciler for one Matter color light endpoint.
//!
//! Matter reports hue and saturation (or X and Y) as separate attributes that
//! do not necessarily arrive in the same message. Publishing after each one
//! would flash a color made of one new and one stale value, so a pair is only
//! published once both halves arrived, or once the debounce delay ran out
//! with only one of them.
//!
//! All methods run on the owning endpoint task; there is no internal locking.

use super::channel::{ChannelId, ChannelState, Command, CommandSink, StateSink};
use super::debounce::DebounceTimer;
use super::state::{ColorModel, Displayed, LightState, PairMember, UpdateState};
use crate::color::{self, ColorError, Hsb};
use crate::config::ColorConfig;
use crate::error::{BridgeError, Result};
use crate::matter::clusters::color_control::{self, ColorControlAttribute};
use crate::matter::clusters::{
    ClusterCommand, ColorModeEnum, EnhancedColorModeEnum, FeatureMap, level_control, on_off,
};
use crate::matter::{AttributeName, AttributeReport};
use log::{debug, info, trace, warn};
use std::sync::Arc;
use tokio::time::Instant;

/// What applying a single report requires afterwards.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Effect {
    None,
    /// The active color representation or the mode changed
    Reconcile,
    /// Only on/off or brightness changed
    Republish,
}

pub struct ColorReconciler {
    name: String,
    state: LightState,
    debounce: DebounceTimer,
    transition_time: u16,
    states: Arc<dyn StateSink>,
    commands: Arc<dyn CommandSink>,
    shut_down: bool,
}

impl ColorReconciler {
    pub fn new(
        name: impl Into<String>,
        config: &ColorConfig,
        states: Arc<dyn StateSink>,
        commands: Arc<dyn CommandSink>,
    ) -> Self {
        Self {
            name: name.into(),
            state: LightState::new(config),
            debounce: DebounceTimer::new(config.debounce()),
            transition_time: config.transition_time,
            states,
            commands,
            shut_down: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &LightState {
        &self.state
    }

    /// Deadline of the pending debounced publish, if any.
    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    /// Handle one attribute change notification.
    pub fn on_attribute_changed(&mut self, report: &AttributeReport) {
        match self.apply(report) {
            Effect::Reconcile => self.reconcile(),
            Effect::Republish => self.republish_color(),
            Effect::None => {}
        }
    }

    /// Publish the active representation if it is complete, otherwise
    /// start the debounce countdown. A wait already in progress keeps its
    /// deadline, so repeats of one half cannot postpone the publish.
    /// Safe to call repeatedly.
    pub fn reconcile(&mut self) {
        if self.shut_down {
            return;
        }

        match self.state.active {
            model @ (ColorModel::HueSaturation | ColorModel::Xy) => {
                if self.state.representation(model).update.is_ready() {
                    self.debounce.cancel();
                    self.publish_active();
                } else if !self.debounce.is_armed() {
                    self.debounce.arm();
                    trace!(
                        "[Color] {}: {:?} incomplete, publishing within {:?}",
                        self.name,
                        model,
                        self.debounce.delay()
                    );
                }
            }
            ColorModel::ColorTemperature => {
                self.debounce.cancel();
                self.publish_active();
                self.undefine(ColorModel::HueSaturation);
                self.undefine(ColorModel::Xy);
            }
        }
    }

    /// The debounce delay ran out: publish whatever values are held.
    pub fn on_debounce_expired(&mut self) {
        if self.shut_down || !self.debounce.is_armed() {
            return;
        }
        self.debounce.cancel();
        debug!(
            "[Color] {}: {:?} pair incomplete after {:?}, publishing held values",
            self.name,
            self.state.active,
            self.debounce.delay()
        );
        self.publish_active();
    }

    pub fn on_on_off_changed(&mut self, on: bool) {
        self.state.on_off = on;
        self.republish_color();
    }

    pub fn on_brightness_changed(&mut self, percent: f64) {
        if !percent.is_finite() {
            return;
        }
        self.state.brightness = percent.clamp(0.0, 100.0);
        self.republish_color();
    }

    /// Apply a full-state read, e.g. after reconnecting, and publish every
    /// channel once without waiting for pairs to complete.
    pub fn refresh(&mut self, reports: &[AttributeReport]) {
        if self.shut_down {
            return;
        }
        self.debounce.cancel();

        for report in reports {
            self.apply(report);
        }
        for model in ColorModel::ALL {
            self.state.representation_mut(model).update = UpdateState::Ready;
        }

        let active = self.state.active;
        self.publish_active();
        for model in ColorModel::ALL.into_iter().filter(|m| *m != active) {
            self.undefine(model);
        }
        info!(
            "[Color] {}: refreshed from {} attributes, mode {:?}",
            self.name,
            reports.len(),
            active
        );
    }

    /// Translate a channel command into cluster commands and send them.
    pub fn handle_command(
        &mut self,
        channel: ChannelId,
        command: Command,
    ) -> Result<Vec<ClusterCommand>> {
        if self.shut_down {
            return Err(BridgeError::EndpointClosed(self.name.clone()));
        }

        let commands = self.build_commands(channel, command)?;
        for cmd in &commands {
            debug!(
                "[Color] {}: {} -> {}.{}",
                self.name, channel, cmd.cluster_name, cmd.command_name
            );
            self.commands.send(cmd.clone());
        }
        Ok(commands)
    }

    /// Stop publishing and drop any pending debounced publish.
    pub fn shutdown(&mut self) {
        self.debounce.cancel();
        self.shut_down = true;
    }

    fn apply(&mut self, report: &AttributeReport) -> Effect {
        let Some(attribute) = report.attribute() else {
            debug!(
                "[Color] {}: ignoring unknown attribute {}",
                self.name, report.name
            );
            return Effect::None;
        };

        match attribute {
            AttributeName::OnOff => match report.as_bool() {
                Some(on) => {
                    self.state.on_off = on;
                    Effect::Republish
                }
                None => self.malformed(report),
            },
            AttributeName::CurrentLevel => match report.as_u8() {
                Some(level) => {
                    self.state.brightness = level_control::level_to_percent(level);
                    Effect::Republish
                }
                None => self.malformed(report),
            },
            AttributeName::ColorControl(attr) => self.apply_color(attr, report),
        }
    }

    fn apply_color(&mut self, attr: ColorControlAttribute, report: &AttributeReport) -> Effect {
        use ColorControlAttribute as A;

        match attr {
            A::CurrentHue => match report.as_u8().filter(|h| *h <= color_control::MAX_HUE) {
                Some(hue) => {
                    self.state.hue = Some(color_control::hue_to_degrees(hue));
                    self.advance_pair(ColorModel::HueSaturation, PairMember::First)
                }
                None => self.malformed(report),
            },
            A::EnhancedCurrentHue => match report.as_u16() {
                Some(hue) => {
                    self.state.hue = Some(color_control::enhanced_hue_to_degrees(hue));
                    self.advance_pair(ColorModel::HueSaturation, PairMember::First)
                }
                None => self.malformed(report),
            },
            A::CurrentSaturation => {
                match report
                    .as_u8()
                    .filter(|s| *s <= color_control::MAX_SATURATION)
                {
                    Some(saturation) => {
                        self.state.saturation =
                            Some(color_control::saturation_to_percent(saturation));
                        self.advance_pair(ColorModel::HueSaturation, PairMember::Second)
                    }
                    None => self.malformed(report),
                }
            }
            A::CurrentX => match report.as_u16().filter(|x| *x <= color_control::MAX_XY) {
                Some(x) => {
                    self.state.x = Some(x);
                    self.advance_pair(ColorModel::Xy, PairMember::First)
                }
                None => self.malformed(report),
            },
            A::CurrentY => match report.as_u16().filter(|y| *y <= color_control::MAX_XY) {
                Some(y) => {
                    self.state.y = Some(y);
                    self.advance_pair(ColorModel::Xy, PairMember::Second)
                }
                None => self.malformed(report),
            },
            A::ColorTemperatureMireds => {
                match report.as_u16().filter(|m| *m <= color_control::MAX_MIREDS) {
                    Some(mireds) => {
                        self.state.mireds = Some(mireds);
                        let temperature = &mut self.state.temperature;
                        temperature.update = temperature.update.advance_single();
                        self.effect_for(ColorModel::ColorTemperature)
                    }
                    None => self.malformed(report),
                }
            }
            A::ColorMode => match report.as_u8().and_then(ColorModeEnum::from_repr) {
                Some(mode) => self.switch_mode(mode.into()),
                None => self.malformed(report),
            },
            A::EnhancedColorMode => {
                match report.as_u8().and_then(EnhancedColorModeEnum::from_repr) {
                    Some(mode) => self.switch_mode(ColorModeEnum::from(mode).into()),
                    None => self.malformed(report),
                }
            }
            A::ColorTempPhysicalMinMireds | A::ColorTempPhysicalMaxMireds => {
                let Some(mireds) = report.as_u16() else {
                    return self.malformed(report);
                };
                if attr == A::ColorTempPhysicalMinMireds {
                    self.state.min_mireds = mireds;
                } else {
                    self.state.max_mireds = mireds;
                }
                if self.state.active == ColorModel::ColorTemperature {
                    Effect::Reconcile
                } else {
                    Effect::None
                }
            }
            A::FeatureMap | A::ColorCapabilities => match report.as_u32() {
                Some(bits) => {
                    self.state.features = FeatureMap::from_bits(bits);
                    Effect::None
                }
                None => self.malformed(report),
            },
            A::RemainingTime
            | A::Options
            | A::ColorLoopActive
            | A::StartUpColorTemperatureMireds => {
                trace!("[Color] {}: {} = {}", self.name, report.name, report.value);
                Effect::None
            }
        }
    }

    fn advance_pair(&mut self, model: ColorModel, member: PairMember) -> Effect {
        let representation = self.state.representation_mut(model);
        representation.update = representation.update.advance_pair(member);
        self.effect_for(model)
    }

    /// Values for an inactive representation are stored but do not disturb
    /// the pending publish of the active one.
    fn effect_for(&self, model: ColorModel) -> Effect {
        if self.state.active == model {
            Effect::Reconcile
        } else {
            Effect::None
        }
    }

    fn switch_mode(&mut self, model: ColorModel) -> Effect {
        let previous = self.state.active;
        if previous == model {
            return Effect::None;
        }

        info!(
            "[Color] {}: color mode {:?} -> {:?}",
            self.name, previous, model
        );
        self.state.active = model;
        self.state.representation_mut(model).update = UpdateState::Waiting1;
        // The new representation waits on its own deadline
        self.debounce.cancel();
        self.undefine(previous);
        Effect::Reconcile
    }

    fn malformed(&self, report: &AttributeReport) -> Effect {
        warn!(
            "[Color] {}: ignoring malformed {} value {}",
            self.name, report.name, report.value
        );
        Effect::None
    }

    /// Compute and publish the active representation and the composite color.
    fn publish_active(&mut self) {
        let model = self.state.active;
        self.state.representation_mut(model).update = UpdateState::Ready;

        let color = match model {
            ColorModel::HueSaturation => {
                let color = self.state.hue_saturation_color();
                self.show(ChannelId::HueSaturation, color.clone().map(ChannelState::Hsb));
                color
            }
            ColorModel::Xy => {
                let color = self.state.xy_color();
                self.show(ChannelId::Xy, color.clone().map(ChannelState::Hsb));
                color
            }
            ColorModel::ColorTemperature => {
                self.show(
                    ChannelId::ColorTemperatureAbs,
                    self.state.kelvin().map(ChannelState::Kelvin),
                );
                self.show(
                    ChannelId::ColorTemperature,
                    self.state.temperature_percent().map(ChannelState::Percent),
                );
                self.state.temperature_color()
            }
        };

        let displayed = if color.is_ok() {
            Displayed::Value
        } else {
            Displayed::Undefined
        };
        self.state.representation_mut(model).displayed = displayed;

        self.state.last_color = self.converted(ChannelId::Color, color).ok();
        self.republish_color();
    }

    /// Publish a channel value, degrading conversion failures to UNDEFINED.
    fn show(&self, channel: ChannelId, value: std::result::Result<ChannelState, ColorError>) {
        let state = self
            .converted(channel, value)
            .unwrap_or(ChannelState::Undefined);
        self.publish(channel, state);
    }

    fn converted<T>(
        &self,
        channel: ChannelId,
        value: std::result::Result<T, ColorError>,
    ) -> std::result::Result<T, ColorError> {
        if let Err(e) = &value {
            debug!("[Color] {}: {} undefined: {}", self.name, channel, e);
        }
        value
    }

    /// Publish the composite color at the current effective brightness.
    fn republish_color(&self) {
        match self.state.last_color {
            Some(color) => {
                let color = color.with_brightness(self.state.effective_brightness());
                self.publish(ChannelId::Color, ChannelState::Hsb(color));
            }
            None if self.state.representation(self.state.active).displayed
                == Displayed::Undefined =>
            {
                self.publish(ChannelId::Color, ChannelState::Undefined);
            }
            None => trace!("[Color] {}: no color known yet", self.name),
        }
    }

    /// Flag a representation's channels as not applicable, once.
    fn undefine(&mut self, model: ColorModel) {
        let representation = self.state.representation_mut(model);
        if representation.displayed == Displayed::Undefined {
            return;
        }
        representation.displayed = Displayed::Undefined;
        for channel in model.channels() {
            self.publish(*channel, ChannelState::Undefined);
        }
    }

    fn publish(&self, channel: ChannelId, state: ChannelState) {
        if self.shut_down {
            return;
        }
        trace!("[Color] {}: {} = {}", self.name, channel, state);
        self.states.publish(channel, state);
    }

    fn build_commands(&self, channel: ChannelId, command: Command) -> Result<Vec<ClusterCommand>> {
        let tt = self.transition_time;
        let unsupported = || BridgeError::UnsupportedCommand {
            channel,
            command: command.kind().to_string(),
        };

        let commands = match (channel, command) {
            (ChannelId::Color, Command::OnOff(on)) => vec![on_off::set(on)],
            (ChannelId::Color, Command::Percent(percent)) => vec![level_command(percent, tt)],
            (ChannelId::Color, Command::Hsb(hsb)) => {
                if hsb.brightness <= 0.0 {
                    vec![on_off::off()]
                } else {
                    let features = self.state.features;
                    let color = if features.hue_saturation {
                        hue_saturation_command(hsb, tt)
                    } else if features.xy {
                        xy_command(hsb, tt)?
                    } else {
                        return Err(unsupported());
                    };
                    vec![level_command(hsb.brightness, tt), color]
                }
            }
            (ChannelId::HueSaturation, Command::Hsb(hsb)) => vec![hue_saturation_command(hsb, tt)],
            (ChannelId::Xy, Command::Hsb(hsb)) => vec![xy_command(hsb, tt)?],
            (ChannelId::ColorTemperature, Command::Percent(percent)) => {
                vec![color_control::move_to_color_temperature(
                    self.state.percent_to_mireds(percent),
                    tt,
                )]
            }
            (ChannelId::ColorTemperatureAbs, Command::Kelvin(kelvin)) => {
                let mireds = color::kelvin_to_mireds(kelvin)?;
                vec![color_control::move_to_color_temperature(
                    self.state.clamp_mireds(mireds),
                    tt,
                )]
            }
            _ => return Err(unsupported()),
        };

        Ok(commands)
    }
}

fn level_command(percent: f64, transition_time: u16) -> ClusterCommand {
    match level_control::percent_to_level(percent) {
        0 => on_off::off(),
        level => level_control::move_to_level_with_on_off(level, transition_time),
    }
}

fn hue_saturation_command(hsb: Hsb, transition_time: u16) -> ClusterCommand {
    color_control::move_to_hue_and_saturation(
        color_control::degrees_to_hue(hsb.hue),
        color_control::percent_to_saturation(hsb.saturation),
        transition_time,
    )
}

fn xy_command(hsb: Hsb, transition_time: u16) -> Result<ClusterCommand> {
    let xy = color::hsb_to_xy(hsb)?;
    Ok(color_control::move_to_color(
        color_control::coordinate_to_xy(xy.x),
        color_control::coordinate_to_xy(xy.y),
        transition_time,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSink {
        states: Mutex<Vec<(ChannelId, ChannelState)>>,
        commands: Mutex<Vec<ClusterCommand>>,
    }

    impl RecordingSink {
        fn take(&self) -> Vec<(ChannelId, ChannelState)> {
            std::mem::take(&mut *self.states.lock())
        }

        fn on(&self, channel: ChannelId) -> Vec<ChannelState> {
            self.states
                .lock()
                .iter()
                .filter(|(c, _)| *c == channel)
                .map(|(_, s)| *s)
                .collect()
        }
    }

    impl StateSink for RecordingSink {
        fn publish(&self, channel: ChannelId, state: ChannelState) {
            self.states.lock().push((channel, state));
        }
    }

    impl CommandSink for RecordingSink {
        fn send(&self, command: ClusterCommand) {
            self.commands.lock().push(command);
        }
    }

    fn reconciler() -> (ColorReconciler, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let reconciler = ColorReconciler::new(
            "test-light",
            &Config::default().color,
            sink.clone(),
            sink.clone(),
        );
        (reconciler, sink)
    }

    fn report(r: &mut ColorReconciler, name: &str, value: impl Into<serde_json::Value>) {
        r.on_attribute_changed(&AttributeReport::new(name, value));
    }

    fn hsb(state: &ChannelState) -> Hsb {
        match state {
            ChannelState::Hsb(hsb) => *hsb,
            other => panic!("expected HSB, got {:?}", other),
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 0.01,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_hue_and_saturation_publish_immediately() {
        let (mut r, sink) = reconciler();
        report(&mut r, "currentHue", 127);
        assert!(r.debounce_deadline().is_some());
        assert!(sink.take().is_empty());

        report(&mut r, "currentSaturation", 254);
        assert!(r.debounce_deadline().is_none());

        let color = hsb(&sink.on(ChannelId::Color)[0]);
        assert_close(color.hue, 180.0);
        assert_close(color.saturation, 100.0);
        assert_close(color.brightness, 100.0);

        let hs = hsb(&sink.on(ChannelId::HueSaturation)[0]);
        assert_close(hs.hue, 180.0);
    }

    #[test]
    fn test_single_hue_waits_for_debounce() {
        let (mut r, sink) = reconciler();
        report(&mut r, "currentHue", 127);
        report(&mut r, "currentSaturation", 254);
        sink.take();

        report(&mut r, "currentHue", 0);
        assert!(r.debounce_deadline().is_some());
        assert!(sink.take().is_empty());

        r.on_debounce_expired();
        let published = sink.on(ChannelId::Color);
        assert_eq!(published.len(), 1);
        let color = hsb(&published[0]);
        assert_close(color.hue, 0.0);
        assert_close(color.saturation, 100.0);

        // A second expiry without a new report publishes nothing
        sink.take();
        r.on_debounce_expired();
        assert!(sink.take().is_empty());
    }

    #[test]
    fn test_repeated_half_keeps_pending_color() {
        let (mut r, sink) = reconciler();
        report(&mut r, "currentHue", 10);
        report(&mut r, "currentHue", 20);
        assert!(sink.take().is_empty());

        report(&mut r, "currentSaturation", 127);
        let color = hsb(&sink.on(ChannelId::Color)[0]);
        assert_close(color.hue, 20.0 * 360.0 / 254.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_half_keeps_deadline() {
        let (mut r, sink) = reconciler();
        report(&mut r, "currentHue", 10);
        report(&mut r, "currentSaturation", 254);
        sink.take();

        report(&mut r, "currentHue", 20);
        let deadline = r.debounce_deadline().unwrap();
        for hue in 21..25 {
            tokio::time::advance(Duration::from_millis(400)).await;
            report(&mut r, "currentHue", hue);
            assert_eq!(r.debounce_deadline(), Some(deadline));
        }
        assert!(sink.take().is_empty());

        r.on_debounce_expired();
        let color = hsb(&sink.on(ChannelId::Color)[0]);
        assert_close(color.hue, 24.0 * 360.0 / 254.0);

        // A new wait after the publish gets a fresh deadline
        report(&mut r, "currentHue", 30);
        assert!(r.debounce_deadline().unwrap() > deadline);
    }

    #[test]
    fn test_mode_switch_starts_fresh_deadline() {
        let (mut r, _sink) = reconciler();
        report(&mut r, "currentHue", 10);
        assert!(r.debounce_deadline().is_some());

        report(&mut r, "colorMode", 1);
        assert!(r.debounce_deadline().is_some());
        report(&mut r, "colorMode", 2);
        assert!(r.debounce_deadline().is_none());
    }

    #[test]
    fn test_switch_to_temperature_undefines_hue_saturation_once() {
        let (mut r, sink) = reconciler();
        report(&mut r, "currentHue", 127);
        report(&mut r, "currentSaturation", 254);
        sink.take();

        report(&mut r, "colorTemperatureMireds", 154);
        assert!(sink.take().is_empty());

        report(&mut r, "colorMode", 2);
        report(&mut r, "colorTemperatureMireds", 154);
        report(&mut r, "colorTemperatureMireds", 160);

        let undefined = sink
            .on(ChannelId::HueSaturation)
            .into_iter()
            .filter(ChannelState::is_undefined)
            .count();
        assert_eq!(undefined, 1);

        let kelvin = sink.on(ChannelId::ColorTemperatureAbs);
        match kelvin.first() {
            Some(ChannelState::Kelvin(k)) => assert_close(*k, 6493.51),
            other => panic!("expected Kelvin, got {:?}", other),
        }
        let composite = hsb(sink.on(ChannelId::Color).last().unwrap());
        assert_close(composite.brightness, 100.0);
        assert!(composite.saturation < 20.0);
    }

    #[test]
    fn test_mode_report_in_same_message_counts_for_new_mode() {
        let (mut r, sink) = reconciler();
        let object = serde_json::json!({
            "currentX": 20000,
            "colorMode": 1,
            "currentY": 21000,
        });
        let serde_json::Value::Object(map) = object else {
            unreachable!()
        };
        for rep in crate::matter::attributes::reports_from_object(map) {
            r.on_attribute_changed(&rep);
        }

        assert!(r.debounce_deadline().is_none());
        assert!(matches!(sink.on(ChannelId::Xy)[0], ChannelState::Hsb(_)));
        assert_eq!(
            sink.on(ChannelId::HueSaturation),
            vec![ChannelState::Undefined]
        );
    }

    #[test]
    fn test_conversion_failure_publishes_undefined_and_recovers() {
        let (mut r, sink) = reconciler();
        report(&mut r, "colorMode", 1);
        report(&mut r, "currentX", 20000);
        report(&mut r, "currentY", 0);
        assert_eq!(sink.on(ChannelId::Xy), vec![ChannelState::Undefined]);
        assert_eq!(sink.on(ChannelId::Color), vec![ChannelState::Undefined]);
        assert!(r.state().last_color.is_none());

        // Without a known color the composite stays undefined
        sink.take();
        report(&mut r, "onOff", false);
        assert_eq!(sink.on(ChannelId::Color), vec![ChannelState::Undefined]);

        sink.take();
        report(&mut r, "currentX", 20000);
        report(&mut r, "currentY", 21000);
        assert!(matches!(sink.on(ChannelId::Xy)[0], ChannelState::Hsb(_)));
        assert_eq!(hsb(&sink.on(ChannelId::Color)[0]).brightness, 0.0);
    }

    #[test]
    fn test_on_off_restores_exact_color() {
        let (mut r, sink) = reconciler();
        report(&mut r, "currentLevel", 127);
        report(&mut r, "currentHue", 85);
        report(&mut r, "currentSaturation", 200);
        let before = hsb(sink.on(ChannelId::Color).last().unwrap());
        sink.take();

        report(&mut r, "onOff", false);
        let off = hsb(sink.on(ChannelId::Color).last().unwrap());
        assert_eq!(off.brightness, 0.0);
        assert_eq!(off.hue, before.hue);

        report(&mut r, "onOff", true);
        let on = hsb(sink.on(ChannelId::Color).last().unwrap());
        assert_eq!(on, before);
        assert_close(on.brightness, 50.0);
    }

    #[test]
    fn test_inactive_representation_does_not_disturb_pending_publish() {
        let (mut r, sink) = reconciler();
        report(&mut r, "currentHue", 127);
        let deadline = r.debounce_deadline();
        report(&mut r, "currentX", 20000);
        assert_eq!(r.debounce_deadline(), deadline);
        assert!(sink.take().is_empty());
    }

    #[test]
    fn test_malformed_and_unknown_reports_are_ignored() {
        let (mut r, sink) = reconciler();
        report(&mut r, "currentHue", 300);
        report(&mut r, "currentHue", "red");
        report(&mut r, "vendorMagic", 1);
        report(&mut r, "colorMode", 9);
        assert!(r.debounce_deadline().is_none());
        assert!(sink.take().is_empty());
        assert_eq!(r.state().active, ColorModel::HueSaturation);
    }

    #[test]
    fn test_refresh_publishes_without_waiting() {
        let (mut r, sink) = reconciler();
        r.refresh(&[
            AttributeReport::new("colorMode", 0),
            AttributeReport::new("currentHue", 127),
            AttributeReport::new("onOff", true),
        ]);

        assert!(r.debounce_deadline().is_none());
        // Saturation unknown: the active representation cannot be computed
        assert_eq!(
            sink.on(ChannelId::HueSaturation),
            vec![ChannelState::Undefined]
        );
        assert_eq!(sink.on(ChannelId::Xy), vec![ChannelState::Undefined]);
        assert_eq!(
            sink.on(ChannelId::ColorTemperatureAbs),
            vec![ChannelState::Undefined]
        );

        sink.take();
        r.refresh(&[AttributeReport::new("currentSaturation", 254)]);
        let color = hsb(&sink.on(ChannelId::Color)[0]);
        assert_close(color.hue, 180.0);
        assert!(sink.on(ChannelId::Xy).is_empty());
    }

    #[test]
    fn test_temperature_commands() {
        let (mut r, sink) = reconciler();
        let sent = r
            .handle_command(ChannelId::ColorTemperatureAbs, Command::Kelvin(6500.0))
            .unwrap();
        assert_eq!(sent[0].command_name, "moveToColorTemperature");
        assert_eq!(sent[0].arg_u64("colorTemperatureMireds"), Some(154));

        let sent = r
            .handle_command(ChannelId::ColorTemperature, Command::Percent(100.0))
            .unwrap();
        assert_eq!(sent[0].arg_u64("colorTemperatureMireds"), Some(500));

        let sent = r
            .handle_command(ChannelId::ColorTemperatureAbs, Command::Kelvin(1000.0))
            .unwrap();
        assert_eq!(sent[0].arg_u64("colorTemperatureMireds"), Some(500));
        assert_eq!(sink.commands.lock().len(), 3);
    }

    #[test]
    fn test_color_commands() {
        let (mut r, _sink) = reconciler();
        let sent = r
            .handle_command(ChannelId::Color, Command::Hsb(Hsb::new(180.0, 100.0, 50.0)))
            .unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].command_name, "moveToLevelWithOnOff");
        assert_eq!(sent[0].arg_u64("level"), Some(127));
        assert_eq!(sent[1].command_name, "moveToHueAndSaturation");
        assert_eq!(sent[1].arg_u64("hue"), Some(127));
        assert_eq!(sent[1].arg_u64("saturation"), Some(254));

        let sent = r
            .handle_command(ChannelId::Color, Command::Hsb(Hsb::new(180.0, 100.0, 0.0)))
            .unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].command_name, "off");

        let sent = r.handle_command(ChannelId::Color, Command::Percent(0.0)).unwrap();
        assert_eq!(sent[0].command_name, "off");

        let sent = r.handle_command(ChannelId::Color, Command::OnOff(true)).unwrap();
        assert_eq!(sent[0].command_name, "on");

        let sent = r
            .handle_command(ChannelId::Xy, Command::Hsb(Hsb::new(0.0, 100.0, 100.0)))
            .unwrap();
        assert_eq!(sent[0].command_name, "moveToColor");
    }

    #[test]
    fn test_xy_only_light_gets_move_to_color() {
        let (mut r, _sink) = reconciler();
        report(&mut r, "featureMap", FeatureMap::XY);
        let sent = r
            .handle_command(ChannelId::Color, Command::Hsb(Hsb::new(120.0, 100.0, 100.0)))
            .unwrap();
        assert_eq!(sent[1].command_name, "moveToColor");

        report(&mut r, "featureMap", FeatureMap::COLOR_TEMPERATURE);
        let err = r
            .handle_command(ChannelId::Color, Command::Hsb(Hsb::new(120.0, 100.0, 100.0)))
            .unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedCommand { .. }));
    }

    #[test]
    fn test_unsupported_command_sends_nothing() {
        let (mut r, sink) = reconciler();
        let err = r
            .handle_command(ChannelId::HueSaturation, Command::Kelvin(3000.0))
            .unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedCommand { .. }));
        assert!(sink.commands.lock().is_empty());
    }

    #[test]
    fn test_shutdown_stops_publishing() {
        let (mut r, sink) = reconciler();
        report(&mut r, "currentHue", 127);
        r.shutdown();
        assert!(r.debounce_deadline().is_none());

        report(&mut r, "currentSaturation", 254);
        r.on_debounce_expired();
        assert!(sink.take().is_empty());
        assert!(r.handle_command(ChannelId::Color, Command::OnOff(true)).is_err());
    }
}
