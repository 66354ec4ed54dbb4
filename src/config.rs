use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
///
/// Must run before the tokio runtime (or any other thread) is started.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    if !env_path.exists() {
        return;
    }

    let content = match fs::read_to_string(env_path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for (key, value) in parse_dotenv(&content) {
        // Only set if not already set (env vars take precedence)
        if std::env::var(key).is_err() {
            // SAFETY: callers run this before spawning any thread, see above
            unsafe { std::env::set_var(key, value) };
        }
    }
}

/// Split `.env` content into key/value pairs, skipping comments and blanks.
fn parse_dotenv(content: &str) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Find the first '=' and split there
        if let Some(eq_pos) = line.find('=') {
            let key = line[..eq_pos].trim();
            let mut value = line[eq_pos + 1..].trim();

            // Remove surrounding quotes if present
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = &value[1..value.len() - 1];
            }

            pairs.push((key, value));
        }
    }

    pairs
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub mqtt: MqttConfig,
    pub color: ColorConfig,
    pub lights: LightsConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    pub enabled: bool,
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Root of all light topics, e.g. `matter-color/<endpoint>/attributes`
    pub topic_prefix: String,
}

/// Tuning for the color reconciler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorConfig {
    /// How long a half-complete hue/saturation or XY pair may wait for its partner.
    pub debounce_ms: u64,
    /// Transition time sent with outbound color commands, in tenths of a second.
    pub transition_time: u16,
    /// Physical mired range assumed until the device reports its own.
    pub min_mireds: u16,
    pub max_mireds: u16,
}

impl ColorConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightsConfig {
    /// Endpoint names; each one gets its own reconciler and topic subtree.
    pub endpoints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mqtt: MqttConfig {
                enabled: true,
                broker_host: "10.0.0.2".to_string(),
                broker_port: 1883,
                client_id: "matter-color-bridge".to_string(),
                username: None,
                password: None,
                topic_prefix: "matter-color".to_string(),
            },
            color: ColorConfig {
                debounce_ms: 500,
                transition_time: 0,
                min_mireds: 153,
                max_mireds: 500,
            },
            lights: LightsConfig {
                endpoints: vec!["light-1".to_string()],
            },
            simulation: SimulationConfig {
                enabled: false,
                interval_secs: 10,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup (environment in production).
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        // MQTT configuration
        if let Some(enabled) = var("MQTT_ENABLED") {
            config.mqtt.enabled = parse_bool(&enabled).unwrap_or(config.mqtt.enabled);
        }
        if let Some(host) = var("MQTT_BROKER_HOST") {
            config.mqtt.broker_host = host;
        }
        if let Some(port) = var("MQTT_BROKER_PORT")
            && let Ok(p) = port.parse()
        {
            config.mqtt.broker_port = p;
        }
        if let Some(client_id) = var("MQTT_CLIENT_ID") {
            config.mqtt.client_id = client_id;
        }
        if let Some(username) = var("MQTT_USERNAME") {
            config.mqtt.username = Some(username);
        }
        if let Some(password) = var("MQTT_PASSWORD") {
            config.mqtt.password = Some(password);
        }
        if let Some(prefix) = var("MQTT_TOPIC_PREFIX") {
            config.mqtt.topic_prefix = prefix.trim_end_matches('/').to_string();
        }

        // Color reconciler tuning
        if let Some(ms) = var("COLOR_DEBOUNCE_MS")
            && let Ok(ms) = ms.parse()
        {
            config.color.debounce_ms = ms;
        }
        if let Some(tt) = var("COLOR_TRANSITION_TIME")
            && let Ok(tt) = tt.parse()
        {
            config.color.transition_time = tt;
        }
        if let Some(min) = var("COLOR_MIN_MIREDS")
            && let Ok(min) = min.parse()
        {
            config.color.min_mireds = min;
        }
        if let Some(max) = var("COLOR_MAX_MIREDS")
            && let Ok(max) = max.parse()
        {
            config.color.max_mireds = max;
        }
        if config.color.min_mireds >= config.color.max_mireds {
            log::warn!(
                "Ignoring invalid mired range {}..{}",
                config.color.min_mireds,
                config.color.max_mireds
            );
            config.color.min_mireds = 153;
            config.color.max_mireds = 500;
        }

        if let Some(endpoints) = var("LIGHT_ENDPOINTS") {
            let endpoints: Vec<String> = endpoints
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect();
            if !endpoints.is_empty() {
                config.lights.endpoints = endpoints;
            }
        }

        // Simulation
        if let Some(enabled) = var("SIMULATION") {
            config.simulation.enabled =
                parse_bool(&enabled).unwrap_or(config.simulation.enabled);
        }
        if let Some(secs) = var("SIMULATION_INTERVAL_SECS")
            && let Ok(secs) = secs.parse()
        {
            config.simulation.interval_secs = secs;
        }

        config
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
