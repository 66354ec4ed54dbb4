//! Development tool that plays a Matter controller against the bridge.
//!
//! Publishes attribute reports the way a controller subscription delivers
//! them, including hue and saturation split over separate messages.
//!
//! Usage:
//!   cargo run --bin color-burst -- hue-saturation 127 254 --gap-ms 50
//!   cargo run --bin color-burst -- hue 30
//!   cargo run --bin color-burst -- temperature 370
//!   cargo run --bin color-burst -- on-off off

use clap::{Parser, Subcommand};
use log::{info, warn};
use matter_color_bridge::config::{self, Config};
use matter_color_bridge::input::mqtt::{MqttClient, MqttEvent, Topics};
use rumqttc::QoS;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "color-burst")]
#[command(about = "Publish Matter color attribute bursts for the color bridge")]
struct Cli {
    /// Light endpoint to address
    #[arg(long, env = "COLOR_BURST_ENDPOINT", default_value = "light-1")]
    endpoint: String,

    /// Delay between messages of a split report
    #[arg(long, default_value_t = 50)]
    gap_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hue then saturation as two separate messages
    HueSaturation { hue: u8, saturation: u8 },
    /// A lone hue change (exercises the debounce)
    Hue { hue: u8 },
    /// Switch to color temperature mode
    Temperature { mireds: u16 },
    /// Switch to XY mode, X then Y as two messages
    Xy { x: u16, y: u16 },
    /// onOff attribute
    OnOff {
        #[arg(value_parser = parse_on_off, action = clap::ArgAction::Set)]
        state: bool,
    },
}

fn parse_on_off(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => Err(format!("expected on or off, got {}", other)),
    }
}

impl Commands {
    fn messages(&self) -> Vec<Value> {
        match *self {
            Self::HueSaturation { hue, saturation } => vec![
                json!({ "colorMode": 0, "currentHue": hue }),
                json!({ "currentSaturation": saturation }),
            ],
            Self::Hue { hue } => vec![json!({ "currentHue": hue })],
            Self::Temperature { mireds } => {
                vec![json!({ "colorMode": 2, "colorTemperatureMireds": mireds })]
            }
            Self::Xy { x, y } => vec![
                json!({ "colorMode": 1, "currentX": x }),
                json!({ "currentY": y }),
            ],
            Self::OnOff { state } => vec![json!({ "onOff": state })],
        }
    }
}

fn main() {
    // Load .env file before the runtime starts its worker threads
    config::load_dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            warn!("Failed to start tokio runtime: {}", e);
            std::process::exit(1);
        }
    };
    runtime.block_on(run(cli));
}

async fn run(cli: Cli) {
    let config = Config::from_env();
    let topics = Topics::new(config.mqtt.topic_prefix.clone());
    let topic = topics.attributes(&cli.endpoint);

    info!(
        "Connecting to MQTT broker at {}:{}",
        config.mqtt.broker_host, config.mqtt.broker_port
    );
    let mut mqtt = config.mqtt.clone();
    mqtt.client_id = format!("{}-burst", mqtt.client_id);
    let mqtt_client = MqttClient::new(&mqtt);
    let client = mqtt_client.client();

    let (event_tx, mut event_rx) = mpsc::channel(16);
    let mqtt_loop = tokio::spawn(mqtt_client.run(event_tx));

    // Wait for the connection (with timeout)
    let connected = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(event) = event_rx.recv().await {
            if matches!(event, MqttEvent::Connected) {
                return true;
            }
        }
        false
    })
    .await;
    if !matches!(connected, Ok(true)) {
        warn!("Could not connect to the broker");
        mqtt_loop.abort();
        return;
    }

    let messages = cli.command.messages();
    let count = messages.len();
    for (i, message) in messages.into_iter().enumerate() {
        let payload = message.to_string();
        info!("{} <- {}", topic, payload);
        if let Err(e) = client
            .publish(&topic, QoS::AtLeastOnce, false, payload.into_bytes())
            .await
        {
            warn!("Failed to publish: {}", e);
        }
        if i + 1 < count {
            tokio::time::sleep(Duration::from_millis(cli.gap_ms)).await;
        }
    }

    // Let the event loop flush the publishes
    tokio::time::sleep(Duration::from_millis(500)).await;
    if let Err(e) = client.disconnect().await {
        warn!("Disconnect failed: {}", e);
    }
    mqtt_loop.abort();
}
