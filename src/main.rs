use log::{error, info};
use matter_color_bridge::config::{self, Config};
use matter_color_bridge::input::mqtt::MqttIntegration;
use matter_color_bridge::input::simulation::{LogSink, run_light_simulation};
use matter_color_bridge::light::{ColorReconciler, LightEndpointHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    // Load .env file before the runtime starts its worker threads
    config::load_dotenv();
    init_logger();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start tokio runtime: {}", e);
            std::process::exit(1);
        }
    };
    runtime.block_on(run());
}

async fn run() {
    info!("Starting Matter Color Bridge");

    let config = Config::from_env();
    info!("Configuration loaded:");
    info!("  Lights: {}", config.lights.endpoints.join(", "));
    info!("  Debounce: {:?}", config.color.debounce());
    info!(
        "  Mired range: {}..{}",
        config.color.min_mireds, config.color.max_mireds
    );
    info!(
        "  MQTT: {}",
        if config.mqtt.enabled {
            format!("{}:{}", config.mqtt.broker_host, config.mqtt.broker_port)
        } else {
            "disabled".to_string()
        }
    );

    let shutdown = CancellationToken::new();
    let mut lights = Vec::new();
    let mut tasks = Vec::new();

    if config.mqtt.enabled {
        let mut integration = MqttIntegration::new(config.mqtt.clone());
        for name in &config.lights.endpoints {
            let reconciler = ColorReconciler::new(
                name.clone(),
                &config.color,
                Arc::new(integration.state_sink(name)),
                Arc::new(integration.command_sink(name)),
            );
            let handle = LightEndpointHandle::spawn(reconciler, shutdown.child_token());
            integration = integration.with_light(handle.sender());
            lights.push(handle);
        }
        tasks.push(integration.start(shutdown.child_token()));
    } else {
        for name in &config.lights.endpoints {
            let sink = Arc::new(LogSink::new(name.clone()));
            let reconciler =
                ColorReconciler::new(name.clone(), &config.color, sink.clone(), sink);
            lights.push(LightEndpointHandle::spawn(reconciler, shutdown.child_token()));
        }
    }

    if config.simulation.enabled {
        let period = Duration::from_secs(config.simulation.interval_secs.max(1));
        for light in &lights {
            tasks.push(run_light_simulation(
                light.sender(),
                period,
                shutdown.child_token(),
            ));
        }
        info!("Light simulation enabled (every {:?})", period);
    }

    info!("Matter Color Bridge is running");
    info!("  - {} light endpoint(s) ready", lights.len());
    info!("  - Press Ctrl+C to exit");

    // Wait for shutdown signal
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal");
        }
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
        }
    }

    shutdown.cancel();
    for task in tasks {
        if let Err(e) = task.await {
            error!("Task failed during shutdown: {}", e);
        }
    }
    for light in lights {
        light.join().await;
    }

    info!("Matter Color Bridge stopped");
}
