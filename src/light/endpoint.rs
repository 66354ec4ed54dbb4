//! One task per light endpoint.
//!
//! Every event for an endpoint goes through its inbox, so reports, commands
//! and the debounce expiry are handled strictly one at a time by the task
//! owning the [`ColorReconciler`].

use super::channel::{ChannelId, Command};
use super::debounce::sleep_until_deadline;
use super::reconciler::ColorReconciler;
use crate::error::{BridgeError, Result};
use crate::matter::AttributeReport;
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const INBOX_CAPACITY: usize = 64;

#[derive(Debug)]
pub enum EndpointEvent {
    Attribute(AttributeReport),
    /// Full-state read, e.g. after the controller reconnected
    Refresh(Vec<AttributeReport>),
    Command { channel: ChannelId, command: Command },
}

/// Cloneable handle for feeding events to an endpoint task.
#[derive(Clone, Debug)]
pub struct EndpointSender {
    name: String,
    tx: mpsc::Sender<EndpointEvent>,
}

impl EndpointSender {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn send(&self, event: EndpointEvent) -> Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| BridgeError::EndpointClosed(self.name.clone()))
    }

    pub async fn send_attribute(&self, report: AttributeReport) -> Result<()> {
        self.send(EndpointEvent::Attribute(report)).await
    }

    pub async fn refresh(&self, reports: Vec<AttributeReport>) -> Result<()> {
        self.send(EndpointEvent::Refresh(reports)).await
    }

    pub async fn send_command(&self, channel: ChannelId, command: Command) -> Result<()> {
        self.send(EndpointEvent::Command { channel, command }).await
    }
}

pub struct LightEndpointHandle {
    sender: EndpointSender,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl LightEndpointHandle {
    /// Start the endpoint task. It runs until `shutdown` is cancelled or
    /// every sender is dropped.
    pub fn spawn(reconciler: ColorReconciler, shutdown: CancellationToken) -> Self {
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        let sender = EndpointSender {
            name: reconciler.name().to_string(),
            tx,
        };
        let task = tokio::spawn(run(reconciler, rx, shutdown.clone()));
        Self {
            sender,
            shutdown,
            task,
        }
    }

    pub fn sender(&self) -> EndpointSender {
        self.sender.clone()
    }

    pub async fn send_attribute(&self, report: AttributeReport) -> Result<()> {
        self.sender.send_attribute(report).await
    }

    pub async fn refresh(&self, reports: Vec<AttributeReport>) -> Result<()> {
        self.sender.refresh(reports).await
    }

    pub async fn send_command(&self, channel: ChannelId, command: Command) -> Result<()> {
        self.sender.send_command(channel, command).await
    }

    /// Stop the task; a pending debounced publish is dropped with it.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Wait for the task to finish. Cancel its token (or drop all senders)
    /// first.
    pub async fn join(self) {
        let name = self.sender.name.clone();
        drop(self.sender);
        if let Err(e) = self.task.await {
            warn!("[Light] {} task failed: {}", name, e);
        }
    }
}

async fn run(
    mut reconciler: ColorReconciler,
    mut rx: mpsc::Receiver<EndpointEvent>,
    shutdown: CancellationToken,
) {
    info!("[Light] {} started", reconciler.name());

    loop {
        let deadline = reconciler.debounce_deadline();

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                debug!("[Light] {} shutting down", reconciler.name());
                break;
            }
            event = rx.recv() => match event {
                Some(event) => handle_event(&mut reconciler, event),
                None => {
                    debug!("[Light] {} inbox closed", reconciler.name());
                    break;
                }
            },
            _ = sleep_until_deadline(deadline) => reconciler.on_debounce_expired(),
        }
    }

    reconciler.shutdown();
    info!("[Light] {} stopped", reconciler.name());
}

fn handle_event(reconciler: &mut ColorReconciler, event: EndpointEvent) {
    match event {
        EndpointEvent::Attribute(report) => reconciler.on_attribute_changed(&report),
        EndpointEvent::Refresh(reports) => reconciler.refresh(&reports),
        EndpointEvent::Command { channel, command } => {
            if let Err(e) = reconciler.handle_command(channel, command) {
                warn!(
                    "[Light] {}: {} command rejected: {}",
                    reconciler.name(),
                    channel,
                    e
                );
            }
        }
    }
}
