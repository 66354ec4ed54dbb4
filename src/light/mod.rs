//! Color light endpoints: attribute reconciliation and channel publishing.

pub mod channel;
pub mod debounce;
pub mod endpoint;
pub mod reconciler;
pub mod state;

pub use channel::{ChannelId, ChannelState, Command, CommandSink, StateSink};
pub use endpoint::{EndpointEvent, EndpointSender, LightEndpointHandle};
pub use reconciler::ColorReconciler;
pub use state::{ColorModel, LightState};
