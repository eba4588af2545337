// NATS integration: broker connection, command publishing, robot traffic ingest

mod client;
mod ingest;
mod publisher;

pub use client::{connect, NatsConfig};
pub use ingest::{TelemetryIngest, COMMAND_NOTIFICATION, ROBOT_NOTIFICATION};
pub use publisher::NatsCommandBus;
