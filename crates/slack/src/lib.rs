//! Slack integration for huddle: an HTTP Web API client plus the gateway
//! traits the rest of the system talks through. A noop gateway stands in
//! when no bot token is configured.

pub mod api;
pub mod gateway;
pub mod messages;

pub use api::SlackApiClient;
pub use gateway::{GatewayError, MessageGateway, NoopGateway, TimezoneDirectory};
