//! Intelligence type discovery and dynamic dispatch.
//!
//! Evidence files are scanned into an [`IntelligenceTypeRegistry`], a small
//! set of [`IntelligenceHandler`] implementations is registered against
//! specific type names, and requests are routed through the [`Dispatcher`]
//! (usually via the [`PortalBridge`] façade) to either a handler, a
//! schema-carrying stub, or an "unknown type" answer with suggestions.

pub mod bridge;
pub mod category;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod handlers;
pub mod naming;
pub mod registry;
pub mod schema;

pub use bridge::BridgeResponse;
pub use bridge::PortalBridge;
pub use bridge::PortalType;
pub use config::IntelConfig;
pub use dispatch::Dispatcher;
pub use dispatch::InferenceOutcome;
pub use dispatch::OutcomeStatus;
pub use error::ConfigError;
pub use error::RegistryError;
pub use handler::HandlerMetadata;
pub use handler::InferenceOptions;
pub use handler::IntelligenceHandler;
pub use handler::Priority;
pub use handler::SharedHandler;
pub use registry::DiscoveryStats;
pub use registry::IntelligenceTypeInfo;
pub use registry::IntelligenceTypeRegistry;
pub use registry::TypeFilter;
