//! Core types and configuration for webstack.
//!
//! This crate defines the `webstack.toml` schema ([`WebstackConfig`]),
//! resolution of pre-existing resources ([`resolve_network`],
//! [`resolve_hosted_zone`]), the typed resource model, and the validated
//! deployment [`Declaration`] assembled by [`DeclarationBuilder`].

pub mod builder;
pub mod config;
pub mod context;
pub mod declaration;
pub mod error;
pub mod lookup;
pub mod resource;

pub use builder::DeclarationBuilder;
pub use config::{
    DISTRIBUTION_CERTIFICATE_REGION, DatabaseConfig, DnsConfig, FrontendConfig, NetworkConfig,
    RouteConfig, RouteOrigin, ServiceConfig, StackConfig, WebstackConfig,
};
pub use context::LookupContext;
pub use declaration::Declaration;
pub use error::{Error, Result};
pub use lookup::{HostedZoneCandidate, NetworkCandidate, resolve_hosted_zone, resolve_network};
pub use resource::{LogicalId, Resource, ResourceKind};
