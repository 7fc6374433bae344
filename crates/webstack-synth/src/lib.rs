//! CloudFormation rendering and the on-disk cloud assembly for webstack.
//!
//! # Synth pipeline
//!
//! ```text
//! webstack synth
//!   1. Lookups    ── webstack.context.json (or the provider on --refresh)
//!   2. Declaration ── DeclarationBuilder::build() + validate()
//!   3. Templates  ── TemplateRenderer::render()
//!   4. Assembly   ── .webstack/<stack>.template.json + manifest.json
//! ```
//!
//! # Stacks
//!
//! Resources land in one main stack in the configured region. Certificates
//! that must live elsewhere (CloudFront only accepts `us-east-1`) are
//! rendered into `<stack>-certificates-<region>` stacks deployed first;
//! the main stack receives their ARNs as parameters.

pub mod assembly;
pub mod template;

pub use assembly::{Manifest, ManifestStack, read_manifest, write_assembly};
pub use template::{ImageAsset, ParameterBinding, StackTemplate, SynthError, Synthesis, TemplateRenderer};
