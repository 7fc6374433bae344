mod deploy;
mod destroy;
mod doctor;
mod init;
mod logs;
mod outputs;
mod status;
mod synth;

use std::path::{Path, PathBuf};

use webstack_synth::Manifest;
use webstack_synth::assembly::AssemblyError;

pub use deploy::deploy;
pub use destroy::destroy;
pub use doctor::doctor;
pub use init::init_project;
pub use logs::logs;
pub use outputs::outputs;
pub use status::status;
pub use synth::synth;

pub(crate) fn project_dir() -> PathBuf {
    PathBuf::from(".")
}

/// The manifest of the last synth, or `None` if nothing was synthesized yet.
pub(crate) fn existing_manifest(project_dir: &Path) -> anyhow::Result<Option<Manifest>> {
    match webstack_synth::read_manifest(project_dir) {
        Ok(manifest) => Ok(Some(manifest)),
        Err(AssemblyError::Read { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Stack names and regions, main stack first.
///
/// Falls back to the configured stack alone when there is no assembly.
pub(crate) fn known_stacks(
    config: &webstack_core::WebstackConfig,
    manifest: Option<&Manifest>,
) -> Vec<(String, String)> {
    match manifest {
        Some(manifest) => manifest
            .stacks
            .iter()
            .rev()
            .map(|s| (s.stack_name.clone(), s.region.clone()))
            .collect(),
        None => vec![(config.stack.name.clone(), config.stack.region.clone())],
    }
}
