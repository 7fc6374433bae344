use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::template::{ImageAsset, ParameterBinding, Synthesis};

/// Directory (relative to the project) holding the synthesized output.
pub const ASSEMBLY_DIR: &str = ".webstack";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Index of a written assembly; `deploy` and `destroy` work from this alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// In deploy order. Destroy walks it backwards.
    pub stacks: Vec<ManifestStack>,
    #[serde(default)]
    pub assets: Vec<ImageAsset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestStack {
    pub stack_name: String,
    pub region: String,
    /// Template file name inside the assembly directory.
    pub template: String,
    #[serde(default)]
    pub parameters: Vec<ParameterBinding>,
    #[serde(default)]
    pub auto_delete_buckets: Vec<String>,
}

impl Manifest {
    pub fn main_stack(&self) -> Option<&ManifestStack> {
        self.stacks.last()
    }
}

pub fn assembly_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(ASSEMBLY_DIR)
}

/// Writes every template plus the manifest, replacing any previous assembly.
pub fn write_assembly(project_dir: &Path, synthesis: &Synthesis) -> Result<Manifest, AssemblyError> {
    let dir = assembly_dir(project_dir);

    if dir.exists() {
        std::fs::remove_dir_all(&dir).map_err(|e| AssemblyError::Cleanup {
            path: dir.clone(),
            source: e,
        })?;
    }
    std::fs::create_dir_all(&dir).map_err(|e| AssemblyError::Create {
        path: dir.clone(),
        source: e,
    })?;

    let mut stacks = Vec::with_capacity(synthesis.stacks.len());
    for stack in &synthesis.stacks {
        let file_name = format!("{}.template.json", stack.stack_name);
        let path = dir.join(&file_name);
        write_json(&path, &stack.template)?;
        tracing::debug!(stack = %stack.stack_name, path = %path.display(), "wrote template");

        stacks.push(ManifestStack {
            stack_name: stack.stack_name.clone(),
            region: stack.region.clone(),
            template: file_name,
            parameters: stack.parameters.clone(),
            auto_delete_buckets: stack.auto_delete_buckets.clone(),
        });
    }

    let manifest = Manifest {
        stacks,
        assets: synthesis.assets.clone(),
    };
    write_json(&dir.join(MANIFEST_FILE), &manifest)?;
    Ok(manifest)
}

pub fn read_manifest(project_dir: &Path) -> Result<Manifest, AssemblyError> {
    let path = assembly_dir(project_dir).join(MANIFEST_FILE);
    let content = std::fs::read_to_string(&path).map_err(|e| AssemblyError::Read {
        path: path.clone(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| AssemblyError::Parse { path, source: e })
}

/// Absolute path of a stack's template inside the assembly.
pub fn template_path(project_dir: &Path, stack: &ManifestStack) -> PathBuf {
    assembly_dir(project_dir).join(&stack.template)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AssemblyError> {
    let mut content = serde_json::to_string_pretty(value).map_err(|e| AssemblyError::Encode {
        path: path.to_path_buf(),
        source: e,
    })?;
    content.push('\n');
    std::fs::write(path, content).map_err(|e| AssemblyError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("failed to clean up assembly directory {path}")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create directory {path}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode {path}")]
    Encode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("no assembly at {path}; run `webstack synth` first")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse manifest {path}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}
