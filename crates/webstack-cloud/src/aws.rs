/// External programs the deploy pipeline shells out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Program {
    Aws,
    Docker,
}

impl Program {
    pub fn binary(self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Docker => "docker",
        }
    }
}

fn install_hint(program: &Program) -> &'static str {
    match program {
        Program::Aws => "https://docs.aws.amazon.com/cli/latest/userguide/getting-started-install.html",
        Program::Docker => "https://docs.docker.com/get-docker/",
    }
}

impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.binary())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{program} CLI not found (install: {})", install_hint(.program))]
    NotFound {
        program: Program,
        source: std::io::Error,
    },

    #[error("{program} command failed: {args:?}\n{stderr}")]
    CommandFailed {
        program: Program,
        args: Vec<String>,
        stderr: String,
    },

    #[error("{program} output was not valid UTF-8")]
    InvalidUtf8 {
        program: Program,
        source: std::string::FromUtf8Error,
    },

    #[error("failed to write to {program} stdin")]
    StdinWrite {
        program: Program,
        source: std::io::Error,
    },
}

impl CommandError {
    /// Whether the provider reported the target as absent rather than failing.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::CommandFailed { stderr, .. } => {
                stderr.contains("does not exist")
                    || stderr.contains("NotFoundException")
                    || stderr.contains("NoSuchBucket")
            }
            _ => false,
        }
    }
}
