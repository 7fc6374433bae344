use std::process::Stdio;

use crate::aws::{CommandError, Program};

/// Abstraction over external CLI execution for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
#[allow(async_fn_in_trait)]
pub trait CommandExecutor: Send + Sync {
    /// Execute a command and capture stdout.
    async fn exec(&self, program: Program, args: &[String]) -> Result<String, CommandError>;

    /// Execute a command, streaming output to the terminal.
    async fn exec_streaming(&self, program: Program, args: &[String])
    -> Result<(), CommandError>;

    /// Execute a command with data piped to stdin.
    async fn exec_with_stdin(
        &self,
        program: Program,
        args: &[String],
        stdin_data: &[u8],
    ) -> Result<String, CommandError>;
}

/// Runs the real `aws` and `docker` binaries.
pub struct RealExecutor;

impl RealExecutor {
    fn command(program: Program, args: &[String]) -> tokio::process::Command {
        tracing::debug!(%program, ?args, "exec");
        let mut cmd = tokio::process::Command::new(program.binary());
        cmd.args(args);
        if program == Program::Aws {
            // JSON output is parsed; never page or prompt.
            cmd.env("AWS_PAGER", "");
        }
        cmd
    }

    fn finish(
        program: Program,
        args: &[String],
        output: std::process::Output,
    ) -> Result<String, CommandError> {
        if output.status.success() {
            String::from_utf8(output.stdout)
                .map_err(|e| CommandError::InvalidUtf8 { program, source: e })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            Err(CommandError::CommandFailed {
                program,
                args: args.to_vec(),
                stderr,
            })
        }
    }
}

impl CommandExecutor for RealExecutor {
    async fn exec(&self, program: Program, args: &[String]) -> Result<String, CommandError> {
        let output = Self::command(program, args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| CommandError::NotFound { program, source: e })?;

        Self::finish(program, args, output)
    }

    async fn exec_streaming(
        &self,
        program: Program,
        args: &[String],
    ) -> Result<(), CommandError> {
        let status = Self::command(program, args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| CommandError::NotFound { program, source: e })?;

        if status.success() {
            Ok(())
        } else {
            Err(CommandError::CommandFailed {
                program,
                args: args.to_vec(),
                stderr: format!("exit code: {status}"),
            })
        }
    }

    async fn exec_with_stdin(
        &self,
        program: Program,
        args: &[String],
        stdin_data: &[u8],
    ) -> Result<String, CommandError> {
        use tokio::io::AsyncWriteExt;

        let mut child = Self::command(program, args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CommandError::NotFound { program, source: e })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(stdin_data)
                .await
                .map_err(|e| CommandError::StdinWrite { program, source: e })?;
            stdin
                .shutdown()
                .await
                .map_err(|e| CommandError::StdinWrite { program, source: e })?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| CommandError::NotFound { program, source: e })?;

        Self::finish(program, args, output)
    }
}
