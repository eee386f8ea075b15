use super::{GeneratorFuture, TextGenerator};
use crate::errors::{AppError, AppResult};
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

/// Runs an external program per prompt: the prompt goes to stdin, the reply
/// is whatever the program prints on stdout.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    async fn run(&self, prompt: &str) -> AppResult<String> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|error| AppError::Analysis(format!("failed to start {}: {}", self.program, error)))?;

        let stdin = child.stdin.take();
        let write_prompt = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(prompt.as_bytes()).await {
                Ok(()) => Ok(()),
                // A program that never reads its input closes the pipe early.
                Err(error) if error.kind() == ErrorKind::BrokenPipe => Ok(()),
                Err(error) => Err(AppError::Analysis(format!("failed to write prompt: {}", error))),
            }
        };
        // Writing and draining share one deadline.
        let exchange = async {
            let (written, output) = tokio::join!(write_prompt, child.wait_with_output());
            written?;
            output.map_err(|error| AppError::Analysis(error.to_string()))
        };

        let output = timeout(self.timeout, exchange)
            .await
            .map_err(|_| AppError::Analysis(format!("{} timed out after {:?}", self.program, self.timeout)))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Analysis(format!(
                "{} exited with status {:?}: {}",
                self.program,
                output.status.code(),
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if stdout.is_empty() {
            return Err(AppError::Analysis(format!("{} produced no output", self.program)));
        }
        tracing::debug!(program = %self.program, bytes = stdout.len(), "generator replied");
        Ok(stdout)
    }
}

impl TextGenerator for CommandGenerator {
    fn generate<'a>(&'a self, prompt: &'a str) -> GeneratorFuture<'a> {
        Box::pin(self.run(prompt))
    }
}
