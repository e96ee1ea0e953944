//! A única fronteira pela qual toda chamada de saída deixa o processo.

use std::process::{Command, Stdio};

use super::invocation::{AZ, Invocation};
use crate::error::AbError;
use crate::ui::Spinner;

/// Executa um [`Invocation`] e devolve a saída padrão bruta.
///
/// Cada `AzClient` possui exatamente um executor; os testes constroem o
/// cliente com um falso.
pub trait CommandExecutor {
    fn execute(&self, invocation: &Invocation) -> Result<Vec<u8>, AbError>;
}

impl<F> CommandExecutor for F
where
    F: Fn(&Invocation) -> Result<Vec<u8>, AbError>,
{
    fn execute(&self, invocation: &Invocation) -> Result<Vec<u8>, AbError> {
        self(invocation)
    }
}

/// Executa invocações iniciando o binário `az`.
#[derive(Debug, Clone)]
pub struct AzCli {
    program: String,
    show_progress: bool,
}

impl AzCli {
    pub fn new(show_progress: bool) -> Self {
        Self::with_program(AZ, show_progress)
    }

    /// Inicia `program` no lugar do `az`, com os mesmos argumentos.
    pub fn with_program(program: impl Into<String>, show_progress: bool) -> Self {
        Self {
            program: program.into(),
            show_progress,
        }
    }
}

impl CommandExecutor for AzCli {
    fn execute(&self, invocation: &Invocation) -> Result<Vec<u8>, AbError> {
        let spinner = self
            .show_progress
            .then(|| Spinner::start(&invocation.command_line()));

        let output = Command::new(&self.program)
            .args(invocation.args())
            .stdin(Stdio::null())
            .output();

        if let Some(spinner) = spinner {
            spinner.finish();
        }

        let output = output.map_err(|err| AbError::Execution {
            command: invocation.command_line(),
            cause: err.to_string(),
            stderr: String::new(),
        })?;

        if !output.status.success() {
            return Err(AbError::Execution {
                command: invocation.command_line(),
                cause: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_executors() {
        let exec = |inv: &Invocation| Ok::<_, AbError>(inv.command_line().into_bytes());
        let out = exec
            .execute(&Invocation::other(["boards", "query"]))
            .unwrap();
        assert_eq!(out, b"az boards query");
    }

    #[test]
    fn missing_program_is_an_execution_error() {
        let cli = AzCli::with_program("ab-test-no-such-binary", false);
        let inv = Invocation::work_item("show").flag("--id", "1");
        match cli.execute(&inv).unwrap_err() {
            AbError::Execution {
                command,
                cause,
                stderr,
            } => {
                assert_eq!(command, "az boards work-item show --id 1");
                assert!(!cause.is_empty());
                assert!(stderr.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_carries_status_and_stderr() {
        let cli = AzCli::with_program("sh", false);
        let inv = Invocation::other(["-c", "echo oops >&2; exit 3"]);
        match cli.execute(&inv).unwrap_err() {
            AbError::Execution {
                command,
                cause,
                stderr,
            } => {
                assert_eq!(command, inv.command_line());
                assert!(cause.contains('3'), "{cause}");
                assert_eq!(stderr.trim(), "oops");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn successful_run_returns_stdout() {
        let cli = AzCli::with_program("sh", false);
        let out = cli
            .execute(&Invocation::other(["-c", "printf '[]'"]))
            .unwrap();
        assert_eq!(out, b"[]");
    }

    #[test]
    fn boxed_executor_dispatches() {
        let exec: Box<dyn CommandExecutor> = Box::new(|_: &Invocation| -> Result<Vec<u8>, AbError> {
            Err(AbError::Execution {
                command: "az".into(),
                cause: "boom".into(),
                stderr: String::new(),
            })
        });
        let err = exec.execute(&Invocation::other(["version"])).unwrap_err();
        assert_eq!(err.to_string(), "az failed: boom");
    }
}
