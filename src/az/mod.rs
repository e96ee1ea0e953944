//! Tudo que conversa com a ferramenta de linha de comando `az`.

mod client;
mod executor;
mod gate;
mod invocation;
pub mod types;

pub use client::AzClient;
pub use executor::{AzCli, CommandExecutor};
pub use gate::{ConfirmationPolicy, Prompter, TermPrompter};
pub use invocation::Invocation;
pub use types::{BoardColumn, Severity, WorkItem};
