//! Política de confirmação e o prompt que a aplica.

use std::fmt;
use std::io;
use std::str::FromStr;

use console::Term;

use super::invocation::Invocation;
use crate::error::AbError;

/// Quando uma chamada de saída precisa de aprovação explícita antes do envio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmationPolicy {
    Always,
    #[default]
    OnMutation,
    Never,
}

impl ConfirmationPolicy {
    pub fn should_confirm(self, invocation: &Invocation) -> bool {
        match self {
            ConfirmationPolicy::Always => true,
            ConfirmationPolicy::Never => false,
            ConfirmationPolicy::OnMutation => invocation.is_mutating(),
        }
    }

    /// Interpreta o modo informado pelo usuário. Entrada vazia mantém `current`.
    pub fn parse_or(current: Self, raw: &str) -> Result<Self, AbError> {
        if raw.trim().is_empty() {
            Ok(current)
        } else {
            raw.parse()
        }
    }
}

impl FromStr for ConfirmationPolicy {
    type Err = AbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" | "all" | "true" | "on" | "1" | "yes" | "y" => Ok(ConfirmationPolicy::Always),
            "mutations" | "mutation" | "writes" | "write" | "updates" | "changes" => {
                Ok(ConfirmationPolicy::OnMutation)
            }
            "never" | "none" | "false" | "off" | "0" | "no" | "n" => Ok(ConfirmationPolicy::Never),
            _ => Err(AbError::InvalidConfirmMode(s.to_string())),
        }
    }
}

impl fmt::Display for ConfirmationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfirmationPolicy::Always => write!(f, "always"),
            ConfirmationPolicy::OnMutation => write!(f, "mutations"),
            ConfirmationPolicy::Never => write!(f, "never"),
        }
    }
}

/// A parte do portão voltada ao usuário: o eco antes do envio e a pergunta
/// sim/não.
pub trait Prompter {
    fn echo(&self, command_line: &str);

    /// Pede aprovação. `Ok(false)` e `Err` abortam a chamada.
    fn confirm(&self, question: &str) -> io::Result<bool>;
}

/// Pergunta no stderr do terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TermPrompter;

impl Prompter for TermPrompter {
    fn echo(&self, command_line: &str) {
        eprintln!("{command_line}");
    }

    fn confirm(&self, question: &str) -> io::Result<bool> {
        let term = Term::stderr();
        term.write_str(&format!("{question} [y/N]: "))?;
        let answer = term.read_line()?;
        Ok(is_affirmative(&answer))
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<Invocation> {
        vec![
            Invocation::rest(Some("GET"), "https://dev.azure.com/x"),
            Invocation::rest(Some("POST"), "https://dev.azure.com/x"),
            Invocation::work_item("show").flag("--id", "1"),
            Invocation::work_item("update").flag("--id", "1"),
            Invocation::work_item_relation("add"),
            Invocation::other(["boards", "query"]),
        ]
    }

    #[test]
    fn on_mutation_follows_classification() {
        let expected = [false, true, false, true, true, false];
        for (inv, want) in samples().iter().zip(expected) {
            assert_eq!(
                ConfirmationPolicy::OnMutation.should_confirm(inv),
                want,
                "{}",
                inv.command_line()
            );
        }
    }

    #[test]
    fn always_and_never_ignore_shape() {
        for inv in samples() {
            assert!(ConfirmationPolicy::Always.should_confirm(&inv));
            assert!(!ConfirmationPolicy::Never.should_confirm(&inv));
        }
    }

    #[test]
    fn parses_aliases() {
        for raw in ["always", "ALL", " on ", "1", "y"] {
            assert_eq!(raw.parse::<ConfirmationPolicy>().unwrap(), ConfirmationPolicy::Always);
        }
        for raw in ["mutations", "Writes", "changes"] {
            assert_eq!(raw.parse::<ConfirmationPolicy>().unwrap(), ConfirmationPolicy::OnMutation);
        }
        for raw in ["never", "none", "OFF", "0", "n"] {
            assert_eq!(raw.parse::<ConfirmationPolicy>().unwrap(), ConfirmationPolicy::Never);
        }
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = "sometimes".parse::<ConfirmationPolicy>().unwrap_err();
        assert!(matches!(err, AbError::InvalidConfirmMode(ref m) if m == "sometimes"));
    }

    #[test]
    fn blank_keeps_current() {
        let kept = ConfirmationPolicy::parse_or(ConfirmationPolicy::Never, "  ").unwrap();
        assert_eq!(kept, ConfirmationPolicy::Never);
        let changed = ConfirmationPolicy::parse_or(ConfirmationPolicy::Never, "always").unwrap();
        assert_eq!(changed, ConfirmationPolicy::Always);
    }

    #[test]
    fn display_round_trips() {
        for policy in [
            ConfirmationPolicy::Always,
            ConfirmationPolicy::OnMutation,
            ConfirmationPolicy::Never,
        ] {
            assert_eq!(policy.to_string().parse::<ConfirmationPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn only_yes_is_affirmative() {
        assert!(is_affirmative("y\n"));
        assert!(is_affirmative(" YES "));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative("yep"));
    }
}
