use std::fmt;

use crate::error::{AbError, Edge};

/// Progressão Kanban canônica, usada salvo configuração em contrário.
pub const KANBAN_COLUMNS: [&str; 7] = [
    "Backlog",
    "Ready for Development",
    "In Process",
    "Ready to Test",
    "In Test",
    "Deploy",
    "Done",
];

/// Estados do processo Agile padrão, selecionados com `--default-columns`.
pub const AGILE_COLUMNS: [&str; 4] = ["New", "Active", "Resolved", "Closed"];

/// Sentido em que um work item percorre o quadro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}

/// Movimento calculado entre duas colunas adjacentes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMove {
    pub from: String,
    pub to: String,
}

/// Lista ordenada e sem duplicatas das colunas do quadro.
///
/// Construída uma vez a partir da configuração e nunca alterada depois.
/// Movimentos ocorrem apenas entre entradas adjacentes, sem volta ao início
/// e sem saltos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSequence {
    columns: Vec<String>,
}

impl Default for ColumnSequence {
    fn default() -> Self {
        Self::kanban()
    }
}

impl ColumnSequence {
    /// Cria uma sequência personalizada. Falha com lista vazia ou nome repetido.
    pub fn new<I, S>(columns: I) -> Result<Self, AbError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(AbError::Config("column list is empty".into()));
        }
        for (idx, column) in columns.iter().enumerate() {
            if columns[..idx].contains(column) {
                return Err(AbError::Config(format!("duplicate column {column:?}")));
            }
        }
        Ok(Self { columns })
    }

    pub fn kanban() -> Self {
        Self::from_static(&KANBAN_COLUMNS)
    }

    pub fn agile() -> Self {
        Self::from_static(&AGILE_COLUMNS)
    }

    fn from_static(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    /// Interpreta uma lista separada por vírgulas. Espaços são removidos e
    /// entradas vazias ignoradas.
    pub fn from_csv(csv: &str) -> Result<Self, AbError> {
        let columns: Vec<&str> = csv
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect();
        if columns.is_empty() {
            return Err(AbError::Config(format!(
                "{csv:?} contained no valid column names"
            )));
        }
        Self::new(columns)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.columns
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// A coluna seguinte a `current`.
    pub fn next(&self, current: &str) -> Result<&str, AbError> {
        let idx = self.position(current)?;
        self.columns
            .get(idx + 1)
            .map(String::as_str)
            .ok_or_else(|| AbError::BoundaryReached {
                column: current.to_string(),
                edge: Edge::Last,
            })
    }

    /// A coluna anterior a `current`.
    pub fn previous(&self, current: &str) -> Result<&str, AbError> {
        let idx = self.position(current)?;
        idx.checked_sub(1)
            .map(|prev| self.columns[prev].as_str())
            .ok_or_else(|| AbError::BoundaryReached {
                column: current.to_string(),
                edge: Edge::First,
            })
    }

    /// Calcula o movimento adjacente a partir de `current` no sentido dado.
    pub fn step(&self, current: &str, direction: Direction) -> Result<ColumnMove, AbError> {
        let to = match direction {
            Direction::Forward => self.next(current)?,
            Direction::Backward => self.previous(current)?,
        };
        Ok(ColumnMove {
            from: current.to_string(),
            to: to.to_string(),
        })
    }

    // Comparação exata, sensível a maiúsculas.
    fn position(&self, current: &str) -> Result<usize, AbError> {
        self.columns
            .iter()
            .position(|c| c == current)
            .ok_or_else(|| AbError::UnknownColumn(current.to_string()))
    }
}

impl fmt::Display for ColumnSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_slice().join(" → "))
    }
}
