//! Configuração do `ab` carregada de `ab.toml`, sobreposta pelo ambiente e
//! pelas flags da linha de comando.
//!
//! [`AbConfig`] espelha o arquivo; chaves ausentes usam valores padrão.
//! [`Settings`] é o valor resolvido e imutável que o resto do programa
//! recebe. Precedência, da menor para a maior: padrões, `ab.toml`, ambiente,
//! flags.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::az::ConfirmationPolicy;
use crate::board::ColumnSequence;
use crate::cli::Cli;
use crate::error::AbError;

pub const CONFIG_FILE: &str = "ab.toml";

pub const ENV_CONFIRM: &str = "AB_CONFIRM";
pub const ENV_COLUMNS: &str = "AB_COLUMNS";
pub const ENV_PO_ORDER: [&str; 2] = ["AB_PO_ORDER", "AB_STACKRANK"];

/// Progressões de colunas embutidas, selecionáveis pelo nome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnPreset {
    #[default]
    Kanban,
    Agile,
}

/// Configuração de nível superior carregada de `ab.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct AbConfig {
    /// Modo de confirmação: always, mutations ou never (e apelidos).
    #[serde(default = "default_confirm")]
    pub confirm: String,

    /// Suprime o eco de cada comando `az` antes do envio.
    #[serde(default)]
    pub silent: bool,

    /// Ordena listagens pela prioridade do backlog quando possível.
    #[serde(default)]
    pub po_order: bool,

    /// Progressão de colunas personalizada. Tem precedência sobre `column_preset`.
    #[serde(default)]
    pub columns: Vec<String>,

    #[serde(default)]
    pub column_preset: ColumnPreset,

    /// Tipos de work item ordenados por stack rank com PO order.
    #[serde(default = "default_ranked_types")]
    pub ranked_types: Vec<String>,
}

fn default_confirm() -> String {
    "mutations".to_string()
}

fn default_ranked_types() -> Vec<String> {
    vec!["User Story".to_string(), "Bug".to_string()]
}

impl Default for AbConfig {
    fn default() -> Self {
        Self {
            confirm: default_confirm(),
            silent: false,
            po_order: false,
            columns: Vec::new(),
            column_preset: ColumnPreset::default(),
            ranked_types: default_ranked_types(),
        }
    }
}

fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

impl AbConfig {
    /// Carrega `ab.toml` do diretório atual e aplica o ambiente do processo.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(Path::new(CONFIG_FILE))?;
        config
            .apply_env(|key| std::env::var(key).ok())
            .context("invalid environment configuration")?;
        Ok(config)
    }

    /// Carrega um arquivo de configuração, ou os padrões se ele não existir.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = toml::from_str::<AbConfig>(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Sobrepõe variáveis de ambiente lidas por `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), AbError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup(ENV_CONFIRM).filter(|v| !v.trim().is_empty()) {
            self.confirm = mode.trim().to_string();
        }
        if let Some(csv) = lookup(ENV_COLUMNS).filter(|v| !v.trim().is_empty()) {
            let parsed = ColumnSequence::from_csv(&csv)
                .map_err(|_| AbError::Config(format!("{ENV_COLUMNS} contained no valid column names")))?;
            self.columns = parsed.as_slice().to_vec();
        }
        if ENV_PO_ORDER
            .iter()
            .any(|key| lookup(key).is_some_and(|v| truthy(&v)))
        {
            self.po_order = true;
        }
        Ok(())
    }

    fn column_sequence(&self) -> Result<ColumnSequence, AbError> {
        if !self.columns.is_empty() {
            return ColumnSequence::new(self.columns.iter().map(|c| c.trim()));
        }
        Ok(match self.column_preset {
            ColumnPreset::Kanban => ColumnSequence::kanban(),
            ColumnPreset::Agile => ColumnSequence::agile(),
        })
    }
}

/// Configuração resolvida, fixa durante a execução de um comando.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub policy: ConfirmationPolicy,
    pub silent: bool,
    pub po_order: bool,
    pub columns: ColumnSequence,
    pub ranked_types: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            policy: ConfirmationPolicy::default(),
            silent: false,
            po_order: false,
            columns: ColumnSequence::default(),
            ranked_types: default_ranked_types(),
        }
    }
}

impl Settings {
    /// Combina a configuração carregada com as flags da linha de comando.
    pub fn resolve(config: &AbConfig, cli: &Cli) -> Result<Self, AbError> {
        let mut policy = ConfirmationPolicy::parse_or(ConfirmationPolicy::default(), &config.confirm)?;
        if cli.yes {
            policy = ConfirmationPolicy::Never;
        } else if let Some(mode) = &cli.confirm {
            policy = ConfirmationPolicy::parse_or(policy, mode)?;
        }

        let columns = if cli.default_columns {
            ColumnSequence::agile()
        } else if let Some(csv) = &cli.columns {
            ColumnSequence::from_csv(csv)?
        } else {
            config.column_sequence()?
        };

        Ok(Self {
            policy,
            silent: config.silent || cli.silent,
            po_order: config.po_order || cli.po_order,
            columns,
            ranked_types: config.ranked_types.clone(),
        })
    }
}
