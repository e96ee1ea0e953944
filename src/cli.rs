//! Interface de linha de comando do `ab` baseada em clap.
//!
//! Flags globais definem como cada chamada ao `az` é confirmada e ecoada;
//! cada subcomando corresponde a um fluxo do quadro.

use clap::{Args, Parser, Subcommand};

use crate::az::Severity;

/// ab: fluxos do Azure Boards sobre a CLI `az`.
#[derive(Debug, Parser)]
#[command(name = "ab", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Modo de confirmação: always|mutations|never (sobrepõe AB_CONFIRM).
    #[arg(long, global = true)]
    pub confirm: Option<String>,

    /// Não pergunta; equivale a --confirm never.
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Não imprime os comandos az antes de executá-los.
    #[arg(short, long, global = true)]
    pub silent: bool,

    /// Usa as colunas Agile padrão New,Active,Resolved,Closed (sobrepõe AB_COLUMNS).
    #[arg(short, long, global = true)]
    pub default_columns: bool,

    /// Ordem das colunas separada por vírgulas (sobrepõe AB_COLUMNS e ab.toml).
    #[arg(long, global = true, value_name = "CSV")]
    pub columns: Option<String>,

    /// Ordena pela prioridade do backlog quando possível (também AB_PO_ORDER / AB_STACKRANK).
    #[arg(short = 'P', long, global = true)]
    pub po_order: bool,

    /// Habilita logs de depuração no stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Lista work items, ou os filhos de um pai.
    List(ListArgs),

    /// Mostra um work item e seus detalhes.
    Show {
        id: u64,

        /// Inclui filhos Closed.
        #[arg(short, long)]
        all: bool,
    },

    /// Move um work item para a próxima coluna do quadro.
    Forward { id: u64 },

    /// Move um work item para a coluna anterior do quadro.
    Backward { id: u64 },

    /// Atribui a mim e marca Active.
    Workon { id: u64 },

    /// Marca Resolved (Tasks vão para Closed).
    Resolve { id: u64 },

    /// Marca New.
    Renew { id: u64 },

    /// Marca Closed.
    Close { id: u64 },

    /// Exclui um work item.
    Delete { id: u64 },

    /// Cria work items.
    #[command(subcommand)]
    Create(CreateCommand),

    /// Altera campos selecionados de um work item.
    Edit(EditArgs),

    /// Mostra as colunas do quadro do time padrão para um tipo de work item.
    Columns {
        #[arg(value_name = "TYPE")]
        work_item_type: String,
    },
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(subcommand)]
    pub kind: Option<ListKind>,

    /// Inclui itens Closed.
    #[arg(short, long, global = true)]
    pub all: bool,

    /// Lista os filhos deste work item.
    pub parent: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum ListKind {
    /// Lista Tasks.
    Tasks,
    /// Lista User Stories.
    Stories,
    /// Lista Bugs.
    Bugs,
}

impl ListKind {
    pub fn work_item_type(self) -> &'static str {
        match self {
            ListKind::Tasks => crate::az::types::TYPE_TASK,
            ListKind::Stories => crate::az::types::TYPE_USER_STORY,
            ListKind::Bugs => crate::az::types::TYPE_BUG,
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            ListKind::Tasks => "Tasks",
            ListKind::Stories => "User Stories",
            ListKind::Bugs => "Bugs",
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CreateCommand {
    /// Cria uma User Story.
    Story {
        title: String,

        /// Atribui ao usuário (use @me para você mesmo).
        #[arg(short, long)]
        assign: Option<String>,
    },

    /// Cria uma Task sob uma User Story.
    Task {
        title: String,

        /// Id da User Story pai.
        #[arg(short, long)]
        parent: u64,

        /// Responsável (use @me para você mesmo).
        #[arg(short, long)]
        assignee: Option<String>,
    },

    /// Cria um Bug sob uma User Story.
    Bug {
        title: String,

        /// Id da User Story pai.
        #[arg(short, long)]
        parent: u64,

        /// Responsável (use @me para você mesmo).
        #[arg(short, long)]
        assignee: Option<String>,

        /// Severidade 1|2|3|4 (1-Critical, 2-High, 3-Medium, 4-Low).
        #[arg(long)]
        severity: Option<Severity>,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct EditArgs {
    pub id: u64,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub state: Option<String>,

    /// Novo responsável; vazio remove, @me para você mesmo.
    #[arg(long)]
    pub assignee: Option<String>,

    /// Coluna de destino; precisa fazer parte da ordem configurada.
    #[arg(long)]
    pub column: Option<String>,

    /// Severidade do bug 1|2|3|4.
    #[arg(long)]
    pub severity: Option<Severity>,
}
