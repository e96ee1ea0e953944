use std::time::Instant;

use super::{CommandExecutor, ConfirmationPolicy, Invocation, Prompter};
use super::types::{
    Board, BoardColumn, ConfigureListing, DevOpsDefaults, ProjectShow, ValueList, WorkItem,
};
use crate::error::AbError;
use crate::query;

const CONFIRM_QUESTION: &str = "Run this command?";
const API_VERSION: &str = "api-version=7.0";

/// Acesso tipado ao `az`. Toda chamada passa pelo portão de confirmação e
/// depois pelo executor.
pub struct AzClient {
    executor: Box<dyn CommandExecutor>,
    prompter: Box<dyn Prompter>,
    policy: ConfirmationPolicy,
    silent: bool,
}

impl AzClient {
    pub fn new(
        executor: impl CommandExecutor + 'static,
        prompter: impl Prompter + 'static,
        policy: ConfirmationPolicy,
        silent: bool,
    ) -> Self {
        Self {
            executor: Box::new(executor),
            prompter: Box::new(prompter),
            policy,
            silent,
        }
    }

    /// Ecoa, confirma se a política exigir e então despacha.
    ///
    /// Uma confirmação recusada ou interrompida retorna [`AbError::Cancelled`]
    /// sem chegar ao executor.
    pub fn run(&self, invocation: &Invocation) -> Result<Vec<u8>, AbError> {
        let command_line = invocation.command_line();
        if !self.silent {
            self.prompter.echo(&command_line);
        }

        if self.policy.should_confirm(invocation) {
            let approved = match self.prompter.confirm(CONFIRM_QUESTION) {
                Ok(answer) => answer,
                Err(err) => {
                    tracing::debug!(error = %err, "confirmation prompt interrupted");
                    false
                }
            };
            if !approved {
                tracing::info!(command = %command_line, "confirmation declined");
                return Err(AbError::Cancelled);
            }
        }

        let started = Instant::now();
        let output = self.executor.execute(invocation)?;
        tracing::debug!(
            command = %command_line,
            kind = ?invocation.kind(),
            mutating = invocation.is_mutating(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            bytes = output.len(),
            "az call finished"
        );
        Ok(output)
    }

    fn signed_in_user(&self, property: &str) -> Result<String, AbError> {
        let inv = Invocation::other(["ad", "signed-in-user", "show"])
            .flag("--query", property)
            .flag("-o", "tsv");
        let out = self.run(&inv)?;
        Ok(String::from_utf8_lossy(&out).trim().to_string())
    }

    /// Nome principal do usuário autenticado (em geral um e-mail).
    pub fn current_user_upn(&self) -> Result<String, AbError> {
        self.signed_in_user("userPrincipalName")
    }

    pub fn current_user_display_name(&self) -> Result<String, AbError> {
        self.signed_in_user("displayName")
    }

    /// JSON bruto de `az boards query`.
    pub fn query_wiql(&self, wiql: &str) -> Result<Vec<u8>, AbError> {
        let inv = Invocation::other(["boards", "query"])
            .flag("--wiql", wiql)
            .json();
        self.run(&inv)
    }

    /// Consulta e decodifica de forma tolerante; formato desconhecido vira lista vazia.
    pub fn query_items(&self, wiql: &str) -> Result<Vec<WorkItem>, AbError> {
        Ok(query::normalize(&self.query_wiql(wiql)?))
    }

    /// Consulta e extrai os ids de forma estrita.
    pub fn query_ids(&self, wiql: &str) -> Result<Vec<u64>, AbError> {
        query::extract_ids(&self.query_wiql(wiql)?)
    }

    /// JSON bruto de `work-item show`.
    pub fn show_work_item(&self, id: u64) -> Result<Vec<u8>, AbError> {
        let inv = Invocation::work_item("show")
            .flag("--id", id.to_string())
            .json();
        self.run(&inv)
    }

    /// Busca e decodifica um work item; falha se a resposta não for um.
    pub fn work_item(&self, id: u64) -> Result<WorkItem, AbError> {
        let raw = self.show_work_item(id)?;
        WorkItem::from_slice(&raw).ok_or(AbError::Uninspectable(id))
    }

    /// Altera campos de um work item, enviados na ordem recebida.
    pub fn update_work_item_fields(
        &self,
        id: u64,
        fields: &[(String, String)],
    ) -> Result<Vec<u8>, AbError> {
        let inv = with_fields(
            Invocation::work_item("update").flag("--id", id.to_string()),
            fields,
        )
        .json();
        self.run(&inv)
    }

    pub fn update_work_item_assignee(&self, id: u64, assignee: &str) -> Result<Vec<u8>, AbError> {
        let inv = Invocation::work_item("update")
            .flag("--id", id.to_string())
            .flag("--assigned-to", assignee)
            .json();
        self.run(&inv)
    }

    pub fn create_work_item(
        &self,
        work_item_type: &str,
        title: &str,
        fields: &[(String, String)],
    ) -> Result<Vec<u8>, AbError> {
        let inv = with_fields(
            Invocation::work_item("create")
                .flag("--type", work_item_type)
                .flag("--title", title),
            fields,
        )
        .json();
        self.run(&inv)
    }

    pub fn add_work_item_relation(
        &self,
        id: u64,
        relation_type: &str,
        target_id: u64,
    ) -> Result<Vec<u8>, AbError> {
        let inv = Invocation::work_item_relation("add")
            .flag("--id", id.to_string())
            .flag("--relation-type", relation_type)
            .flag("--target-id", target_id.to_string())
            .json();
        self.run(&inv)
    }

    /// Exclui um work item. O `az` não pergunta; o portão já perguntou.
    pub fn delete_work_item(&self, id: u64) -> Result<Vec<u8>, AbError> {
        let inv = Invocation::work_item("delete")
            .flag("--id", id.to_string())
            .arg("--yes")
            .json();
        self.run(&inv)
    }

    /// Organização e projeto configurados, mais o time padrão do projeto.
    pub fn devops_defaults(&self) -> Result<DevOpsDefaults, AbError> {
        let out = self.run(&Invocation::other(["devops", "configure", "-l"]).json())?;
        let listing: ConfigureListing = serde_json::from_slice(&out).unwrap_or_default();
        let organization = listing
            .defaults
            .get("organization")
            .cloned()
            .unwrap_or_default();
        let project = listing
            .defaults
            .get("project")
            .cloned()
            .filter(|p| !p.is_empty())
            .ok_or(AbError::NoDefaultProject)?;

        let out = self.run(
            &Invocation::other(["devops", "project", "show"])
                .flag("--project", project.as_str())
                .json(),
        )?;
        let team = serde_json::from_slice::<ProjectShow>(&out)
            .ok()
            .and_then(|p| p.default_team)
            .map(|t| t.name)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AbError::NoDefaultTeam(project.clone()))?;

        Ok(DevOpsDefaults {
            organization,
            project,
            team,
        })
    }

    /// GET autenticado na API REST do Azure DevOps.
    pub fn rest_get(&self, url: &str) -> Result<Vec<u8>, AbError> {
        self.run(&Invocation::rest(Some("get"), url))
    }

    /// Colunas ordenadas do primeiro quadro do time padrão que mapeia
    /// `work_item_type`.
    ///
    /// Quadros cujas colunas não podem ser obtidas ou decodificadas são ignorados.
    pub fn board_columns_for_type(&self, work_item_type: &str) -> Result<Vec<BoardColumn>, AbError> {
        let defaults = self.devops_defaults()?;
        let base = format!(
            "{}/{}/{}/_apis/work/boards",
            defaults.organization.trim_end_matches('/'),
            url_segment(&defaults.project),
            url_segment(&defaults.team)
        );

        let boards: ValueList<Board> =
            serde_json::from_slice(&self.rest_get(&format!("{base}?{API_VERSION}"))?)?;

        for board in boards.value {
            let raw = match self.rest_get(&format!("{base}/{}/columns?{API_VERSION}", board.id)) {
                Ok(raw) => raw,
                Err(AbError::Cancelled) => return Err(AbError::Cancelled),
                Err(err) => {
                    tracing::debug!(board = %board.name, error = %err, "skipping board");
                    continue;
                }
            };
            let Ok(columns) = serde_json::from_slice::<ValueList<BoardColumn>>(&raw) else {
                continue;
            };
            if columns
                .value
                .iter()
                .any(|c| c.state_mappings.contains_key(work_item_type))
            {
                return Ok(columns.value);
            }
        }
        Err(AbError::NoBoardColumns(work_item_type.to_string()))
    }
}

fn with_fields(mut inv: Invocation, fields: &[(String, String)]) -> Invocation {
    if !fields.is_empty() {
        inv = inv.arg("--fields");
        for (key, value) in fields {
            inv = inv.arg(format!("{key}={value}"));
        }
    }
    inv
}

fn url_segment(segment: &str) -> String {
    segment.replace(' ', "%20")
}
