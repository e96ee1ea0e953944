//! Formatos de resposta de `az boards`, `az devops` e `az rest`.
//!
//! A decodificação é tolerante: membros ausentes usam valores padrão e
//! respostas parciais ainda rendem algo para exibir.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

pub const FIELD_TITLE: &str = "System.Title";
pub const FIELD_STATE: &str = "System.State";
pub const FIELD_TYPE: &str = "System.WorkItemType";
pub const FIELD_ASSIGNED_TO: &str = "System.AssignedTo";
pub const FIELD_CREATED_BY: &str = "System.CreatedBy";
pub const FIELD_CHANGED_DATE: &str = "System.ChangedDate";
pub const FIELD_DESCRIPTION: &str = "System.Description";
pub const FIELD_TAGS: &str = "System.Tags";
pub const FIELD_SEVERITY: &str = "Microsoft.VSTS.Common.Severity";
pub const FIELD_ACCEPTANCE: &str = "Microsoft.VSTS.Common.AcceptanceCriteria";

pub const TYPE_USER_STORY: &str = "User Story";
pub const TYPE_TASK: &str = "Task";
pub const TYPE_BUG: &str = "Bug";

/// Work item como retornado por `work-item show` ou por uma consulta WIQL.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WorkItem {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub url: String,
}

impl WorkItem {
    /// Decodifica um único work item, ou `None` se a resposta não for um.
    pub fn from_slice(raw: &[u8]) -> Option<Self> {
        match serde_json::from_slice::<Value>(raw) {
            Ok(value @ Value::Object(_)) => serde_json::from_value(value).ok(),
            _ => None,
        }
    }

    /// Campo de texto. Valores que não são texto contam como ausentes.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Campo de texto, ou `""`.
    pub fn field_or_empty(&self, key: &str) -> &str {
        self.field(key).unwrap_or_default()
    }

    pub fn title(&self) -> &str {
        self.field_or_empty(FIELD_TITLE)
    }

    pub fn state(&self) -> &str {
        self.field_or_empty(FIELD_STATE)
    }

    pub fn work_item_type(&self) -> &str {
        self.field_or_empty(FIELD_TYPE)
    }

    /// Responsável como exibido: texto simples ou o `displayName` de um objeto
    /// de identidade.
    pub fn assignee(&self) -> &str {
        self.identity(FIELD_ASSIGNED_TO)
    }

    pub fn created_by(&self) -> &str {
        self.identity(FIELD_CREATED_BY)
    }

    fn identity(&self, key: &str) -> &str {
        match self.fields.get(key) {
            Some(Value::String(s)) => s,
            Some(Value::Object(obj)) => obj
                .get("displayName")
                .and_then(Value::as_str)
                .unwrap_or_default(),
            _ => "",
        }
    }

    /// O campo de coluna Kanban específico do quadro (`WEF_<guid>_Kanban.Column`)
    /// e seu valor atual.
    pub fn kanban_column(&self) -> Option<(&str, &str)> {
        self.fields.iter().find_map(|(key, value)| {
            if key.starts_with("WEF_") && key.contains("Kanban.Column") {
                value.as_str().map(|v| (key.as_str(), v))
            } else {
                None
            }
        })
    }

    /// Data da última alteração, quando presente e bem formada.
    pub fn changed_at(&self) -> Option<DateTime<Utc>> {
        self.field(FIELD_CHANGED_DATE)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Tags separadas por ponto e vírgula, como lista limpa.
    pub fn tags(&self) -> Vec<&str> {
        self.field_or_empty(FIELD_TAGS)
            .split(';')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Severidade de bug conforme aceita pelo template de processo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Critical => "1 - Critical",
            Severity::High => "2 - High",
            Severity::Medium => "3 - Medium",
            Severity::Low => "4 - Low",
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = crate::error::AbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "critical" | "1 - critical" => Ok(Severity::Critical),
            "2" | "high" | "2 - high" => Ok(Severity::High),
            "3" | "medium" | "3 - medium" => Ok(Severity::Medium),
            "4" | "low" | "4 - low" => Ok(Severity::Low),
            _ => Err(crate::error::AbError::InvalidSeverity(s.to_string())),
        }
    }
}

/// Padrões de `az devops configure -l` mais o time padrão do projeto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevOpsDefaults {
    pub organization: String,
    pub project: String,
    pub team: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ConfigureListing {
    #[serde(default)]
    pub defaults: std::collections::BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectShow {
    #[serde(rename = "defaultTeam")]
    pub default_team: Option<NamedRef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NamedRef {
    #[serde(default)]
    pub name: String,
}

/// Quadro de um time, de `_apis/work/boards`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Board {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Coluna de quadro, de `_apis/work/boards/<id>/columns`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BoardColumn {
    pub name: String,
    #[serde(default, rename = "isSplit")]
    pub is_split: bool,
    #[serde(default, rename = "stateMappings")]
    pub state_mappings: std::collections::BTreeMap<String, String>,
}

/// Envelope `{"value": [...]}` usado pela API REST.
#[derive(Debug, Deserialize)]
pub(crate) struct ValueList<T> {
    pub value: Vec<T>,
}
