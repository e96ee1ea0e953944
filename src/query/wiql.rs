//! Texto de consultas WIQL. As consultas são montadas por concatenação e
//! entregues ao `az boards query` sem análise ou validação da gramática.

const SELECT_LISTING: &str = "SELECT [System.Id], [System.Title], [System.State], \
                              [System.WorkItemType], [System.AssignedTo] FROM WorkItems";
const SELECT_RANKED: &str = "SELECT [System.Id], [System.Title], [System.State], \
                             [System.WorkItemType], [System.AssignedTo], \
                             [Microsoft.VSTS.Common.StackRank] FROM WorkItems";

const NOT_CLOSED: &str = "[System.State] <> 'Closed'";
const BY_RECENCY: &str = " ORDER BY [System.ChangedDate] DESC";
const BY_RANK: &str =
    " ORDER BY [Microsoft.VSTS.Common.StackRank] ASC, [System.ChangedDate] DESC";

/// Coloca um literal entre aspas simples, duplicando as aspas internas.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn quoted_list(values: &[String]) -> String {
    values.iter().map(|v| quote(v)).collect::<Vec<_>>().join(",")
}

fn with_where(select: &str, conditions: &[String], order: &str) -> String {
    let mut wiql = select.to_string();
    if !conditions.is_empty() {
        wiql.push_str(" WHERE ");
        wiql.push_str(&conditions.join(" AND "));
    }
    wiql.push_str(order);
    wiql
}

fn state_filter(include_closed: bool) -> Vec<String> {
    if include_closed {
        Vec::new()
    } else {
        vec![NOT_CLOSED.to_string()]
    }
}

/// Itens de um tipo opcional, os alterados mais recentemente primeiro.
pub fn listing(include_closed: bool, work_item_type: Option<&str>) -> String {
    let mut conditions = state_filter(include_closed);
    if let Some(t) = work_item_type.map(str::trim).filter(|t| !t.is_empty()) {
        conditions.push(format!("[System.WorkItemType] = {}", quote(t)));
    }
    with_where(SELECT_LISTING, &conditions, BY_RECENCY)
}

/// Itens dos tipos ranqueados, por stack rank e depois por data.
pub fn ranked(include_closed: bool, ranked_types: &[String]) -> String {
    let mut conditions = state_filter(include_closed);
    conditions.push(format!(
        "[System.WorkItemType] IN ({})",
        quoted_list(ranked_types)
    ));
    with_where(SELECT_RANKED, &conditions, BY_RANK)
}

/// Tudo que não é tipo ranqueado, os alterados mais recentemente primeiro.
pub fn unranked(include_closed: bool, ranked_types: &[String]) -> String {
    let mut conditions = state_filter(include_closed);
    conditions.push(format!(
        "[System.WorkItemType] NOT IN ({})",
        quoted_list(ranked_types)
    ));
    with_where(SELECT_LISTING, &conditions, BY_RECENCY)
}

/// Ids dos filhos diretos de `parent`.
pub fn child_ids(parent: u64) -> String {
    format!("SELECT [System.Id] FROM WorkItems WHERE [System.Parent] = {parent}")
}

/// Campos de listagem para um conjunto conhecido de ids, por data decrescente.
pub fn by_ids(ids: &[u64], include_closed: bool) -> String {
    let id_list = ids
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let mut conditions = vec![format!("[System.Id] IN ({id_list})")];
    conditions.extend(state_filter(include_closed));
    with_where(SELECT_LISTING, &conditions, BY_RECENCY)
}
