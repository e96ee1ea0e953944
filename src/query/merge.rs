use crate::az::WorkItem;
use crate::error::AbError;

use super::wiql;

/// Concatena a partição ordenada por rank com a alternativa ordenada por data.
///
/// Toda entrada de `high` precede as de `fallback`, e ambas mantêm a ordem
/// recebida. Qualquer um dos lados pode ser vazio.
pub fn merge_prioritized<T>(high: Vec<T>, fallback: Vec<T>) -> Vec<T> {
    let mut merged = high;
    merged.extend(fallback);
    merged
}

/// Como uma listagem é obtida: uma consulta, ou uma ranqueada e uma
/// alternativa cujos resultados são combinados.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPlan {
    Single(String),
    Prioritized { ranked: String, fallback: String },
}

impl QueryPlan {
    /// Planeja uma listagem com filtro de tipo opcional.
    ///
    /// Sem PO order, tudo é uma única consulta por data. Com PO order, a
    /// listagem sem filtro se divide em partição ranqueada e alternativa;
    /// um tipo ranqueado é ordenado só por stack rank; outros tipos ficam
    /// na listagem simples.
    pub fn for_listing(
        include_closed: bool,
        work_item_type: Option<&str>,
        po_order: bool,
        ranked_types: &[String],
    ) -> Self {
        let work_item_type = work_item_type.map(str::trim).filter(|t| !t.is_empty());
        if !po_order || ranked_types.is_empty() {
            return QueryPlan::Single(wiql::listing(include_closed, work_item_type));
        }
        match work_item_type {
            None => QueryPlan::Prioritized {
                ranked: wiql::ranked(include_closed, ranked_types),
                fallback: wiql::unranked(include_closed, ranked_types),
            },
            Some(t) if ranked_types.iter().any(|r| r.eq_ignore_ascii_case(t)) => {
                QueryPlan::Single(wiql::ranked(include_closed, &[t.to_string()]))
            }
            Some(t) => QueryPlan::Single(wiql::listing(include_closed, Some(t))),
        }
    }

    /// Executa as consultas do plano em ordem via `run` e combina os resultados.
    pub fn execute<F>(&self, mut run: F) -> Result<Vec<WorkItem>, AbError>
    where
        F: FnMut(&str) -> Result<Vec<WorkItem>, AbError>,
    {
        match self {
            QueryPlan::Single(q) => run(q),
            QueryPlan::Prioritized { ranked, fallback } => {
                let high = run(ranked)?;
                let rest = run(fallback)?;
                Ok(merge_prioritized(high, rest))
            }
        }
    }
}
