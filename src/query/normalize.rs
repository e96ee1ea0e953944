//! Decodificação da saída de `az boards query`, que chega em formatos
//! diferentes conforme a versão da CLI e o modo de saída.
//!
//! A listagem é tolerante: o que não for reconhecido vira resultado vazio.
//! A extração de ids é estrita e falha com [`AbError::UnrecognizedShape`].

use serde::Deserialize;
use serde_json::Value;

use crate::az::WorkItem;
use crate::error::AbError;

/// Formatos de resposta, tentados na ordem de declaração.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QueryPayload {
    /// `[{...}, ...]`
    Bare(Vec<WorkItem>),
    /// `{"workItems": [...]}` com `{"value": [...]}` como alternativa.
    Envelope {
        #[serde(default, rename = "workItems")]
        work_items: Vec<WorkItem>,
        #[serde(default)]
        value: Vec<WorkItem>,
    },
}

/// Decodifica a resposta em itens, preservando a ordem da consulta.
///
/// Nunca falha: uma resposta indecifrável resulta em lista vazia.
pub fn normalize(raw: &[u8]) -> Vec<WorkItem> {
    match serde_json::from_slice::<QueryPayload>(raw) {
        Ok(QueryPayload::Bare(items)) => items,
        Ok(QueryPayload::Envelope { work_items, value }) => {
            if work_items.is_empty() {
                value
            } else {
                work_items
            }
        }
        Err(err) => {
            tracing::warn!(
                error = %err,
                bytes = raw.len(),
                "unrecognized query payload, treating as empty"
            );
            Vec::new()
        }
    }
}

/// Extrai os ids de work items de uma resposta de consulta.
///
/// Aceita `{"workItems": [...]}`, um array simples ou `{"value": [...]}`,
/// nessa ordem de preferência. Cada entrada contribui com seu `id` ou, na
/// falta dele, com `fields["System.Id"]`. Um formato reconhecido com lista
/// vazia resulta em lista vazia; se nenhum id for encontrado, falha com
/// [`AbError::UnrecognizedShape`].
pub fn extract_ids(raw: &[u8]) -> Result<Vec<u64>, AbError> {
    let value: Value = serde_json::from_slice(raw).map_err(|_| AbError::UnrecognizedShape)?;

    let entries = match &value {
        Value::Array(entries) => Some(entries),
        Value::Object(obj) => ["workItems", "value"]
            .iter()
            .filter_map(|key| obj.get(*key).and_then(Value::as_array))
            .find(|list| !list.is_empty())
            .or_else(|| {
                ["workItems", "value"]
                    .iter()
                    .find_map(|key| obj.get(*key).and_then(Value::as_array))
            }),
        _ => None,
    };
    let entries = entries.ok_or(AbError::UnrecognizedShape)?;

    if entries.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<u64> = entries.iter().filter_map(entry_id).collect();
    if ids.is_empty() {
        return Err(AbError::UnrecognizedShape);
    }
    Ok(ids)
}

fn entry_id(entry: &Value) -> Option<u64> {
    entry
        .get("id")
        .and_then(Value::as_u64)
        .filter(|id| *id != 0)
        .or_else(|| {
            entry
                .get("fields")
                .and_then(|f| f.get("System.Id"))
                .and_then(Value::as_u64)
        })
}
