//! Texto das consultas, decodificação das respostas e ordem dos resultados.

mod merge;
mod normalize;
pub mod wiql;

pub use merge::QueryPlan;
pub use normalize::{extract_ids, normalize};
