//! Saída no terminal: tabelas alinhadas, resumos de work items e um spinner
//! para chamadas bloqueantes ao `az`.
//!
//! As funções de renderização devolvem `String`, e quem chama decide o destino.
//! O estilo vem do `console` e some quando a saída não é um terminal.

use std::io::{self, Write};
use std::time::Duration;

use console::{Alignment, Style, measure_text_width, pad_str};
use indicatif::{ProgressBar, ProgressStyle};

use crate::az::types::{FIELD_ACCEPTANCE, FIELD_DESCRIPTION, FIELD_SEVERITY, TYPE_BUG, TYPE_USER_STORY};
use crate::az::{BoardColumn, WorkItem};

const NONE: &str = "NIL";
const NO_ITEMS: &str = "No work-items found.";

/// Spinner desenhado no stderr enquanto uma chamada externa roda.
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn start(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    pub fn finish(self) {
        self.pb.finish_and_clear();
    }
}

/// Quais colunas a tabela de itens mostra.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `ID  Type  State  Assignee  Title`
    Full,
    /// `ID  State  Assignee  Title`, para listagens de um único tipo.
    Typeless,
}

fn heading(text: &str) -> String {
    Style::new().bold().cyan().apply_to(text).to_string()
}

fn is_own_active(item: &WorkItem, me: Option<&str>) -> bool {
    match me {
        Some(me) if !me.is_empty() => item.state() == "Active" && item.assignee() == me,
        _ => false,
    }
}

// Preenche cada célula até a largura da coluna; a primeira, numérica, alinha à direita.
fn table(header: &[&str], rows: &[(Vec<String>, bool)]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| measure_text_width(h)).collect();
    for (cells, _) in rows {
        for (idx, cell) in cells.iter().enumerate() {
            widths[idx] = widths[idx].max(measure_text_width(cell));
        }
    }

    let line = |cells: &[&str]| -> String {
        cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(idx, (cell, width))| {
                let align = if idx == 0 { Alignment::Right } else { Alignment::Left };
                pad_str(cell, *width, align, None).into_owned()
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let bold = Style::new().bold();
    let dim = Style::new().dim();
    let mut out = String::new();
    out.push_str(&dim.apply_to(line(header)).to_string());
    out.push('\n');
    for (cells, emphasise) in rows {
        let refs: Vec<&str> = cells.iter().map(String::as_str).collect();
        let rendered = line(&refs);
        if *emphasise {
            out.push_str(&bold.apply_to(rendered).to_string());
        } else {
            out.push_str(&rendered);
        }
        out.push('\n');
    }
    out
}

fn row(item: &WorkItem, layout: Layout) -> Vec<String> {
    let mut cells = vec![item.id.to_string()];
    if layout == Layout::Full {
        cells.push(item.work_item_type().to_string());
    }
    cells.push(item.state().to_string());
    cells.push(item.assignee().to_string());
    cells.push(item.title().to_string());
    cells
}

fn header(layout: Layout) -> Vec<&'static str> {
    match layout {
        Layout::Full => vec!["ID", "Type", "State", "Assignee", "Title"],
        Layout::Typeless => vec!["ID", "State", "Assignee", "Title"],
    }
}

/// Tabela de itens com título, exatamente na ordem recebida. Linhas `Active`
/// atribuídas a `me` ficam em destaque.
pub fn items_table(title: &str, items: &[WorkItem], layout: Layout, me: Option<&str>) -> String {
    if items.is_empty() {
        return format!("{NO_ITEMS}\n");
    }
    let rows: Vec<(Vec<String>, bool)> = items
        .iter()
        .map(|item| (row(item, layout), is_own_active(item, me)))
        .collect();
    format!("{}\n\n{}", heading(title), table(&header(layout), &rows))
}

/// O pai em linha própria, seguido dos filhos.
pub fn parent_with_children(parent: &WorkItem, children: &[WorkItem], me: Option<&str>) -> String {
    let column_state = match parent.kanban_column() {
        Some((_, column)) if !column.is_empty() => format!("{column} ({})", parent.state()),
        _ => parent.state().to_string(),
    };
    let parent_row = vec![(
        vec![
            parent.id.to_string(),
            column_state,
            parent.assignee().to_string(),
            parent.title().to_string(),
        ],
        is_own_active(parent, me),
    )];

    let mut out = format!(
        "{}\n\n{}\n",
        heading("Parent"),
        table(&["ID", "Column/State", "Assignee", "Title"], &parent_row)
    );
    out.push_str(&items_table("Work Items", children, Layout::Full, me));
    out
}

fn tags_display(item: &WorkItem) -> String {
    let tags = item.tags();
    if tags.is_empty() {
        "(none)".to_string()
    } else {
        tags.join(", ")
    }
}

fn or_nil(value: &str) -> &str {
    if value.trim().is_empty() { NONE } else { value.trim() }
}

/// Resumo compacto `- Chave: valor` exibido após uma alteração.
pub fn summary(title: &str, item: &WorkItem) -> String {
    let mut lines = vec![
        format!("- ID: {}", item.id),
        format!("- Type: {}", item.work_item_type()),
        format!("- State: {}", item.state()),
        format!("- Title: {}", item.title()),
        format!("- Assigned To: {}", item.assignee()),
    ];
    if item.work_item_type() == TYPE_BUG {
        let severity = item.field_or_empty(FIELD_SEVERITY);
        if !severity.trim().is_empty() {
            lines.push(format!("- Severity: {severity}"));
        }
    }
    lines.push(format!(
        "- Kanban Column: {}",
        item.kanban_column().map(|(_, c)| c).unwrap_or_default()
    ));
    lines.push(format!("- Tags: {}", tags_display(item)));
    lines.push(format!("- URL: {}", item.url));
    format!("{}\n\n{}\n", heading(title), lines.join("\n"))
}

/// Detalhes completos para `show`. User Stories incluem os filhos.
pub fn details(item: &WorkItem, children: Option<&[WorkItem]>) -> String {
    let label = Style::new().bold();
    let wtype = item.work_item_type();
    let mut sections: Vec<(&str, String)> = vec![("Title", item.title().trim().to_string())];
    if wtype == TYPE_BUG {
        sections.push(("Severity", or_nil(item.field_or_empty(FIELD_SEVERITY)).to_string()));
    }
    sections.push(("Created By", {
        let by = item.created_by();
        if by.is_empty() { "(unknown)".to_string() } else { by.to_string() }
    }));
    sections.push(("Assignee", or_nil(item.assignee()).to_string()));
    if wtype == TYPE_USER_STORY {
        let column = item.kanban_column().map(|(_, c)| c).unwrap_or_default();
        sections.push(("Column", or_nil(column).to_string()));
    }
    sections.push(("State", item.state().to_string()));
    if let Some(changed) = item.changed_at() {
        sections.push(("Changed", changed.format("%Y-%m-%d %H:%M UTC").to_string()));
    }
    sections.push(("Tags", tags_display(item)));
    sections.push(("Description", or_nil(item.field_or_empty(FIELD_DESCRIPTION)).to_string()));
    if wtype == TYPE_USER_STORY {
        sections.push((
            "Acceptance Criteria",
            or_nil(item.field_or_empty(FIELD_ACCEPTANCE)).to_string(),
        ));
    }

    let mut out = format!("{}\n\n", heading(&format!("{wtype} AB#{}", item.id)));
    for (key, value) in sections {
        out.push_str(&format!("{}\n{value}\n\n", label.apply_to(format!("{key}:"))));
    }
    if let Some(children) = children {
        out.push_str(&format!("{}\n\n", heading("Children")));
        if children.is_empty() {
            out.push_str(&format!("{NO_ITEMS}\n"));
        } else {
            let rows: Vec<(Vec<String>, bool)> = children
                .iter()
                .map(|c| (row(c, Layout::Full), false))
                .collect();
            out.push_str(&table(&header(Layout::Full), &rows));
        }
    }
    out
}

/// Colunas ordenadas do quadro para um tipo de work item.
pub fn board_columns(work_item_type: &str, columns: &[BoardColumn]) -> String {
    let rows: Vec<(Vec<String>, bool)> = columns
        .iter()
        .enumerate()
        .map(|(idx, c)| {
            let state = c.state_mappings.get(work_item_type).cloned().unwrap_or_default();
            let split = if c.is_split { "yes" } else { "" };
            (
                vec![(idx + 1).to_string(), c.name.clone(), state, split.to_string()],
                false,
            )
        })
        .collect();
    format!(
        "{}\n\n{}",
        heading(&format!("{work_item_type} columns")),
        table(&["#", "Column", "State", "Split"], &rows)
    )
}

/// Repassa uma resposta bruta ao stdout, terminada em nova linha.
pub fn print_json(raw: &[u8]) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(raw)?;
    if raw.last().is_some_and(|b| *b != b'\n') {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()
}

/// Linha de status no stderr.
pub fn notice(message: &str) {
    eprintln!("{}", Style::new().green().apply_to(message));
}
