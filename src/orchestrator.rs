use crate::az::types::{
    FIELD_ASSIGNED_TO, FIELD_SEVERITY, FIELD_STATE, FIELD_TITLE, TYPE_BUG, TYPE_TASK,
    TYPE_USER_STORY,
};
use crate::az::{AzClient, Severity, WorkItem};
use crate::board::Direction;
use crate::cli::{Command, CreateCommand, EditArgs, ListArgs};
use crate::config::Settings;
use crate::error::AbError;
use crate::query::{QueryPlan, wiql};
use crate::ui::{self, Layout};

const ME: &str = "@me";

/// What a workflow produced: status lines for stderr and a body for stdout.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Report {
    pub notices: Vec<String>,
    pub body: Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Text(String),
    /// A response that could not be decoded, passed through as is.
    Raw(Vec<u8>),
}

impl Default for Body {
    fn default() -> Self {
        Body::Text(String::new())
    }
}

impl Report {
    fn text(body: String) -> Self {
        Self {
            notices: Vec::new(),
            body: Body::Text(body),
        }
    }

    fn notice(mut self, message: impl Into<String>) -> Self {
        self.notices.insert(0, message.into());
        self
    }
}

/// Either a summary of the returned work item or the raw response.
fn rendered(title: &str, raw: Vec<u8>) -> Report {
    match WorkItem::from_slice(&raw) {
        Some(item) => Report::text(ui::summary(title, &item)),
        None => Report {
            notices: Vec::new(),
            body: Body::Raw(raw),
        },
    }
}

/// Kind of child item created under a User Story.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    Task,
    Bug(Severity),
}

impl ChildKind {
    fn work_item_type(self) -> &'static str {
        match self {
            ChildKind::Task => TYPE_TASK,
            ChildKind::Bug(_) => TYPE_BUG,
        }
    }
}

/// Drives board workflows through a single [`AzClient`].
pub struct BoardOrchestrator {
    az: AzClient,
    settings: Settings,
}

impl BoardOrchestrator {
    pub fn new(az: AzClient, settings: Settings) -> Self {
        Self { az, settings }
    }

    /// Run one parsed command.
    pub fn execute(&self, command: &Command) -> Result<Report, AbError> {
        match command {
            Command::List(args) => self.list(args),
            Command::Show { id, all } => self.show(*id, *all),
            Command::Forward { id } => self.move_column(*id, Direction::Forward),
            Command::Backward { id } => self.move_column(*id, Direction::Backward),
            Command::Workon { id } => self.work_on(*id),
            Command::Resolve { id } => self.resolve(*id),
            Command::Renew { id } => self.set_state(*id, "New", "Renewed"),
            Command::Close { id } => self.set_state(*id, "Closed", "Closed"),
            Command::Delete { id } => self.delete(*id),
            Command::Create(CreateCommand::Story { title, assign }) => {
                self.create_story(title, assign.as_deref())
            }
            Command::Create(CreateCommand::Task {
                title,
                parent,
                assignee,
            }) => self.create_child(ChildKind::Task, title, *parent, assignee.as_deref()),
            Command::Create(CreateCommand::Bug {
                title,
                parent,
                assignee,
                severity,
            }) => self.create_child(
                ChildKind::Bug(severity.unwrap_or_default()),
                title,
                *parent,
                assignee.as_deref(),
            ),
            Command::Edit(args) => self.edit(args),
            Command::Columns { work_item_type } => self.board_columns(work_item_type),
        }
    }

    // Display name used to emphasise the caller's own active rows. Lookup
    // failures only lose the emphasis; a declined prompt still aborts.
    fn me_display(&self) -> Result<Option<String>, AbError> {
        match self.az.current_user_display_name() {
            Ok(name) if !name.is_empty() => Ok(Some(name)),
            Ok(_) => Ok(None),
            Err(AbError::Cancelled) => Err(AbError::Cancelled),
            Err(err) => {
                tracing::debug!(error = %err, "display name lookup failed");
                Ok(None)
            }
        }
    }

    fn resolve_assignee(&self, raw: &str) -> Result<String, AbError> {
        let raw = raw.trim();
        if raw == ME {
            self.az.current_user_upn()
        } else {
            Ok(raw.to_string())
        }
    }

    /// Items for a listing, honouring PO order when configured.
    pub fn listing(
        &self,
        include_closed: bool,
        work_item_type: Option<&str>,
    ) -> Result<Vec<WorkItem>, AbError> {
        QueryPlan::for_listing(
            include_closed,
            work_item_type,
            self.settings.po_order,
            &self.settings.ranked_types,
        )
        .execute(|q| self.az.query_items(q))
    }

    /// Direct children of `parent`, in query order.
    pub fn children(&self, parent: u64, include_closed: bool) -> Result<Vec<WorkItem>, AbError> {
        let ids = self.az.query_ids(&wiql::child_ids(parent))?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.az.query_items(&wiql::by_ids(&ids, include_closed))
    }

    pub fn list(&self, args: &ListArgs) -> Result<Report, AbError> {
        if let Some(kind) = args.kind {
            let items = self.listing(args.all, Some(kind.work_item_type()))?;
            let me = self.me_display()?;
            return Ok(Report::text(ui::items_table(
                kind.heading(),
                &items,
                Layout::Typeless,
                me.as_deref(),
            )));
        }

        if let Some(parent) = args.parent {
            let items = self.children(parent, args.all)?;
            let parent_item = self.az.work_item(parent)?;
            let me = self.me_display()?;
            return Ok(Report::text(ui::parent_with_children(
                &parent_item,
                &items,
                me.as_deref(),
            )));
        }

        let items = self.listing(args.all, None)?;
        let me = self.me_display()?;
        Ok(Report::text(ui::items_table(
            "Work Items",
            &items,
            Layout::Full,
            me.as_deref(),
        )))
    }

    pub fn show(&self, id: u64, include_closed: bool) -> Result<Report, AbError> {
        let item = self.az.work_item(id)?;
        let children = if item.work_item_type() == TYPE_USER_STORY {
            Some(self.children(item.id, include_closed)?)
        } else {
            None
        };
        Ok(Report::text(ui::details(&item, children.as_deref())))
    }

    /// Move a work item one column along the configured sequence.
    ///
    /// The target is computed before anything is sent, so an unknown column
    /// or a boundary aborts without an update.
    pub fn move_column(&self, id: u64, direction: Direction) -> Result<Report, AbError> {
        let item = self.az.work_item(id)?;
        let (field, current) = item
            .kanban_column()
            .filter(|(_, column)| !column.is_empty())
            .ok_or(AbError::MissingKanbanColumn(id))?;
        let step = self.settings.columns.step(current, direction)?;

        let raw = self
            .az
            .update_work_item_fields(id, &[(field.to_string(), step.to.clone())])?;
        tracing::info!(id, %direction, from = %step.from, to = %step.to, "moved column");

        let title = match direction {
            Direction::Forward => "Item pushed forward",
            Direction::Backward => "Item stepped back",
        };
        Ok(rendered(title, raw).notice(format!("Moved column from {} to {}", step.from, step.to)))
    }

    pub fn work_on(&self, id: u64) -> Result<Report, AbError> {
        let me = self.az.current_user_upn()?;
        let raw = self.az.update_work_item_fields(
            id,
            &[
                (FIELD_ASSIGNED_TO.to_string(), me),
                (FIELD_STATE.to_string(), "Active".to_string()),
            ],
        )?;
        Ok(rendered("Working On", raw))
    }

    /// Tasks skip straight to Closed; everything else becomes Resolved.
    pub fn resolve(&self, id: u64) -> Result<Report, AbError> {
        let item = self.az.work_item(id)?;
        let target = if item.work_item_type() == TYPE_TASK {
            "Closed"
        } else {
            "Resolved"
        };
        self.set_state(id, target, "Resolved")
    }

    fn set_state(&self, id: u64, state: &str, title: &str) -> Result<Report, AbError> {
        let raw = self
            .az
            .update_work_item_fields(id, &[(FIELD_STATE.to_string(), state.to_string())])?;
        Ok(rendered(title, raw))
    }

    pub fn delete(&self, id: u64) -> Result<Report, AbError> {
        let raw = self.az.delete_work_item(id)?;
        Ok(Report {
            notices: vec![format!("Deleted AB#{id}")],
            body: Body::Raw(raw),
        })
    }

    pub fn create_story(&self, title: &str, assign: Option<&str>) -> Result<Report, AbError> {
        let mut fields = vec![(FIELD_STATE.to_string(), "New".to_string())];
        if let Some(who) = assign.filter(|w| !w.trim().is_empty()) {
            fields.push((FIELD_ASSIGNED_TO.to_string(), self.resolve_assignee(who)?));
        }
        let raw = self.az.create_work_item(TYPE_USER_STORY, title, &fields)?;
        Ok(rendered("User Story Created", raw))
    }

    /// Create a Task or Bug and link it under a User Story.
    pub fn create_child(
        &self,
        kind: ChildKind,
        title: &str,
        parent: u64,
        assignee: Option<&str>,
    ) -> Result<Report, AbError> {
        let parent_item = self.az.work_item(parent).map_err(|err| match err {
            AbError::Uninspectable(_) => AbError::InvalidParent(parent),
            other => other,
        })?;
        if parent_item.work_item_type() != TYPE_USER_STORY {
            return Err(AbError::InvalidParent(parent));
        }

        let mut fields = Vec::new();
        if let ChildKind::Bug(_) = kind {
            fields.push((FIELD_STATE.to_string(), "New".to_string()));
        }
        if let Some(who) = assignee.filter(|w| !w.trim().is_empty()) {
            fields.push((FIELD_ASSIGNED_TO.to_string(), self.resolve_assignee(who)?));
        }
        if let ChildKind::Bug(severity) = kind {
            fields.push((FIELD_SEVERITY.to_string(), severity.label().to_string()));
        }

        let wtype = kind.work_item_type();
        let raw = self.az.create_work_item(wtype, title, &fields)?;
        let Some(created) = WorkItem::from_slice(&raw) else {
            return Ok(Report {
                notices: Vec::new(),
                body: Body::Raw(raw),
            });
        };

        self.az
            .add_work_item_relation(created.id, "parent", parent)
            .map_err(|err| match err {
                AbError::Cancelled => AbError::Cancelled,
                other => AbError::RelationFailed {
                    kind: wtype.to_ascii_lowercase(),
                    id: created.id,
                    parent,
                    source: Box::new(other),
                },
            })?;

        Ok(Report::text(ui::summary(&format!("{wtype} Created"), &created))
            .notice(format!("Linked AB#{} as child of AB#{parent}", created.id)))
    }

    /// Apply only the values that differ from the current item.
    pub fn edit(&self, args: &EditArgs) -> Result<Report, AbError> {
        let id = args.id;
        let item = self.az.work_item(id)?;
        let mut fields: Vec<(String, String)> = Vec::new();

        if let Some(title) = args.title.as_deref().map(str::trim) {
            if !title.is_empty() && title != item.title() {
                fields.push((FIELD_TITLE.to_string(), title.to_string()));
            }
        }
        if let Some(state) = args.state.as_deref().map(str::trim) {
            if !state.is_empty() && state != item.state() {
                fields.push((FIELD_STATE.to_string(), state.to_string()));
            }
        }
        if let Some(column) = args.column.as_deref().map(str::trim) {
            if !self.settings.columns.contains(column) {
                return Err(AbError::UnknownColumn(column.to_string()));
            }
            let (field, current) = item
                .kanban_column()
                .ok_or(AbError::MissingKanbanColumn(id))?;
            if column != current {
                fields.push((field.to_string(), column.to_string()));
            }
        }
        if let Some(severity) = args.severity {
            if item.work_item_type() == TYPE_BUG {
                if severity.label() != item.field_or_empty(FIELD_SEVERITY).trim() {
                    fields.push((FIELD_SEVERITY.to_string(), severity.label().to_string()));
                }
            } else {
                tracing::warn!(id, wtype = item.work_item_type(), "severity only applies to bugs");
            }
        }

        let mut reassign = None;
        if let Some(raw) = args.assignee.as_deref() {
            if raw.trim().is_empty() {
                if !item.assignee().is_empty() {
                    fields.push((FIELD_ASSIGNED_TO.to_string(), String::new()));
                }
            } else {
                let who = self.resolve_assignee(raw)?;
                if who != item.assignee() {
                    reassign = Some(who);
                }
            }
        }

        let mut last = None;
        if !fields.is_empty() {
            last = Some(self.az.update_work_item_fields(id, &fields)?);
        }
        if let Some(who) = reassign {
            last = Some(self.az.update_work_item_assignee(id, &who)?);
        }

        match last {
            Some(raw) => Ok(rendered("Edited", raw)),
            None => Ok(Report::text(ui::summary("No changes", &item))),
        }
    }

    pub fn board_columns(&self, work_item_type: &str) -> Result<Report, AbError> {
        let columns = self.az.board_columns_for_type(work_item_type)?;
        Ok(Report::text(ui::board_columns(work_item_type, &columns)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::az::testing::{RecordingExecutor, ScriptedPrompter};
    use crate::az::{ConfirmationPolicy, Invocation};
    use crate::board::ColumnSequence;
    use crate::cli::ListKind;
    use serde_json::{Value, json};

    fn orchestrator(exec: &RecordingExecutor, settings: Settings) -> BoardOrchestrator {
        let az = AzClient::new(
            exec.clone(),
            ScriptedPrompter::new([]),
            ConfirmationPolicy::Never,
            true,
        );
        BoardOrchestrator::new(az, settings)
    }

    fn short_columns() -> Settings {
        Settings {
            columns: ColumnSequence::new(["Backlog", "Ready", "Done"]).unwrap(),
            ..Settings::default()
        }
    }

    fn story(id: u64, column: &str) -> Value {
        json!({
            "id": id,
            "url": format!("https://dev.azure.com/acme/_apis/wit/workItems/{id}"),
            "fields": {
                "System.WorkItemType": "User Story",
                "System.State": "Active",
                "System.Title": "Checkout",
                "WEF_6C2_Kanban.Column": column
            }
        })
    }

    fn bytes(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    fn is(inv: &Invocation, verb: &str) -> bool {
        inv.args().get(2).is_some_and(|a| a == verb)
    }

    fn text(report: &Report) -> String {
        match &report.body {
            Body::Text(t) => console::strip_ansi_codes(t).into_owned(),
            Body::Raw(raw) => String::from_utf8_lossy(raw).into_owned(),
        }
    }

    #[test]
    fn forward_moves_to_next_column() {
        let exec = RecordingExecutor::answering(|inv| {
            if is(inv, "show") {
                Ok(bytes(story(5, "Ready")))
            } else {
                Ok(bytes(story(5, "Done")))
            }
        });
        let orch = orchestrator(&exec, short_columns());

        let report = orch.move_column(5, Direction::Forward).unwrap();
        assert_eq!(report.notices, ["Moved column from Ready to Done"]);
        assert!(text(&report).starts_with("Item pushed forward"));

        let updates = exec.mutations();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].args().last().map(String::as_str), Some("json"));
        assert!(updates[0].args().contains(&"WEF_6C2_Kanban.Column=Done".to_string()));
    }

    #[test]
    fn backward_moves_to_previous_column() {
        let exec = RecordingExecutor::answering(|_| Ok(bytes(story(5, "Ready"))));
        let orch = orchestrator(&exec, short_columns());

        let report = orch.move_column(5, Direction::Backward).unwrap();
        assert_eq!(report.notices, ["Moved column from Ready to Backlog"]);
        assert!(exec.mutations()[0].args().contains(&"WEF_6C2_Kanban.Column=Backlog".to_string()));
    }

    #[test]
    fn boundary_aborts_before_update() {
        let exec = RecordingExecutor::answering(|_| Ok(bytes(story(5, "Done"))));
        let orch = orchestrator(&exec, short_columns());

        let err = orch.move_column(5, Direction::Forward).unwrap_err();
        assert!(matches!(err, AbError::BoundaryReached { .. }));
        assert!(exec.mutations().is_empty());
    }

    #[test]
    fn unknown_column_aborts_before_update() {
        let exec = RecordingExecutor::answering(|_| Ok(bytes(story(5, "Doing"))));
        let orch = orchestrator(&exec, short_columns());

        let err = orch.move_column(5, Direction::Backward).unwrap_err();
        assert!(matches!(err, AbError::UnknownColumn(c) if c == "Doing"));
        assert!(exec.mutations().is_empty());
    }

    #[test]
    fn missing_kanban_field_is_reported() {
        let exec = RecordingExecutor::answering(|_| {
            Ok(bytes(json!({ "id": 8, "fields": { "System.WorkItemType": "Task" } })))
        });
        let orch = orchestrator(&exec, short_columns());
        assert!(matches!(
            orch.move_column(8, Direction::Forward),
            Err(AbError::MissingKanbanColumn(8))
        ));
    }

    #[test]
    fn declined_update_is_cancelled() {
        let exec = RecordingExecutor::answering(|_| Ok(bytes(story(5, "Backlog"))));
        let az = AzClient::new(
            exec.clone(),
            ScriptedPrompter::new([false]),
            ConfirmationPolicy::OnMutation,
            false,
        );
        let orch = BoardOrchestrator::new(az, short_columns());

        let err = orch.move_column(5, Direction::Forward).unwrap_err();
        assert!(err.is_cancelled());
        assert!(exec.mutations().is_empty());
        assert_eq!(exec.calls().len(), 1);
    }

    #[test]
    fn po_order_with_empty_ranked_partition() {
        let exec = RecordingExecutor::answering(|inv| {
            let q = inv.flag_value("--wiql").unwrap_or_default();
            if inv.args()[0] == "ad" {
                Ok(b"Ada\n".to_vec())
            } else if q.contains("NOT IN") {
                Ok(bytes(json!({ "workItems": [
                    { "id": 202, "fields": { "System.WorkItemType": "Task", "System.Title": "newer" } },
                    { "id": 201, "fields": { "System.WorkItemType": "Task", "System.Title": "older" } }
                ]})))
            } else {
                Ok(bytes(json!({ "workItems": [] })))
            }
        });
        let settings = Settings {
            po_order: true,
            ..Settings::default()
        };
        let orch = orchestrator(&exec, settings);

        let items = orch.listing(false, None).unwrap();
        let ids: Vec<u64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, [202, 201]);
    }

    #[test]
    fn po_order_puts_ranked_first() {
        let exec = RecordingExecutor::answering(|inv| {
            let q = inv.flag_value("--wiql").unwrap_or_default();
            if q.contains("NOT IN") {
                Ok(br#"[{"id":300}]"#.to_vec())
            } else {
                Ok(br#"{"value":[{"id":101},{"id":102}]}"#.to_vec())
            }
        });
        let settings = Settings {
            po_order: true,
            ..Settings::default()
        };
        let orch = orchestrator(&exec, settings);

        let ids: Vec<u64> = orch.listing(true, None).unwrap().iter().map(|i| i.id).collect();
        assert_eq!(ids, [101, 102, 300]);
        assert_eq!(exec.calls().len(), 2);
    }

    #[test]
    fn list_keeps_query_order_when_display_name_lookup_fails() {
        let exec = RecordingExecutor::answering(|inv| {
            if inv.args()[0] == "ad" {
                Err(AbError::Execution {
                    command: inv.command_line(),
                    cause: "exit status: 1".into(),
                    stderr: "not logged in".into(),
                })
            } else {
                Ok(br#"[{"id":3,"fields":{"System.Title":"charlie"}},{"id":1,"fields":{"System.Title":"alpha"}}]"#
                    .to_vec())
            }
        });
        let orch = orchestrator(&exec, Settings::default());

        let args = ListArgs {
            kind: None,
            all: false,
            parent: None,
        };
        let out = text(&orch.list(&args).unwrap());
        assert!(out.starts_with("Work Items"));
        assert!(out.find("charlie").unwrap() < out.find("alpha").unwrap());
    }

    #[test]
    fn list_aborts_when_display_name_lookup_is_cancelled() {
        let exec = RecordingExecutor::answering(|_| Ok(b"[]".to_vec()));
        let az = AzClient::new(
            exec.clone(),
            ScriptedPrompter::new([true, false]),
            ConfirmationPolicy::Always,
            true,
        );
        let orch = BoardOrchestrator::new(az, Settings::default());
        let args = ListArgs {
            kind: Some(ListKind::Bugs),
            all: false,
            parent: None,
        };
        assert!(orch.list(&args).unwrap_err().is_cancelled());
        assert_eq!(exec.calls().len(), 1);
    }

    #[test]
    fn children_use_strict_then_lenient_queries() {
        let exec = RecordingExecutor::answering(|inv| {
            let q = inv.flag_value("--wiql").unwrap_or_default();
            if q.contains("[System.Parent] = 10") {
                Ok(br#"{"workItems":[{"id":12},{"id":11}]}"#.to_vec())
            } else {
                Ok(br#"[{"id":12,"fields":{"System.Title":"b"}},{"id":11,"fields":{"System.Title":"a"}}]"#
                    .to_vec())
            }
        });
        let orch = orchestrator(&exec, Settings::default());

        let children = orch.children(10, false).unwrap();
        assert_eq!(children.iter().map(|c| c.id).collect::<Vec<_>>(), [12, 11]);
        let second = exec.calls()[1].flag_value("--wiql").unwrap_or_default().to_string();
        assert!(second.contains("[System.Id] IN (12,11)"));
    }

    #[test]
    fn children_with_unrecognised_id_payload_fail() {
        let exec = RecordingExecutor::answering(|_| Ok(br#"{"count":0}"#.to_vec()));
        let orch = orchestrator(&exec, Settings::default());
        assert!(matches!(orch.children(10, false), Err(AbError::UnrecognizedShape)));
    }

    #[test]
    fn no_children_skips_second_query() {
        let exec = RecordingExecutor::answering(|_| Ok(br#"{"workItems":[]}"#.to_vec()));
        let orch = orchestrator(&exec, Settings::default());
        assert!(orch.children(10, true).unwrap().is_empty());
        assert_eq!(exec.calls().len(), 1);
    }

    #[test]
    fn resolve_closes_tasks_and_resolves_others() {
        for (wtype, target) in [("Task", "System.State=Closed"), ("Bug", "System.State=Resolved")] {
            let exec = RecordingExecutor::answering(move |_| {
                Ok(bytes(json!({ "id": 4, "fields": { "System.WorkItemType": wtype } })))
            });
            let orch = orchestrator(&exec, Settings::default());
            orch.resolve(4).unwrap();
            assert!(exec.mutations()[0].args().contains(&target.to_string()), "{wtype}");
        }
    }

    #[test]
    fn work_on_assigns_then_activates() {
        let exec = RecordingExecutor::answering(|inv| {
            if inv.args()[0] == "ad" {
                Ok(b"ada@example.com\n".to_vec())
            } else {
                Ok(b"{}".to_vec())
            }
        });
        let orch = orchestrator(&exec, Settings::default());
        orch.work_on(3).unwrap();
        assert_eq!(
            exec.mutations()[0].args()[5..],
            ["--fields", "System.AssignedTo=ada@example.com", "System.State=Active", "-o", "json"]
        );
    }

    #[test]
    fn undecodable_update_passes_through() {
        let exec = RecordingExecutor::answering(|_| Ok(b"not json".to_vec()));
        let orch = orchestrator(&exec, Settings::default());
        let report = orch.set_state(3, "New", "Renewed").unwrap();
        assert_eq!(report.body, Body::Raw(b"not json".to_vec()));
    }

    #[test]
    fn delete_reports_id() {
        let exec = RecordingExecutor::answering(|_| Ok(Vec::new()));
        let orch = orchestrator(&exec, Settings::default());
        let report = orch.delete(9).unwrap();
        assert_eq!(report.notices, ["Deleted AB#9"]);
        assert!(exec.calls()[0].args().contains(&"--yes".to_string()));
    }

    #[test]
    fn create_task_links_parent() {
        let exec = RecordingExecutor::answering(|inv| match inv.args().get(2).map(String::as_str) {
            Some("show") => Ok(bytes(story(42, "Backlog"))),
            Some("create") => Ok(bytes(json!({ "id": 77, "fields": { "System.WorkItemType": "Task" } }))),
            _ => Ok(b"{}".to_vec()),
        });
        let orch = orchestrator(&exec, Settings::default());

        let report = orch.create_child(ChildKind::Task, "Wire it", 42, None).unwrap();
        assert_eq!(report.notices, ["Linked AB#77 as child of AB#42"]);

        let mutations = exec.mutations();
        assert_eq!(
            mutations[0].command_line(),
            "az boards work-item create --type Task --title 'Wire it' -o json"
        );
        assert_eq!(mutations[1].flag_value("--id"), Some("77"));
        assert_eq!(mutations[1].flag_value("--target-id"), Some("42"));
        assert_eq!(mutations[1].flag_value("--relation-type"), Some("parent"));
    }

    #[test]
    fn create_bug_sets_state_and_severity() {
        let exec = RecordingExecutor::answering(|inv| match inv.args().get(2).map(String::as_str) {
            Some("show") => Ok(bytes(story(42, "Backlog"))),
            Some("create") => Ok(bytes(json!({ "id": 78 }))),
            _ => Ok(b"{}".to_vec()),
        });
        let orch = orchestrator(&exec, Settings::default());

        orch.create_child(ChildKind::Bug(Severity::default()), "Crash", 42, Some("grace@example.com"))
            .unwrap();
        let create = &exec.mutations()[0];
        let fields: Vec<&str> = create
            .args()
            .iter()
            .skip_while(|a| *a != "--fields")
            .skip(1)
            .take_while(|a| *a != "-o")
            .map(String::as_str)
            .collect();
        assert_eq!(
            fields,
            [
                "System.State=New",
                "System.AssignedTo=grace@example.com",
                "Microsoft.VSTS.Common.Severity=3 - Medium"
            ]
        );
    }

    #[test]
    fn create_child_rejects_non_story_parent() {
        let exec = RecordingExecutor::answering(|_| {
            Ok(bytes(json!({ "id": 5, "fields": { "System.WorkItemType": "Task" } })))
        });
        let orch = orchestrator(&exec, Settings::default());
        let err = orch.create_child(ChildKind::Task, "x", 5, None).unwrap_err();
        assert!(matches!(err, AbError::InvalidParent(5)));
        assert!(exec.mutations().is_empty());
    }

    #[test]
    fn relation_failure_reports_created_id() {
        let exec = RecordingExecutor::answering(|inv| {
            if inv.args().get(2).is_some_and(|a| a == "relation") {
                return Err(AbError::Execution {
                    command: inv.command_line(),
                    cause: "exit status: 1".into(),
                    stderr: String::new(),
                });
            }
            match inv.args().get(2).map(String::as_str) {
                Some("show") => Ok(bytes(story(42, "Backlog"))),
                _ => Ok(bytes(json!({ "id": 79 }))),
            }
        });
        let orch = orchestrator(&exec, Settings::default());
        let err = orch.create_child(ChildKind::Task, "x", 42, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "created task 79 but failed to add parent relation to 42"
        );
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("az boards work-item relation add --id 79 \
             --relation-type parent --target-id 42 -o json failed: exit status: 1"));
    }

    #[test]
    fn declined_relation_after_create_is_cancelled() {
        let exec = RecordingExecutor::answering(|inv| match inv.args().get(2).map(String::as_str) {
            Some("show") => Ok(bytes(story(42, "Backlog"))),
            _ => Ok(bytes(json!({ "id": 77 }))),
        });
        let az = AzClient::new(
            exec.clone(),
            ScriptedPrompter::new([true, false]),
            ConfirmationPolicy::OnMutation,
            true,
        );
        let orch = BoardOrchestrator::new(az, Settings::default());

        let err = orch.create_child(ChildKind::Task, "x", 42, None).unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(exec.mutations().len(), 1);
    }

    #[test]
    fn create_story_resolves_me() {
        let exec = RecordingExecutor::answering(|inv| {
            if inv.args()[0] == "ad" {
                Ok(b"ada@example.com".to_vec())
            } else {
                Ok(bytes(json!({ "id": 80, "fields": { "System.WorkItemType": "User Story" } })))
            }
        });
        let orch = orchestrator(&exec, Settings::default());
        let report = orch.create_story("Checkout", Some("@me")).unwrap();
        assert!(text(&report).starts_with("User Story Created"));
        assert!(exec.mutations()[0]
            .args()
            .contains(&"System.AssignedTo=ada@example.com".to_string()));
    }

    #[test]
    fn edit_without_changes_sends_nothing() {
        let exec = RecordingExecutor::answering(|_| Ok(bytes(story(5, "Ready"))));
        let orch = orchestrator(&exec, short_columns());
        let args = EditArgs {
            id: 5,
            title: Some("Checkout".into()),
            column: Some("Ready".into()),
            ..EditArgs::default()
        };
        let report = orch.edit(&args).unwrap();
        assert!(text(&report).starts_with("No changes"));
        assert!(exec.mutations().is_empty());
    }

    #[test]
    fn edit_sends_only_changed_fields_then_reassigns() {
        let exec = RecordingExecutor::answering(|_| Ok(bytes(story(5, "Ready"))));
        let orch = orchestrator(&exec, short_columns());
        let args = EditArgs {
            id: 5,
            title: Some("Checkout".into()),
            state: Some("Resolved".into()),
            column: Some("Done".into()),
            assignee: Some("grace@example.com".into()),
            ..EditArgs::default()
        };
        orch.edit(&args).unwrap();

        let mutations = exec.mutations();
        assert_eq!(mutations.len(), 2);
        assert_eq!(
            mutations[0].args()[5..],
            ["--fields", "System.State=Resolved", "WEF_6C2_Kanban.Column=Done", "-o", "json"]
        );
        assert_eq!(mutations[1].flag_value("--assigned-to"), Some("grace@example.com"));
    }

    #[test]
    fn edit_rejects_column_outside_sequence() {
        let exec = RecordingExecutor::answering(|_| Ok(bytes(story(5, "Ready"))));
        let orch = orchestrator(&exec, short_columns());
        let args = EditArgs {
            id: 5,
            column: Some("Deploy".into()),
            ..EditArgs::default()
        };
        assert!(matches!(orch.edit(&args), Err(AbError::UnknownColumn(c)) if c == "Deploy"));
        assert!(exec.mutations().is_empty());
    }

    #[test]
    fn show_story_includes_children() {
        let exec = RecordingExecutor::answering(|inv| {
            if is(inv, "show") {
                Ok(bytes(story(10, "Ready")))
            } else {
                Ok(br#"{"workItems":[{"id":12,"fields":{"System.Title":"child"}}]}"#.to_vec())
            }
        });
        let orch = orchestrator(&exec, Settings::default());
        let out = text(&orch.show(10, false).unwrap());
        assert!(out.starts_with("User Story AB#10"));
        assert!(out.contains("Column:\nReady"));
        assert!(out.contains("child"));
    }

    #[test]
    fn execute_dispatches_commands() {
        let exec = RecordingExecutor::answering(|_| Ok(Vec::new()));
        let orch = orchestrator(&exec, Settings::default());
        let report = orch.execute(&Command::Delete { id: 4 }).unwrap();
        assert_eq!(report.notices, ["Deleted AB#4"]);
    }
}
