// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anttracker_app::{Issue, IssueChange, IssueId, Priority, Status, validate_description};
use anyhow::{Result, bail};
use std::rc::Rc;
use tracing::info;

use crate::TrackerRuntime;
use crate::issues::{print_summary, view_issue};
use crate::screen::{Ctx, MenuBuilder, Next, Screen, action, goto};
use crate::terminal::ABORT;

/// Where the editor's candidate values come from.
#[derive(Clone, Copy)]
pub enum LegalValues {
    /// A fixed set computed from the current record. Empty means the field
    /// cannot change.
    Choices(fn(&mut dyn TrackerRuntime, &Issue) -> Result<Vec<String>>),
    FreeText(fn(&str) -> bool),
}

/// Configuration for the one generic issue editor.
#[derive(Clone, Copy)]
pub struct AttributeEditor {
    pub field: &'static str,
    pub read: fn(&Issue) -> String,
    pub legal: LegalValues,
    pub parse: fn(&mut dyn TrackerRuntime, &Issue, &str) -> Result<IssueChange>,
}

impl AttributeEditor {
    pub fn screen(self, issue_id: IssueId) -> Rc<dyn Screen> {
        Rc::new(EditScreen {
            editor: self,
            issue_id,
        })
    }
}

pub const DESCRIPTION: AttributeEditor = AttributeEditor {
    field: "description",
    read: read_description,
    legal: LegalValues::FreeText(description_is_valid),
    parse: parse_description,
};

pub const PRIORITY: AttributeEditor = AttributeEditor {
    field: "priority",
    read: read_priority,
    legal: LegalValues::Choices(priority_choices),
    parse: parse_priority,
};

pub const STATUS: AttributeEditor = AttributeEditor {
    field: "status",
    read: read_status,
    legal: LegalValues::Choices(status_choices),
    parse: parse_status,
};

pub const ANTICIPATED_RELEASE: AttributeEditor = AttributeEditor {
    field: "anticipated release",
    read: read_release,
    legal: LegalValues::Choices(release_choices),
    parse: parse_release,
};

fn read_description(issue: &Issue) -> String {
    issue.description.clone()
}

fn description_is_valid(value: &str) -> bool {
    validate_description(value).is_ok()
}

fn parse_description(
    _runtime: &mut dyn TrackerRuntime,
    _issue: &Issue,
    value: &str,
) -> Result<IssueChange> {
    validate_description(value)?;
    Ok(IssueChange::Description(value.to_owned()))
}

fn read_priority(issue: &Issue) -> String {
    issue.priority.to_string()
}

fn priority_choices(_runtime: &mut dyn TrackerRuntime, _issue: &Issue) -> Result<Vec<String>> {
    Ok(Priority::all().map(|priority| priority.to_string()).collect())
}

fn parse_priority(
    _runtime: &mut dyn TrackerRuntime,
    _issue: &Issue,
    value: &str,
) -> Result<IssueChange> {
    let priority = anttracker_app::parse_priority(value)?;
    Ok(IssueChange::Priority(priority))
}

fn read_status(issue: &Issue) -> String {
    issue.status.label().to_owned()
}

fn status_choices(_runtime: &mut dyn TrackerRuntime, issue: &Issue) -> Result<Vec<String>> {
    Ok(issue
        .status
        .next_statuses()
        .iter()
        .map(|status| status.label().to_owned())
        .collect())
}

fn parse_status(
    _runtime: &mut dyn TrackerRuntime,
    _issue: &Issue,
    value: &str,
) -> Result<IssueChange> {
    let Some(status) = Status::parse_label(value) else {
        bail!("unknown status {value:?} -- choose one of the listed statuses");
    };
    Ok(IssueChange::Status(status))
}

fn read_release(issue: &Issue) -> String {
    issue.anticipated_release.clone().unwrap_or_default()
}

fn release_choices(runtime: &mut dyn TrackerRuntime, issue: &Issue) -> Result<Vec<String>> {
    Ok(runtime
        .list_releases_for_product(issue.product_id)?
        .into_iter()
        .map(|release| release.name)
        .collect())
}

fn parse_release(
    runtime: &mut dyn TrackerRuntime,
    issue: &Issue,
    value: &str,
) -> Result<IssueChange> {
    let Some(release) = runtime
        .list_releases_for_product(issue.product_id)?
        .into_iter()
        .find(|release| release.name == value)
    else {
        bail!(
            "release {value} not found for product {} -- it may have been deleted",
            issue.product
        );
    };
    Ok(IssueChange::AnticipatedRelease {
        id: release.id,
        name: release.name,
    })
}

struct EditScreen {
    editor: AttributeEditor,
    issue_id: IssueId,
}

impl Screen for EditScreen {
    fn run(&self, ctx: &mut Ctx<'_>) -> Result<Next> {
        let issue_id = self.issue_id;
        let issue = ctx.runtime.get_issue(issue_id)?;
        let field = self.editor.field;

        let answer = match self.editor.legal {
            LegalValues::Choices(values) => {
                let values = values(&mut *ctx.runtime, &issue)?;
                if values.is_empty() {
                    return Ok(Some(view_issue(issue_id)));
                }
                let message = format!("Please enter {field} ({}). ` to abort:", values.join(", "));
                let mut accepted = values;
                accepted.push(ABORT.to_owned());
                ctx.terminal.prompt_choice(&message, &accepted)?
            }
            LegalValues::FreeText(valid) => ctx.terminal.prompt_valid(
                &format!("Please enter {field}. ` to abort:"),
                false,
                &valid,
            )?,
        };
        if answer == ABORT {
            return Ok(Some(view_issue(issue_id)));
        }

        let change = (self.editor.parse)(&mut *ctx.runtime, &issue, &answer)?;
        print_summary(ctx.terminal, &issue)?;
        ctx.terminal.title(&format!("Update: {field}"))?;
        ctx.terminal
            .print_line(&format!("OLD: {}", (self.editor.read)(&issue)))?;
        ctx.terminal.print_line(&format!("NEW: {answer}"))?;

        MenuBuilder::new()
            .option(
                "Save",
                action(move |ctx| {
                    let updated = ctx.runtime.update_issue(issue_id, &change)?;
                    info!(issue = %updated.id, field, "issue updated");
                    Ok(Some(view_issue(updated.id)))
                }),
            )
            .option("Back", goto(move || view_issue(issue_id)))
            .on_abort(goto(move || view_issue(issue_id)))
            .build()
            .run(ctx)
    }
}
