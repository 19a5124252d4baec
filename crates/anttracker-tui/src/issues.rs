// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anttracker_app::{
    DESCRIPTION_MAX, FilterSet, Issue, IssueFilter, IssueId, Pager, Request, Status, parse_days,
    parse_priority, parse_status_list, validate_description,
};
use anyhow::Result;
use std::rc::Rc;

use crate::editor::{ANTICIPATED_RELEASE, AttributeEditor, DESCRIPTION, PRIORITY, STATUS};
use crate::screen::{
    Ctx, Factory, MenuBuilder, Next, Screen, SelectRowScreen, TableScreen, action, goto,
    run_session,
};
use crate::table::{Column, TableCell, format_date};
use crate::terminal::{ABORT, Terminal};

const ISSUE_COLUMNS: [Column; 6] = [
    Column::new("ID", 7),
    Column::new("Description", 30),
    Column::new("Priority", 9),
    Column::new("Status", 14),
    Column::new("AntRel", 8),
    Column::new("Created", 10),
];

const REQUEST_COLUMNS: [Column; 5] = [
    Column::new("Affected Release", 17),
    Column::new("Date requested", 14),
    Column::new("Name", 32),
    Column::new("Email", 24),
    Column::new("Department", 12),
];

fn issue_row(issue: &Issue) -> Vec<TableCell> {
    vec![
        TableCell::Integer(issue.id.get()),
        TableCell::text(issue.description.as_str()),
        TableCell::Integer(i64::from(issue.priority.get())),
        TableCell::text(issue.status.label()),
        TableCell::optional_text(issue.anticipated_release.as_deref()),
        TableCell::timestamp(issue.created_at),
    ]
}

fn request_row(request: &Request) -> Vec<TableCell> {
    vec![
        TableCell::text(request.affected_release.as_str()),
        TableCell::timestamp(request.requested_at),
        TableCell::text(request.contact_name.as_str()),
        TableCell::text(request.contact_email.as_str()),
        TableCell::text(request.contact_department.as_str()),
    ]
}

fn filter_lines(filters: &FilterSet) -> Vec<String> {
    if filters.is_empty() {
        return vec!["Active filters: none".to_owned()];
    }
    let mut lines = vec!["Active filters:".to_owned()];
    lines.extend(filters.labels().into_iter().map(|label| format!("  {label}")));
    lines
}

/// Entry point of the issue browser: pick a search category to narrow the
/// active filters, list matches, or start over.
pub fn issues_menu(filters: FilterSet) -> Rc<dyn Screen> {
    let mut menu = MenuBuilder::new().title("VIEW/EDIT ISSUE");
    for line in filter_lines(&filters) {
        menu = menu.line(line);
    }
    for target in SearchTarget::ALL {
        menu = menu.option(format!("Search by {}", target.noun()), search_by(&filters, target));
    }
    let all = filters.clone();
    menu.prompt("Please select search category.")
        .option(
            "Display all issues",
            goto(move || search_results(all.clone(), Pager::new(0))),
        )
        .option("Clear filters", goto(|| issues_menu(FilterSet::new())))
        .screen()
}

fn search_by(filters: &FilterSet, target: SearchTarget) -> Factory {
    let filters = filters.clone();
    goto(move || {
        Rc::new(SearchByScreen {
            filters: filters.clone(),
            target,
        })
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchTarget {
    Description,
    Product,
    AnticipatedRelease,
    Status,
    Priority,
    DaysSinceCreation,
}

impl SearchTarget {
    const ALL: [Self; 6] = [
        Self::Description,
        Self::Product,
        Self::AnticipatedRelease,
        Self::Status,
        Self::Priority,
        Self::DaysSinceCreation,
    ];

    const fn noun(self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::Product => "product",
            Self::AnticipatedRelease => "anticipated release",
            Self::Status => "status",
            Self::Priority => "priority",
            Self::DaysSinceCreation => "days since creation",
        }
    }

    fn message(self) -> String {
        let tail = "or leave it empty to go back to the issues menu";
        match self {
            Self::Description => {
                format!("Please enter a description (1-{DESCRIPTION_MAX} characters) to search for {tail}")
            }
            Self::Status => {
                let labels = Status::ALL.map(Status::label).join(", ");
                format!("Enter all the statuses to search for separated by commas ({labels}) {tail}")
            }
            Self::DaysSinceCreation => {
                format!("Please enter the maximum number of days since creation {tail}")
            }
            other => format!("Please enter a {} to search for {tail}", other.noun()),
        }
    }

    /// Candidate values for choice-driven searches; `None` for typed ones.
    fn choices(self, ctx: &mut Ctx<'_>) -> Result<Option<Vec<String>>> {
        match self {
            Self::Product => ctx.runtime.list_product_names().map(Some),
            Self::AnticipatedRelease => ctx.runtime.list_release_names().map(Some),
            _ => Ok(None),
        }
    }

    fn parse(self, input: &str) -> Option<IssueFilter> {
        let input = input.trim();
        match self {
            Self::Description => validate_description(input)
                .ok()
                .map(|()| IssueFilter::DescriptionContains(input.to_owned())),
            Self::Product => Some(IssueFilter::ProductEquals(input.to_owned())),
            Self::AnticipatedRelease => {
                Some(IssueFilter::AnticipatedReleaseEquals(input.to_owned()))
            }
            Self::Status => parse_status_list(input).ok().map(IssueFilter::StatusIn),
            Self::Priority => parse_priority(input).ok().map(IssueFilter::PriorityEquals),
            Self::DaysSinceCreation => parse_days(input).ok().map(IssueFilter::CreatedWithinDays),
        }
    }
}

struct SearchByScreen {
    filters: FilterSet,
    target: SearchTarget,
}

impl Screen for SearchByScreen {
    fn run(&self, ctx: &mut Ctx<'_>) -> Result<Next> {
        ctx.terminal
            .title(&format!("Search by {}", self.target.noun()))?;
        let message = self.target.message();
        let input = match self.target.choices(ctx)? {
            Some(mut choices) => {
                ctx.terminal.print_line(&choices.join(", "))?;
                choices.push(String::new());
                choices.push(ABORT.to_owned());
                ctx.terminal.prompt_choice(&message, &choices)?
            }
            None => {
                let target = self.target;
                ctx.terminal
                    .prompt_valid(&message, true, &|input: &str| target.parse(input).is_some())?
            }
        };
        if input == ABORT {
            return Ok(None);
        }
        ctx.terminal.blank_line()?;
        if input.trim().is_empty() {
            ctx.terminal.print_line("Going back to the issues menu...")?;
            return Ok(Some(issues_menu(self.filters.clone())));
        }
        let Some(filter) = self.target.parse(&input) else {
            return Ok(Some(issues_menu(self.filters.clone())));
        };
        Ok(Some(search_results(self.filters.add(filter), Pager::new(0))))
    }
}

/// Issues matching every active filter, ordered by id.
pub fn search_results(filters: FilterSet, pager: Pager) -> Rc<dyn Screen> {
    let condition = Rc::new(filters.compile());
    let count_condition = Rc::clone(&condition);
    let reopen_filters = filters.clone();
    let menu_filters = filters.clone();
    let row_filters = filters.clone();

    let mut table = TableScreen::<Issue>::builder("Search Results", pager, issue_row, move |next| {
        search_results(reopen_filters.clone(), next)
    })
    .columns(&ISSUE_COLUMNS)
    .query(
        move |runtime| runtime.count_issues(&count_condition),
        move |runtime, pager| runtime.fetch_issues(&condition, pager.offset(), pager.limit()),
    )
    .empty_message("No issues found.")
    .option(
        "Select filter",
        goto(move || issues_menu(menu_filters.clone())),
    )
    .row_option("View issue", move |_ctx, rows, pager| {
        let back = search_results(row_filters.clone(), pager);
        let results = Rc::clone(&back);
        Ok(Some(SelectRowScreen::screen(
            "Enter the row number of the issue you want to view.",
            rows,
            move |issue: &Issue| {
                Rc::new(IssueSession {
                    issue_id: issue.id,
                    results: Rc::clone(&results),
                }) as Rc<dyn Screen>
            },
            back,
        )))
    });
    for line in filter_lines(&filters) {
        table = table.line(line);
    }
    table.screen()
}

pub(crate) fn summary_lines(issue: &Issue) -> Vec<String> {
    vec![
        format!("Description: {}", issue.description),
        format!("Priority: {}", issue.priority),
        format!("Status: {}", issue.status),
        format!(
            "AntRel: {}",
            issue.anticipated_release.as_deref().unwrap_or_default()
        ),
        format!("Created: {}", format_date(issue.created_at.date())),
    ]
}

pub(crate) fn print_summary(terminal: &mut dyn Terminal, issue: &Issue) -> Result<()> {
    terminal.title("Summary")?;
    for line in summary_lines(issue) {
        terminal.print_line(&line)?;
    }
    terminal.blank_line()
}

/// Views, edits and request listings of one issue run as their own session;
/// leaving it, or losing the issue, lands back on the search results.
struct IssueSession {
    issue_id: IssueId,
    results: Rc<dyn Screen>,
}

impl Screen for IssueSession {
    fn run(&self, ctx: &mut Ctx<'_>) -> Result<Next> {
        run_session(view_issue(self.issue_id), ctx)?;
        Ok(Some(Rc::clone(&self.results)))
    }
}

pub fn view_issue(issue_id: IssueId) -> Rc<dyn Screen> {
    Rc::new(ViewIssueScreen { issue_id })
}

fn edit(editor: AttributeEditor, issue_id: IssueId) -> Factory {
    goto(move || editor.screen(issue_id))
}

/// One issue's fields. The first four options open the editor for that
/// field; the rest are read-only.
struct ViewIssueScreen {
    issue_id: IssueId,
}

impl Screen for ViewIssueScreen {
    fn run(&self, ctx: &mut Ctx<'_>) -> Result<Next> {
        let id = self.issue_id;
        let issue = ctx.runtime.get_issue(id)?;
        let locked = if issue.status.is_terminal() {
            " (not editable)"
        } else {
            ""
        };
        let print_issue = issue.clone();

        MenuBuilder::new()
            .title(format!("Issue #{id}"))
            .option(
                format!("Description: {}", issue.description),
                edit(DESCRIPTION, id),
            )
            .option(format!("Priority: {}", issue.priority), edit(PRIORITY, id))
            .option(format!("Status: {}{locked}", issue.status), edit(STATUS, id))
            .option(
                format!(
                    "AntRel: {}",
                    issue.anticipated_release.as_deref().unwrap_or_default()
                ),
                edit(ANTICIPATED_RELEASE, id),
            )
            .option(
                format!(
                    "Created: {} (not editable)",
                    format_date(issue.created_at.date())
                ),
                goto(move || view_issue(id)),
            )
            .option("Requests", goto(move || requests(id, Pager::new(0))))
            .option(
                "Print",
                action(move |ctx| {
                    print_summary(ctx.terminal, &print_issue)?;
                    Ok(Some(view_issue(id)))
                }),
            )
            .prompt("Enter 1, 2, 3, or 4 to edit the respective fields.")
            .build()
            .run(ctx)
    }
}

fn requests(issue_id: IssueId, pager: Pager) -> Rc<dyn Screen> {
    TableScreen::<Request>::builder(
        format!("Requests for issue #{issue_id}"),
        pager,
        request_row,
        move |next| requests(issue_id, next),
    )
    .columns(&REQUEST_COLUMNS)
    .query(
        move |runtime| runtime.count_requests(issue_id),
        move |runtime, pager| runtime.fetch_requests(issue_id, pager.offset(), pager.limit()),
    )
    .empty_message("No requests found.")
    .option("Back to issue", goto(move || view_issue(issue_id)))
    .on_abort(goto(move || view_issue(issue_id)))
    .screen()
}
