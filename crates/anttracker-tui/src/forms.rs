// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anttracker_app::{
    CONTACT_NAME_MAX, Condition, Contact, ContactFormInput, DEPARTMENT_MAX, DESCRIPTION_MAX,
    EMAIL_MAX, EMAIL_MIN, FormPayload, Issue, IssueFormInput, PRODUCT_NAME_MAX, Pager, Priority,
    Product, ProductFormInput, RELEASE_NAME_MAX, Release, ReleaseFormInput, RequestFormInput,
    parse_date, parse_priority, validate_contact_name, validate_department, validate_description,
    validate_email, validate_phone, validate_product_name, validate_release_name,
};
use anyhow::Result;
use std::rc::Rc;
use tracing::info;

use crate::TrackerRuntime;
use crate::screen::{Ctx, MenuBuilder, Next, Screen, action};
use crate::table::{Column, TableCell};
use crate::terminal::ABORT;

const PRODUCT_COLUMNS: [Column; 2] = [Column::new("ID", 7), Column::new("Name", 30)];
const RELEASE_COLUMNS: [Column; 2] = [Column::new("Release", 8), Column::new("Release date", 12)];
const CONTACT_COLUMNS: [Column; 3] = [
    Column::new("Name", 32),
    Column::new("Email", 24),
    Column::new("Department", 12),
];
const ISSUE_COLUMNS: [Column; 4] = [
    Column::new("ID", 7),
    Column::new("Description", 30),
    Column::new("Product", 30),
    Column::new("Status", 14),
];

pub fn new_issue() -> Rc<dyn Screen> {
    Rc::new(NewIssueForm)
}

pub fn new_request() -> Rc<dyn Screen> {
    Rc::new(NewRequestForm)
}

pub fn new_release() -> Rc<dyn Screen> {
    Rc::new(NewReleaseForm)
}

pub fn new_product() -> Rc<dyn Screen> {
    Rc::new(NewProductForm)
}

pub fn new_contact() -> Rc<dyn Screen> {
    Rc::new(NewContactForm)
}

/// Prompt for one field. `None` when the user aborts.
fn ask(
    ctx: &mut Ctx<'_>,
    message: &str,
    allow_empty: bool,
    valid: &dyn Fn(&str) -> bool,
) -> Result<Option<String>> {
    let answer = ctx
        .terminal
        .prompt_valid(&format!("{message} ` to abort:"), allow_empty, valid)?;
    if answer == ABORT {
        return Ok(None);
    }
    Ok(Some(answer.trim().to_owned()))
}

fn choose(ctx: &mut Ctx<'_>, message: &str, choices: &[String]) -> Result<Option<String>> {
    let mut accepted = choices.to_vec();
    accepted.push(ABORT.to_owned());
    let answer = ctx
        .terminal
        .prompt_choice(&format!("{message} ` to abort:"), &accepted)?;
    Ok((answer != ABORT).then_some(answer))
}

/// Page through candidates twenty at a time until one is picked by row
/// number. An empty answer shows the next page.
fn pick<T>(
    ctx: &mut Ctx<'_>,
    noun: &str,
    columns: &[Column],
    to_row: fn(&T) -> Vec<TableCell>,
    count: impl Fn(&mut dyn TrackerRuntime) -> Result<usize>,
    fetch: impl Fn(&mut dyn TrackerRuntime, &Pager) -> Result<Vec<T>>,
) -> Result<Option<T>> {
    let total = count(&mut *ctx.runtime)?;
    if total == 0 {
        ctx.terminal.print_line(&format!("No {noun}s found."))?;
        return Ok(None);
    }

    let mut pager = Pager::new(total);
    loop {
        let mut rows = fetch(&mut *ctx.runtime, &pager)?;
        let cells = rows.iter().map(to_row).collect::<Vec<_>>();
        ctx.terminal.display_table(columns, &cells)?;
        if !pager.is_last_page() {
            ctx.terminal
                .print_line(&format!("<Enter> for {} more.", pager.remaining()))?;
        }

        let mut choices = (1..=rows.len())
            .map(|row| row.to_string())
            .collect::<Vec<_>>();
        choices.push(String::new());
        choices.push(ABORT.to_owned());
        let answer = ctx
            .terminal
            .prompt_choice(&format!("Please select {noun}. ` to abort:"), &choices)?;
        if answer == ABORT {
            return Ok(None);
        }
        if answer.is_empty() {
            match pager.next() {
                Ok(next) => pager = next,
                Err(boundary) => ctx.terminal.print_line(&boundary.to_string())?,
            }
            continue;
        }
        if let Some(index) = answer.parse::<usize>().ok().and_then(|row| row.checked_sub(1))
            && index < rows.len()
        {
            return Ok(Some(rows.swap_remove(index)));
        }
    }
}

fn pick_product(ctx: &mut Ctx<'_>) -> Result<Option<Product>> {
    pick::<Product>(
        ctx,
        "product",
        &PRODUCT_COLUMNS,
        |product: &Product| {
            vec![
                TableCell::Integer(product.id.get()),
                TableCell::text(product.name.as_str()),
            ]
        },
        |runtime| runtime.count_products(),
        |runtime, pager| runtime.fetch_products(pager.offset(), pager.limit()),
    )
}

fn pick_release(ctx: &mut Ctx<'_>, product: &Product) -> Result<Option<Release>> {
    let product_id = product.id;
    pick::<Release>(
        ctx,
        "affected release",
        &RELEASE_COLUMNS,
        |release: &Release| {
            vec![
                TableCell::text(release.name.as_str()),
                TableCell::Date(release.release_date),
            ]
        },
        move |runtime| runtime.count_releases(product_id),
        move |runtime, pager| runtime.fetch_releases(product_id, pager.offset(), pager.limit()),
    )
}

fn pick_contact(ctx: &mut Ctx<'_>) -> Result<Option<Contact>> {
    pick::<Contact>(
        ctx,
        "contact",
        &CONTACT_COLUMNS,
        |contact: &Contact| {
            vec![
                TableCell::text(contact.name.as_str()),
                TableCell::text(contact.email.as_str()),
                TableCell::text(contact.department.as_str()),
            ]
        },
        |runtime| runtime.count_contacts(),
        |runtime, pager| runtime.fetch_contacts(pager.offset(), pager.limit()),
    )
}

fn pick_issue(ctx: &mut Ctx<'_>) -> Result<Option<Issue>> {
    let everything = Condition::Always;
    let page_condition = everything.clone();
    pick::<Issue>(
        ctx,
        "issue",
        &ISSUE_COLUMNS,
        |issue: &Issue| {
            vec![
                TableCell::Integer(issue.id.get()),
                TableCell::text(issue.description.as_str()),
                TableCell::text(issue.product.as_str()),
                TableCell::text(issue.status.label()),
            ]
        },
        move |runtime| runtime.count_issues(&everything),
        move |runtime, pager| runtime.fetch_issues(&page_condition, pager.offset(), pager.limit()),
    )
}

/// Summary and Save/Back. Either way the form session ends.
fn confirm(summary: Vec<String>, payload: FormPayload) -> Result<Next> {
    let kind = payload.kind();
    let mut menu = MenuBuilder::new().title("Summary");
    for line in summary {
        menu = menu.line(line);
    }
    Ok(Some(
        menu.prompt(format!("Save this {}?", kind.label()))
            .abort_hint(" ` to discard:")
            .option(
                "Save",
                action(move |ctx| {
                    ctx.runtime.submit_form(&payload)?;
                    info!(kind = kind.label(), "form saved");
                    ctx.terminal
                        .print_line(&format!("New {} saved.", kind.label()))?;
                    Ok(None)
                }),
            )
            .option(
                "Back",
                action(move |ctx| {
                    ctx.terminal
                        .print_line(&format!("New {} discarded.", kind.label()))?;
                    Ok(None)
                }),
            )
            .screen(),
    ))
}

struct NewProductForm;

impl Screen for NewProductForm {
    fn run(&self, ctx: &mut Ctx<'_>) -> Result<Next> {
        ctx.terminal.title("NEW PRODUCT")?;
        let Some(name) = ask(
            ctx,
            &format!("Please enter product name (1-{PRODUCT_NAME_MAX} characters)."),
            false,
            &|value: &str| validate_product_name(value.trim()).is_ok(),
        )?
        else {
            return Ok(None);
        };
        confirm(
            vec![format!("Name: {name}")],
            FormPayload::Product(ProductFormInput { name }),
        )
    }
}

struct NewContactForm;

impl Screen for NewContactForm {
    fn run(&self, ctx: &mut Ctx<'_>) -> Result<Next> {
        ctx.terminal.title("NEW CONTACT")?;
        let Some(name) = ask(
            ctx,
            &format!("Please enter contact name (1-{CONTACT_NAME_MAX} characters)."),
            false,
            &|value: &str| validate_contact_name(value.trim()).is_ok(),
        )?
        else {
            return Ok(None);
        };
        let Some(email) = ask(
            ctx,
            &format!("Please enter contact email address ({EMAIL_MIN}-{EMAIL_MAX} characters)."),
            false,
            &|value: &str| validate_email(value.trim()).is_ok(),
        )?
        else {
            return Ok(None);
        };
        let Some(phone) = ask(
            ctx,
            "Please enter contact phone number (10 digits, or 11 starting with 1).",
            false,
            &|value: &str| validate_phone(value.trim()).is_ok(),
        )?
        else {
            return Ok(None);
        };
        let Some(department) = ask(
            ctx,
            &format!(
                "Please enter contact department (0-{DEPARTMENT_MAX} characters). <Enter> to leave blank."
            ),
            true,
            &|value: &str| validate_department(value.trim()).is_ok(),
        )?
        else {
            return Ok(None);
        };

        confirm(
            vec![
                format!("Name: {name}"),
                format!("Email: {email}"),
                format!("Phone: {phone}"),
                format!("Department: {department}"),
            ],
            FormPayload::Contact(ContactFormInput {
                name,
                email,
                phone,
                department,
            }),
        )
    }
}

struct NewReleaseForm;

impl Screen for NewReleaseForm {
    fn run(&self, ctx: &mut Ctx<'_>) -> Result<Next> {
        ctx.terminal.title("NEW RELEASE")?;
        let Some(product) = pick_product(ctx)? else {
            return Ok(None);
        };
        let Some(name) = ask(
            ctx,
            &format!("Please enter release name (1-{RELEASE_NAME_MAX} characters)."),
            false,
            &|value: &str| validate_release_name(value.trim()).is_ok(),
        )?
        else {
            return Ok(None);
        };
        let Some(date) = ask(
            ctx,
            "Please enter release date (YYYY-MM-DD).",
            false,
            &|value: &str| parse_date(value).is_ok(),
        )?
        else {
            return Ok(None);
        };
        let release_date = parse_date(&date)?;

        confirm(
            vec![
                format!("Product: {}", product.name),
                format!("Release: {name}"),
                format!("Release date: {date}"),
            ],
            FormPayload::Release(ReleaseFormInput {
                product_id: product.id,
                name,
                release_date,
            }),
        )
    }
}

struct NewIssueForm;

impl Screen for NewIssueForm {
    fn run(&self, ctx: &mut Ctx<'_>) -> Result<Next> {
        ctx.terminal.title("NEW ISSUE")?;
        let Some(product) = pick_product(ctx)? else {
            return Ok(None);
        };
        let Some(description) = ask(
            ctx,
            &format!("Please enter issue description (1-{DESCRIPTION_MAX} characters)."),
            false,
            &|value: &str| validate_description(value.trim()).is_ok(),
        )?
        else {
            return Ok(None);
        };

        let releases = ctx.runtime.list_releases_for_product(product.id)?;
        let anticipated = if releases.is_empty() {
            None
        } else {
            let mut names = releases
                .iter()
                .map(|release| release.name.clone())
                .collect::<Vec<_>>();
            let message = format!(
                "Please enter anticipated release ({}). <Enter> to leave blank.",
                names.join(", ")
            );
            names.push(String::new());
            let Some(answer) = choose(ctx, &message, &names)? else {
                return Ok(None);
            };
            releases.into_iter().find(|release| release.name == answer)
        };

        let priorities = Priority::all()
            .map(|priority| priority.to_string())
            .collect::<Vec<_>>();
        let Some(priority) = choose(ctx, "Please enter priority (1-5).", &priorities)? else {
            return Ok(None);
        };
        let priority = parse_priority(&priority)?;

        confirm(
            vec![
                format!("Product: {}", product.name),
                format!("Description: {description}"),
                format!(
                    "AntRel: {}",
                    anticipated
                        .as_ref()
                        .map(|release| release.name.as_str())
                        .unwrap_or_default()
                ),
                format!("Priority: {priority}"),
            ],
            FormPayload::Issue(IssueFormInput {
                description,
                product_id: product.id,
                anticipated_release_id: anticipated.map(|release| release.id),
                priority,
            }),
        )
    }
}

struct NewRequestForm;

impl Screen for NewRequestForm {
    fn run(&self, ctx: &mut Ctx<'_>) -> Result<Next> {
        ctx.terminal.title("NEW REQUEST")?;
        let Some(issue) = pick_issue(ctx)? else {
            return Ok(None);
        };
        let product = Product {
            id: issue.product_id,
            name: issue.product.clone(),
        };
        let Some(release) = pick_release(ctx, &product)? else {
            return Ok(None);
        };
        let Some(contact) = pick_contact(ctx)? else {
            return Ok(None);
        };

        confirm(
            vec![
                format!("Issue: #{} {}", issue.id, issue.description),
                format!("Affected release: {} {}", product.name, release.name),
                format!("Contact: {} <{}>", contact.name, contact.email),
            ],
            FormPayload::Request(RequestFormInput {
                issue_id: issue.id,
                affected_release_id: release.id,
                contact_id: contact.id,
            }),
        )
    }
}
