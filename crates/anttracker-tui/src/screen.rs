// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anttracker_app::Pager;
use anyhow::Result;
use std::rc::Rc;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{debug, error};

use crate::TrackerRuntime;
use crate::table::{Column, TableCell, render_table};
use crate::terminal::{ABORT, Terminal};

const SEPARATOR: &str = "/\\";
const BACK_HINT: &str = " Or press ` (backtick) to go back to the main menu:";

/// Everything a screen may touch while it runs.
pub struct Ctx<'a> {
    pub terminal: &'a mut dyn Terminal,
    pub runtime: &'a mut dyn TrackerRuntime,
}

pub type Next = Option<Rc<dyn Screen>>;

/// A unit of terminal interaction. The returned screen runs next; `None`
/// ends the session.
pub trait Screen {
    fn run(&self, ctx: &mut Ctx<'_>) -> Result<Next>;
}

/// Deferred construction of the screen behind a menu option.
pub type Factory = Rc<dyn Fn(&mut Ctx<'_>) -> Result<Next>>;

pub fn action(make: impl Fn(&mut Ctx<'_>) -> Result<Next> + 'static) -> Factory {
    Rc::new(make)
}

pub fn goto(make: impl Fn() -> Rc<dyn Screen> + 'static) -> Factory {
    Rc::new(move |_: &mut Ctx<'_>| Ok(Some(make())))
}

/// Drive screens until one returns `None`. A failing screen is reported and
/// control falls back to the screen that led to it; with none, the session
/// ends.
pub fn run_session(root: Rc<dyn Screen>, ctx: &mut Ctx<'_>) -> Result<()> {
    debug!("session start");
    let mut previous: Option<Rc<dyn Screen>> = None;
    let mut current = root;
    loop {
        ctx.terminal.blank_line()?;
        ctx.terminal.print_line(&SEPARATOR.repeat(40))?;
        ctx.terminal.blank_line()?;

        match current.run(ctx) {
            Ok(Some(next)) => {
                previous = Some(current);
                current = next;
            }
            Ok(None) => break,
            Err(err) => {
                error!(error = %format!("{err:#}"), "screen failed");
                ctx.terminal.print_line(&format!("error: {err:#}"))?;
                match previous.take() {
                    Some(screen) => current = screen,
                    None => break,
                }
            }
        }
    }
    debug!("session end");
    Ok(())
}

struct MenuOption {
    label: String,
    action: Factory,
}

/// Numbered menu: title, free-form content lines, then options picked by
/// 1-based index or abandoned with the abort token.
pub struct MenuScreen {
    title: Option<String>,
    content: Vec<String>,
    options: Vec<MenuOption>,
    prompt: String,
    abort_hint: String,
    on_abort: Option<Factory>,
}

#[derive(Default)]
pub struct MenuBuilder {
    title: Option<String>,
    content: Vec<String>,
    options: Vec<MenuOption>,
    prompt: Option<String>,
    abort_hint: Option<String>,
    on_abort: Option<Factory>,
}

impl MenuBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.content.push(line.into());
        self
    }

    pub fn option(mut self, label: impl Into<String>, action: Factory) -> Self {
        self.options.push(MenuOption {
            label: label.into(),
            action,
        });
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn abort_hint(mut self, hint: impl Into<String>) -> Self {
        self.abort_hint = Some(hint.into());
        self
    }

    pub fn on_abort(mut self, action: Factory) -> Self {
        self.on_abort = Some(action);
        self
    }

    pub fn build(self) -> MenuScreen {
        MenuScreen {
            title: self.title,
            content: self.content,
            options: self.options,
            prompt: self.prompt.unwrap_or_else(|| "Please select an option.".to_owned()),
            abort_hint: self.abort_hint.unwrap_or_else(|| BACK_HINT.to_owned()),
            on_abort: self.on_abort,
        }
    }

    pub fn screen(self) -> Rc<dyn Screen> {
        Rc::new(self.build())
    }
}

impl Screen for MenuScreen {
    fn run(&self, ctx: &mut Ctx<'_>) -> Result<Next> {
        if let Some(title) = &self.title {
            ctx.terminal.title(title)?;
        }
        for line in &self.content {
            ctx.terminal.print_line(line)?;
        }
        for (index, option) in self.options.iter().enumerate() {
            ctx.terminal
                .print_line(&format!("{:>2}. {}", index + 1, option.label))?;
        }

        let mut choices = (1..=self.options.len())
            .map(|index| index.to_string())
            .collect::<Vec<_>>();
        choices.push(ABORT.to_owned());
        let answer = ctx
            .terminal
            .prompt_choice(&format!("{}{}", self.prompt, self.abort_hint), &choices)?;

        if answer == ABORT {
            return match &self.on_abort {
                Some(action) => action(ctx),
                None => Ok(None),
            };
        }
        let Some(option) = answer
            .parse::<usize>()
            .ok()
            .and_then(|index| index.checked_sub(1))
            .and_then(|index| self.options.get(index))
        else {
            return Ok(None);
        };
        (option.action)(ctx)
    }
}

type CountFn = Rc<dyn Fn(&mut dyn TrackerRuntime) -> Result<usize>>;
type FetchFn<T> = Rc<dyn Fn(&mut dyn TrackerRuntime, &Pager) -> Result<Vec<T>>>;
type RowAction<T> = Rc<dyn Fn(&mut Ctx<'_>, Rc<Vec<T>>, Pager) -> Result<Next>>;

struct RowOption<T> {
    label: String,
    action: RowAction<T>,
}

/// One page of a counted result set rendered as a numbered table, with
/// "Next page" and "Print" appended whenever the page has rows.
pub struct TableScreen<T> {
    title: String,
    columns: Vec<Column>,
    pager: Pager,
    count: CountFn,
    fetch: FetchFn<T>,
    to_row: fn(&T) -> Vec<TableCell>,
    empty_message: String,
    reopen: Rc<dyn Fn(Pager) -> Rc<dyn Screen>>,
    options: Vec<MenuOption>,
    row_options: Vec<RowOption<T>>,
    lines: Vec<String>,
    prompt: Option<String>,
    on_abort: Option<Factory>,
}

pub struct TableBuilder<T> {
    screen: TableScreen<T>,
}

impl<T: 'static> TableScreen<T> {
    /// `reopen` rebuilds this table at another page; it backs "Next page",
    /// "Print" and every way back to the table.
    pub fn builder(
        title: impl Into<String>,
        pager: Pager,
        to_row: fn(&T) -> Vec<TableCell>,
        reopen: impl Fn(Pager) -> Rc<dyn Screen> + 'static,
    ) -> TableBuilder<T> {
        TableBuilder {
            screen: TableScreen {
                title: title.into(),
                columns: Vec::new(),
                pager,
                count: Rc::new(|_: &mut dyn TrackerRuntime| -> Result<usize> { Ok(0) }),
                fetch: Rc::new(|_: &mut dyn TrackerRuntime, _: &Pager| -> Result<Vec<T>> {
                    Ok(Vec::new())
                }),
                to_row,
                empty_message: "No records found.".to_owned(),
                reopen: Rc::new(reopen),
                options: Vec::new(),
                row_options: Vec::new(),
                lines: Vec::new(),
                prompt: None,
                on_abort: None,
            },
        }
    }
}

impl<T: 'static> TableBuilder<T> {
    pub fn columns(mut self, columns: &[Column]) -> Self {
        self.screen.columns = columns.to_vec();
        self
    }

    pub fn query(
        mut self,
        count: impl Fn(&mut dyn TrackerRuntime) -> Result<usize> + 'static,
        fetch: impl Fn(&mut dyn TrackerRuntime, &Pager) -> Result<Vec<T>> + 'static,
    ) -> Self {
        self.screen.count = Rc::new(count);
        self.screen.fetch = Rc::new(fetch);
        self
    }

    pub fn empty_message(mut self, message: impl Into<String>) -> Self {
        self.screen.empty_message = message.into();
        self
    }

    pub fn option(mut self, label: impl Into<String>, action: Factory) -> Self {
        self.screen.options.push(MenuOption {
            label: label.into(),
            action,
        });
        self
    }

    /// Option that needs the rows on screen; hidden when the page is empty.
    pub fn row_option(
        mut self,
        label: impl Into<String>,
        action: impl Fn(&mut Ctx<'_>, Rc<Vec<T>>, Pager) -> Result<Next> + 'static,
    ) -> Self {
        self.screen.row_options.push(RowOption {
            label: label.into(),
            action: Rc::new(action),
        });
        self
    }

    /// Line shown under the title, on screen and in printed reports.
    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.screen.lines.push(line.into());
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.screen.prompt = Some(prompt.into());
        self
    }

    pub fn on_abort(mut self, action: Factory) -> Self {
        self.screen.on_abort = Some(action);
        self
    }

    pub fn screen(self) -> Rc<dyn Screen> {
        Rc::new(self.screen)
    }
}

impl<T: 'static> Screen for TableScreen<T> {
    fn run(&self, ctx: &mut Ctx<'_>) -> Result<Next> {
        let total = (self.count)(&mut *ctx.runtime)?;
        let pager = self.pager.refresh(total);
        let rows = if total == 0 {
            Vec::new()
        } else {
            (self.fetch)(&mut *ctx.runtime, &pager)?
        };
        debug!(
            title = %self.title,
            total,
            offset = pager.offset(),
            rows = rows.len(),
            "table page"
        );
        let cells = rows.iter().map(self.to_row).collect::<Vec<_>>();

        ctx.terminal.title(&self.title)?;
        for line in &self.lines {
            ctx.terminal.print_line(line)?;
        }
        if rows.is_empty() {
            ctx.terminal.print_line(&self.empty_message)?;
        } else {
            ctx.terminal.display_table(&self.columns, &cells)?;
            if !pager.is_last_page() {
                ctx.terminal
                    .print_line(&format!("{} more.", pager.remaining()))?;
            }
        }

        let mut menu = MenuBuilder::new();
        if let Some(prompt) = &self.prompt {
            menu = menu.prompt(prompt.clone());
        }
        if let Some(on_abort) = &self.on_abort {
            menu = menu.on_abort(Rc::clone(on_abort));
        }
        for option in &self.options {
            menu = menu.option(option.label.clone(), Rc::clone(&option.action));
        }

        if !rows.is_empty() {
            let rows = Rc::new(rows);
            for row_option in &self.row_options {
                let handler = Rc::clone(&row_option.action);
                let rows = Rc::clone(&rows);
                menu = menu.option(
                    row_option.label.clone(),
                    action(move |ctx| handler(ctx, Rc::clone(&rows), pager)),
                );
            }

            let reopen = Rc::clone(&self.reopen);
            menu = menu.option(
                "Next page",
                action(move |ctx| match pager.next() {
                    Ok(next) => Ok(Some(reopen(next))),
                    Err(boundary) => {
                        ctx.terminal.print_line(&boundary.to_string())?;
                        Ok(Some(reopen(pager)))
                    }
                }),
            );

            let reopen = Rc::clone(&self.reopen);
            let report = Report {
                title: self.title.clone(),
                lines: self.lines.clone(),
                columns: self.columns.clone(),
                cells,
            };
            menu = menu.option(
                "Print",
                action(move |ctx| {
                    report.print(ctx.terminal, OffsetDateTime::now_utc())?;
                    Ok(Some(reopen(pager)))
                }),
            );
        }

        menu.build().run(ctx)
    }
}

struct Report {
    title: String,
    lines: Vec<String>,
    columns: Vec<Column>,
    cells: Vec<Vec<TableCell>>,
}

impl Report {
    fn print(&self, terminal: &mut dyn Terminal, generated: OffsetDateTime) -> Result<()> {
        let stamp = generated
            .format(&format_description!(
                "[year]/[month]/[day] [hour]:[minute]:[second] UTC"
            ))
            .unwrap_or_default();
        terminal.title(&format!("Report: {}", self.title))?;
        terminal.print_line(&format!("Generated {stamp}"))?;
        for line in &self.lines {
            terminal.print_line(line)?;
        }
        for line in render_table(&self.columns, &self.cells, false) {
            terminal.print_line(&line)?;
        }
        terminal.blank_line()
    }
}

/// Prompt for a row number on the current page, then hand the chosen record
/// to `on_select`. Abort returns to `back`.
pub struct SelectRowScreen<T> {
    message: String,
    rows: Rc<Vec<T>>,
    on_select: Rc<dyn Fn(&T) -> Rc<dyn Screen>>,
    back: Rc<dyn Screen>,
}

impl<T: 'static> SelectRowScreen<T> {
    pub fn screen(
        message: impl Into<String>,
        rows: Rc<Vec<T>>,
        on_select: impl Fn(&T) -> Rc<dyn Screen> + 'static,
        back: Rc<dyn Screen>,
    ) -> Rc<dyn Screen> {
        Rc::new(Self {
            message: message.into(),
            rows,
            on_select: Rc::new(on_select),
            back,
        })
    }
}

impl<T> Screen for SelectRowScreen<T> {
    fn run(&self, ctx: &mut Ctx<'_>) -> Result<Next> {
        let choices = (1..=self.rows.len())
            .map(|row| row.to_string())
            .collect::<Vec<_>>();
        let mut accepted = choices.clone();
        accepted.push(ABORT.to_owned());
        let answer = ctx
            .terminal
            .prompt_choice(&format!("{} ` to abort:", self.message), &accepted)?;
        let selected = answer
            .parse::<usize>()
            .ok()
            .and_then(|row| row.checked_sub(1))
            .and_then(|index| self.rows.get(index));
        match selected {
            Some(row) => Ok(Some((self.on_select)(row))),
            None => Ok(Some(Rc::clone(&self.back))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Ctx, MenuBuilder, Next, Screen, TableScreen, action, goto, run_session};
    use crate::table::{Column, TableCell};
    use crate::testing::{ScriptedTerminal, TestRuntime};
    use anttracker_app::Pager;
    use anyhow::{Result, bail};
    use std::cell::Cell;
    use std::rc::Rc;

    fn leaf(label: &'static str) -> Rc<dyn Screen> {
        MenuBuilder::new().title(label).screen()
    }

    fn number_row(value: &i64) -> Vec<TableCell> {
        vec![TableCell::Integer(*value)]
    }

    fn numbers(total: usize, pager: Pager) -> Rc<dyn Screen> {
        TableScreen::<i64>::builder("Numbers", pager, number_row, move |next| numbers(total, next))
        .columns(&[Column::new("N", 4)])
        .query(
            move |_| Ok(total),
            move |_, pager| {
                Ok((pager.offset()..pager.offset() + pager.page_len())
                    .map(|value| value as i64)
                    .collect())
            },
        )
        .empty_message("Nothing here.")
        .screen()
    }

    fn run(screen: Rc<dyn Screen>, inputs: &[&str]) -> Result<(ScriptedTerminal, TestRuntime)> {
        let mut terminal = ScriptedTerminal::new(inputs.iter().copied());
        let mut runtime = TestRuntime::default();
        {
            let mut ctx = Ctx {
                terminal: &mut terminal,
                runtime: &mut runtime,
            };
            run_session(screen, &mut ctx)?;
        }
        Ok((terminal, runtime))
    }

    #[test]
    fn menu_dispatches_by_index_and_reprompts() -> Result<()> {
        let menu = MenuBuilder::new()
            .title("Root")
            .line("Pick something")
            .option("First", goto(|| leaf("First leaf")))
            .option("Second", goto(|| leaf("Second leaf")))
            .screen();
        let (terminal, _) = run(menu, &["0", "3", "2", "`"])?;
        let output = terminal.output();
        assert!(output.contains(" 1. First\n 2. Second\n"));
        assert!(output.contains("== Second leaf =="));
        assert!(!output.contains("First leaf"));
        assert_eq!(output.matches("Please select an option.").count(), 4);
        Ok(())
    }

    #[test]
    fn abort_ends_session_unless_redirected() -> Result<()> {
        let menu = MenuBuilder::new()
            .option("Only", goto(|| leaf("Only leaf")))
            .on_abort(goto(|| leaf("Abort target")))
            .screen();
        let (terminal, _) = run(menu, &["`", "`"])?;
        assert!(terminal.output().contains("== Abort target =="));
        Ok(())
    }

    #[test]
    fn failing_screen_falls_back_to_initiator() -> Result<()> {
        let attempts = Rc::new(Cell::new(0));
        let counter = Rc::clone(&attempts);
        let home = MenuBuilder::new()
            .title("Home")
            .option(
                "Explode",
                action(move |_: &mut Ctx<'_>| -> Result<Next> {
                    counter.set(counter.get() + 1);
                    bail!("storage went away")
                }),
            )
            .screen();
        let start = MenuBuilder::new()
            .title("Start")
            .option("Go", goto(move || Rc::clone(&home)))
            .screen();
        let (terminal, _) = run(start, &["1", "1", "`"])?;
        let output = terminal.output();
        assert_eq!(attempts.get(), 1);
        assert!(output.contains("error: storage went away"));
        assert_eq!(output.matches("== Start ==").count(), 2);
        Ok(())
    }

    #[test]
    fn failing_root_ends_session() -> Result<()> {
        let menu = MenuBuilder::new()
            .option(
                "Explode",
                action(|_: &mut Ctx<'_>| -> Result<Next> { bail!("boom") }),
            )
            .screen();
        let (terminal, _) = run(menu, &["1"])?;
        assert!(terminal.output().contains("error: boom"));
        Ok(())
    }

    #[test]
    fn table_pages_through_results() -> Result<()> {
        let (terminal, _) = run(numbers(45, Pager::new(45)), &["1", "1", "1", "`"])?;
        let output = terminal.output();
        assert!(output.contains("25 more."));
        assert!(output.contains("5 more."));
        assert!(output.contains("1 |0   |"));
        assert!(output.contains("20|19  |"));
        assert!(output.contains("1 |20  |"));
        assert!(output.contains("5 |44  |"));
        assert!(output.contains("no more pages (page 3 of 3)"));
        assert_eq!(output.matches("5 |44  |").count(), 2);
        Ok(())
    }

    #[test]
    fn empty_table_hides_row_dependent_options() -> Result<()> {
        let (terminal, _) = run(numbers(0, Pager::new(0)), &["`"])?;
        let output = terminal.output();
        assert!(output.contains("Nothing here."));
        assert!(!output.contains("Next page"));
        assert!(!output.contains("Print"));
        assert!(!output.contains(" 1. "));
        Ok(())
    }

    #[test]
    fn print_renders_report_and_stays_on_page() -> Result<()> {
        let (terminal, _) = run(numbers(3, Pager::new(3)), &["2", "`"])?;
        let output = terminal.output();
        assert!(output.contains("== Report: Numbers =="));
        assert!(output.contains("Generated "));
        assert!(output.contains("\n|N   |\n|0   |\n|1   |\n|2   |\n"));
        assert_eq!(output.matches("== Numbers ==").count(), 2);
        Ok(())
    }
}
