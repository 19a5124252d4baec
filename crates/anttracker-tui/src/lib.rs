// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod browse;
pub mod editor;
pub mod forms;
pub mod issues;
pub mod screen;
pub mod table;
pub mod terminal;

#[cfg(test)]
pub(crate) mod testing;

use anttracker_app::{
    Condition, Contact, FilterSet, FormPayload, Issue, IssueChange, IssueId, Product, ProductId,
    Release, Request,
};
use anyhow::Result;
use std::rc::Rc;
use tracing::info;

use crate::screen::{Ctx, Factory, MenuBuilder, Screen, action, run_session};

pub use crate::terminal::{ABORT, StdTerminal, Terminal};

/// Storage seam for the browser. Every call is one unit of work; screens
/// never hold a record across two calls.
pub trait TrackerRuntime {
    fn count_issues(&mut self, condition: &Condition) -> Result<usize>;
    fn fetch_issues(
        &mut self,
        condition: &Condition,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Issue>>;
    fn get_issue(&mut self, issue_id: IssueId) -> Result<Issue>;
    fn update_issue(&mut self, issue_id: IssueId, change: &IssueChange) -> Result<Issue>;

    fn count_products(&mut self) -> Result<usize>;
    fn fetch_products(&mut self, offset: usize, limit: usize) -> Result<Vec<Product>>;
    fn list_product_names(&mut self) -> Result<Vec<String>>;

    fn list_releases_for_product(&mut self, product_id: ProductId) -> Result<Vec<Release>>;
    fn list_release_names(&mut self) -> Result<Vec<String>>;
    fn count_releases(&mut self, product_id: ProductId) -> Result<usize>;
    fn fetch_releases(
        &mut self,
        product_id: ProductId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Release>>;

    fn count_contacts(&mut self) -> Result<usize>;
    fn fetch_contacts(&mut self, offset: usize, limit: usize) -> Result<Vec<Contact>>;

    fn count_requests(&mut self, issue_id: IssueId) -> Result<usize>;
    fn fetch_requests(
        &mut self,
        issue_id: IssueId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Request>>;

    fn submit_form(&mut self, payload: &FormPayload) -> Result<()>;
}

/// Each entry runs its own session; leaving it lands back here.
fn area(root: fn() -> Rc<dyn Screen>) -> Factory {
    action(move |ctx| {
        run_session(root(), ctx)?;
        Ok(Some(main_menu()))
    })
}

fn all_issues() -> Rc<dyn Screen> {
    issues::issues_menu(FilterSet::new())
}

pub fn main_menu() -> Rc<dyn Screen> {
    MenuBuilder::new()
        .title("Main menu")
        .prompt("Please select a command.")
        .abort_hint(" ` to exit program:")
        .option("Issues", area(all_issues))
        .option("Products", area(browse::all_products))
        .option("Contacts", area(browse::all_contacts))
        .option("New issue", area(forms::new_issue))
        .option("New request", area(forms::new_request))
        .option("New release", area(forms::new_release))
        .option("New product", area(forms::new_product))
        .option("New contact", area(forms::new_contact))
        .screen()
}

pub fn run_app(terminal: &mut dyn Terminal, runtime: &mut dyn TrackerRuntime) -> Result<()> {
    info!("anttracker session started");
    let mut ctx = Ctx { terminal, runtime };
    run_session(main_menu(), &mut ctx)?;
    ctx.terminal.print_line("Goodbye.")?;
    info!("anttracker session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::run_app;
    use crate::testing::{ScriptedTerminal, TestRuntime};
    use anttracker_app::Status;

    #[test]
    fn abort_at_main_menu_exits() -> anyhow::Result<()> {
        let mut terminal = ScriptedTerminal::new(["`"]);
        let mut runtime = TestRuntime::default();
        run_app(&mut terminal, &mut runtime)?;
        let output = terminal.output();
        assert!(output.contains("== Main menu =="));
        assert!(output.contains(" 8. New contact"));
        assert!(output.contains("Please select a command. ` to exit program:"));
        assert!(output.ends_with("Goodbye.\n"));
        Ok(())
    }

    #[test]
    fn closed_input_exits() -> anyhow::Result<()> {
        let mut terminal = ScriptedTerminal::new(Vec::<&str>::new());
        let mut runtime = TestRuntime::default();
        run_app(&mut terminal, &mut runtime)?;
        assert!(terminal.output().ends_with("Goodbye.\n"));
        Ok(())
    }

    #[test]
    fn abort_in_area_returns_to_main_menu() -> anyhow::Result<()> {
        let mut runtime = TestRuntime::seeded();
        runtime.add_issue("Crash on login", 0, Status::Created, 2);
        let mut terminal = ScriptedTerminal::new(["1", "7", "`", "`"]);
        run_app(&mut terminal, &mut runtime)?;
        let output = terminal.output();
        assert!(output.contains("== Search Results =="));
        assert!(output.contains("Crash on login"));
        assert_eq!(output.matches("== Main menu ==").count(), 2);
        Ok(())
    }
}
