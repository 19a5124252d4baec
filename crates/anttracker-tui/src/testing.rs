// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anttracker_app::{
    Condition, Contact, ContactId, FormPayload, Issue, IssueChange, IssueId, Priority, Product,
    ProductId, Release, ReleaseId, Request, RequestId, Status,
};
use anyhow::{Result, anyhow, bail};
use std::collections::VecDeque;
use time::macros::date;
use time::{Duration, OffsetDateTime};

use crate::TrackerRuntime;
use crate::terminal::Terminal;

/// Terminal fed from a fixed list of answers, capturing everything printed.
pub(crate) struct ScriptedTerminal {
    inputs: VecDeque<String>,
    output: String,
}

impl ScriptedTerminal {
    pub(crate) fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            output: String::new(),
        }
    }

    pub(crate) fn output(&self) -> &str {
        &self.output
    }
}

impl Terminal for ScriptedTerminal {
    fn print(&mut self, text: &str) -> Result<()> {
        self.output.push_str(text);
        Ok(())
    }

    fn print_line(&mut self, text: &str) -> Result<()> {
        self.output.push_str(text);
        self.output.push('\n');
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        Ok(self.inputs.pop_front())
    }
}

/// In-memory tracker. Filtering goes through `Condition::matches`.
#[derive(Default)]
pub(crate) struct TestRuntime {
    pub(crate) products: Vec<Product>,
    pub(crate) releases: Vec<Release>,
    pub(crate) contacts: Vec<Contact>,
    pub(crate) issues: Vec<Issue>,
    pub(crate) requests: Vec<Request>,
    pub(crate) submitted: Vec<FormPayload>,
    pub(crate) last_condition: Option<Condition>,
    pub(crate) fail_updates: bool,
    /// Removed from `issues` right after the next listing that includes it.
    pub(crate) delete_after_listing: Option<IssueId>,
    /// Removed from `issues` when the next update reaches storage.
    pub(crate) delete_before_update: Option<IssueId>,
}

impl TestRuntime {
    /// Products `P1` (releases `1.0`, `2.0`) and `P2` (release `9.0`) plus
    /// one contact.
    pub(crate) fn seeded() -> Self {
        let mut runtime = Self::default();
        for (index, name) in ["P1", "P2"].into_iter().enumerate() {
            runtime.products.push(Product {
                id: ProductId::new(index as i64 + 1),
                name: name.to_owned(),
            });
        }
        for (index, (product, name)) in [(1, "1.0"), (1, "2.0"), (2, "9.0")]
            .into_iter()
            .enumerate()
        {
            runtime.releases.push(Release {
                id: ReleaseId::new(index as i64 + 1),
                product_id: ProductId::new(product),
                name: name.to_owned(),
                release_date: date!(2026 - 01 - 15),
            });
        }
        runtime.contacts.push(Contact {
            id: ContactId::new(1),
            name: "Avery Walker".to_owned(),
            email: "avery@ant.io".to_owned(),
            phone: "5551234567".to_owned(),
            department: "Support".to_owned(),
        });
        runtime
    }

    /// Add an issue against the product at `product_index`, created
    /// `issues.len()` days ago.
    pub(crate) fn add_issue(
        &mut self,
        description: &str,
        product_index: usize,
        status: Status,
        priority: u8,
    ) -> IssueId {
        let product = &self.products[product_index];
        let id = IssueId::new(self.issues.len() as i64 + 1);
        let age = Duration::days(self.issues.len() as i64);
        self.issues.push(Issue {
            id,
            description: description.to_owned(),
            product_id: product.id,
            product: product.name.clone(),
            anticipated_release_id: None,
            anticipated_release: None,
            status,
            priority: Priority::new(priority).expect("priority in range"),
            created_at: OffsetDateTime::now_utc() - age,
        });
        id
    }

    pub(crate) fn add_request(&mut self, issue_id: IssueId) {
        let release = &self.releases[0];
        let contact = &self.contacts[0];
        self.requests.push(Request {
            id: RequestId::new(self.requests.len() as i64 + 1),
            issue_id,
            affected_release_id: release.id,
            affected_release: release.name.clone(),
            contact_id: contact.id,
            contact_name: contact.name.clone(),
            contact_email: contact.email.clone(),
            contact_department: contact.department.clone(),
            requested_at: OffsetDateTime::now_utc(),
        });
    }

    pub(crate) fn issue(&self, issue_id: IssueId) -> &Issue {
        self.issues
            .iter()
            .find(|issue| issue.id == issue_id)
            .expect("issue exists")
    }
}

fn page<T>(items: impl Iterator<Item = T>, offset: usize, limit: usize) -> Vec<T> {
    items.skip(offset).take(limit).collect()
}

impl TrackerRuntime for TestRuntime {
    fn count_issues(&mut self, condition: &Condition) -> Result<usize> {
        self.last_condition = Some(condition.clone());
        Ok(self.issues.iter().filter(|issue| condition.matches(issue)).count())
    }

    fn fetch_issues(
        &mut self,
        condition: &Condition,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Issue>> {
        self.last_condition = Some(condition.clone());
        let rows = page(
            self.issues
                .iter()
                .filter(|issue| condition.matches(issue))
                .cloned(),
            offset,
            limit,
        );
        if let Some(id) = self.delete_after_listing
            && rows.iter().any(|issue| issue.id == id)
        {
            self.delete_after_listing = None;
            self.issues.retain(|issue| issue.id != id);
        }
        Ok(rows)
    }

    fn get_issue(&mut self, issue_id: IssueId) -> Result<Issue> {
        self.issues
            .iter()
            .find(|issue| issue.id == issue_id)
            .cloned()
            .ok_or_else(|| anyhow!("issue {issue_id} not found -- it may have been deleted"))
    }

    fn update_issue(&mut self, issue_id: IssueId, change: &IssueChange) -> Result<Issue> {
        if self.fail_updates {
            bail!("database is locked");
        }
        if let Some(id) = self.delete_before_update.take() {
            self.issues.retain(|issue| issue.id != id);
        }
        let issue = self
            .issues
            .iter_mut()
            .find(|issue| issue.id == issue_id)
            .ok_or_else(|| anyhow!("issue {issue_id} not found -- it may have been deleted"))?;
        change.apply(issue)?;
        Ok(issue.clone())
    }

    fn count_products(&mut self) -> Result<usize> {
        Ok(self.products.len())
    }

    fn fetch_products(&mut self, offset: usize, limit: usize) -> Result<Vec<Product>> {
        Ok(page(self.products.iter().cloned(), offset, limit))
    }

    fn list_product_names(&mut self) -> Result<Vec<String>> {
        Ok(self.products.iter().map(|product| product.name.clone()).collect())
    }

    fn list_releases_for_product(&mut self, product_id: ProductId) -> Result<Vec<Release>> {
        Ok(self
            .releases
            .iter()
            .filter(|release| release.product_id == product_id)
            .cloned()
            .collect())
    }

    fn list_release_names(&mut self) -> Result<Vec<String>> {
        let mut names = self
            .releases
            .iter()
            .map(|release| release.name.clone())
            .collect::<Vec<_>>();
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn count_releases(&mut self, product_id: ProductId) -> Result<usize> {
        Ok(self.list_releases_for_product(product_id)?.len())
    }

    fn fetch_releases(
        &mut self,
        product_id: ProductId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Release>> {
        Ok(page(
            self.list_releases_for_product(product_id)?.into_iter(),
            offset,
            limit,
        ))
    }

    fn count_contacts(&mut self) -> Result<usize> {
        Ok(self.contacts.len())
    }

    fn fetch_contacts(&mut self, offset: usize, limit: usize) -> Result<Vec<Contact>> {
        Ok(page(self.contacts.iter().cloned(), offset, limit))
    }

    fn count_requests(&mut self, issue_id: IssueId) -> Result<usize> {
        Ok(self
            .requests
            .iter()
            .filter(|request| request.issue_id == issue_id)
            .count())
    }

    fn fetch_requests(
        &mut self,
        issue_id: IssueId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Request>> {
        Ok(page(
            self.requests
                .iter()
                .filter(|request| request.issue_id == issue_id)
                .cloned(),
            offset,
            limit,
        ))
    }

    fn submit_form(&mut self, payload: &FormPayload) -> Result<()> {
        payload.validate()?;
        self.submitted.push(payload.clone());
        Ok(())
    }
}
