// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anttracker_app::{
    Condition, Contact, FormPayload, Issue, IssueChange, IssueId, Product, ProductId, Release,
    Request,
};
use anttracker_db::Store;
use anyhow::Result;
use tracing::debug;

/// Binds the screens to a SQLite store.
pub struct DbRuntime<'a> {
    store: &'a Store,
}

impl<'a> DbRuntime<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

impl anttracker_tui::TrackerRuntime for DbRuntime<'_> {
    fn count_issues(&mut self, condition: &Condition) -> Result<usize> {
        self.store.count_issues(condition)
    }

    fn fetch_issues(
        &mut self,
        condition: &Condition,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Issue>> {
        self.store.fetch_issue_page(condition, offset, limit)
    }

    fn get_issue(&mut self, issue_id: IssueId) -> Result<Issue> {
        self.store.get_issue(issue_id)
    }

    fn update_issue(&mut self, issue_id: IssueId, change: &IssueChange) -> Result<Issue> {
        self.store.update_issue(issue_id, change)
    }

    fn count_products(&mut self) -> Result<usize> {
        self.store.count_products()
    }

    fn fetch_products(&mut self, offset: usize, limit: usize) -> Result<Vec<Product>> {
        self.store.list_products_page(offset, limit)
    }

    fn list_product_names(&mut self) -> Result<Vec<String>> {
        self.store.list_product_names()
    }

    fn list_releases_for_product(&mut self, product_id: ProductId) -> Result<Vec<Release>> {
        self.store.list_releases_for_product(product_id)
    }

    fn list_release_names(&mut self) -> Result<Vec<String>> {
        self.store.list_release_names()
    }

    fn count_releases(&mut self, product_id: ProductId) -> Result<usize> {
        self.store.count_releases(product_id)
    }

    fn fetch_releases(
        &mut self,
        product_id: ProductId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Release>> {
        self.store.list_releases_page(product_id, offset, limit)
    }

    fn count_contacts(&mut self) -> Result<usize> {
        self.store.count_contacts()
    }

    fn fetch_contacts(&mut self, offset: usize, limit: usize) -> Result<Vec<Contact>> {
        self.store.list_contacts_page(offset, limit)
    }

    fn count_requests(&mut self, issue_id: IssueId) -> Result<usize> {
        self.store.count_requests(issue_id)
    }

    fn fetch_requests(
        &mut self,
        issue_id: IssueId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Request>> {
        self.store.list_requests_page(issue_id, offset, limit)
    }

    fn submit_form(&mut self, payload: &FormPayload) -> Result<()> {
        payload.validate()?;

        match payload {
            FormPayload::Issue(form) => {
                self.store.create_issue(form)?;
            }
            FormPayload::Request(form) => {
                self.store.create_request(form)?;
            }
            FormPayload::Release(form) => {
                self.store.create_release(form)?;
            }
            FormPayload::Product(form) => {
                self.store.create_product(form)?;
            }
            FormPayload::Contact(form) => {
                self.store.create_contact(form)?;
            }
        }
        debug!(kind = payload.kind().label(), "form submitted");
        Ok(())
    }
}
