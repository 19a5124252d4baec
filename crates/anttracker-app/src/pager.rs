// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

pub const PAGE_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no more pages (page {page} of {pages})")]
pub struct BoundaryError {
    pub page: usize,
    pub pages: usize,
}

/// Cursor over a counted result set. `offset` is always a multiple of
/// `limit` and only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    offset: usize,
    limit: usize,
    total: usize,
}

impl Pager {
    pub const fn new(total: usize) -> Self {
        Self::with_limit(total, PAGE_LIMIT)
    }

    pub const fn with_limit(total: usize, limit: usize) -> Self {
        let limit = if limit == 0 { 1 } else { limit };
        Self {
            offset: 0,
            limit,
            total,
        }
    }

    pub const fn offset(&self) -> usize {
        self.offset
    }

    pub const fn limit(&self) -> usize {
        self.limit
    }

    pub const fn total(&self) -> usize {
        self.total
    }

    pub const fn page_index(&self) -> usize {
        self.offset / self.limit
    }

    pub const fn page_count(&self) -> usize {
        self.total.div_ceil(self.limit)
    }

    pub const fn is_last_page(&self) -> bool {
        self.page_index() + 1 >= self.page_count()
    }

    /// Records past the current page.
    pub const fn remaining(&self) -> usize {
        self.total
            .saturating_sub(self.limit * (self.page_index() + 1))
    }

    /// Rows expected on the current page.
    pub fn page_len(&self) -> usize {
        self.total.saturating_sub(self.offset).min(self.limit)
    }

    pub fn advance(&mut self) -> Result<(), BoundaryError> {
        if self.is_last_page() {
            return Err(BoundaryError {
                page: self.page_index() + 1,
                pages: self.page_count().max(1),
            });
        }
        self.offset += self.limit;
        Ok(())
    }

    /// The following page as a new cursor, leaving `self` untouched.
    pub fn next(&self) -> Result<Self, BoundaryError> {
        let mut next = *self;
        next.advance()?;
        Ok(next)
    }

    /// Rebase on a fresh count. Used when the filter changes, so the cursor
    /// starts over at the first page.
    pub const fn reset(&self, total: usize) -> Self {
        Self::with_limit(total, self.limit)
    }

    /// Keep the current page if it still exists under a recounted total,
    /// otherwise fall back to the last one.
    pub fn refresh(&self, total: usize) -> Self {
        let mut refreshed = self.reset(total);
        let last = refreshed.page_count().saturating_sub(1);
        refreshed.offset = self.page_index().min(last) * self.limit;
        refreshed
    }
}
