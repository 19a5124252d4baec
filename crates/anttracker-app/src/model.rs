// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::{Date, OffsetDateTime};

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Created,
    Assessed,
    InProgress,
    Done,
    Cancelled,
}

impl Status {
    pub const ALL: [Self; 5] = [
        Self::Created,
        Self::Assessed,
        Self::InProgress,
        Self::Done,
        Self::Cancelled,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Assessed => "ASSESSED",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CREATED" => Some(Self::Created),
            "ASSESSED" => Some(Self::Assessed),
            "IN_PROGRESS" => Some(Self::InProgress),
            "DONE" => Some(Self::Done),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Assessed => "Assessed",
            Self::InProgress => "InProgress",
            Self::Done => "Done",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn parse_label(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.label() == value.trim())
    }

    /// Statuses an issue may move to from `self`. Empty for terminal states.
    pub const fn next_statuses(self) -> &'static [Self] {
        match self {
            Self::Created => &[Self::Assessed],
            Self::Assessed => &[Self::InProgress, Self::Done, Self::Cancelled],
            Self::InProgress => &[Self::Done, Self::Cancelled],
            Self::Done | Self::Cancelled => &[],
        }
    }

    pub const fn is_terminal(self) -> bool {
        self.next_statuses().is_empty()
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        self.next_statuses().contains(&next)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Priority(u8);

impl Priority {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub const fn new(value: u8) -> Option<Self> {
        if value >= Self::MIN && value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub fn parse(value: &str) -> Option<Self> {
        value.trim().parse::<u8>().ok().and_then(Self::new)
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (Self::MIN..=Self::MAX).map(Self)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub id: ReleaseId,
    pub product_id: ProductId,
    pub name: String,
    pub release_date: Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
}

/// An issue as loaded from storage, with the product and anticipated release
/// names joined in so filters and tables never need a second lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub description: String,
    pub product_id: ProductId,
    pub product: String,
    pub anticipated_release_id: Option<ReleaseId>,
    pub anticipated_release: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub issue_id: IssueId,
    pub affected_release_id: ReleaseId,
    pub affected_release: String,
    pub contact_id: ContactId,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_department: String,
    pub requested_at: OffsetDateTime,
}

/// A single-field mutation of an issue, applied by storage inside one unit of
/// work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueChange {
    Description(String),
    Priority(Priority),
    Status(Status),
    AnticipatedRelease { id: ReleaseId, name: String },
}

impl IssueChange {
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Description(_) => "description",
            Self::Priority(_) => "priority",
            Self::Status(_) => "status",
            Self::AnticipatedRelease { .. } => "anticipated release",
        }
    }

    pub fn apply(&self, issue: &mut Issue) -> Result<()> {
        match self {
            Self::Description(description) => {
                crate::forms::validate_description(description)?;
                issue.description = description.clone();
            }
            Self::Priority(priority) => issue.priority = *priority,
            Self::Status(next) => {
                if !issue.status.can_transition_to(*next) {
                    bail!(
                        "issue {} cannot move from {} to {}",
                        issue.id,
                        issue.status,
                        next
                    );
                }
                issue.status = *next;
            }
            Self::AnticipatedRelease { id, name } => {
                issue.anticipated_release_id = Some(*id);
                issue.anticipated_release = Some(name.clone());
            }
        }
        Ok(())
    }
}
