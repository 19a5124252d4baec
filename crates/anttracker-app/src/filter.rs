// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt;
use time::{Duration, OffsetDateTime};

use crate::{Issue, Priority, Status};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueFilter {
    DescriptionContains(String),
    PriorityEquals(Priority),
    ProductEquals(String),
    AnticipatedReleaseEquals(String),
    StatusIn(Vec<Status>),
    CreatedWithinDays(u32),
}

impl IssueFilter {
    pub fn label(&self) -> String {
        match self {
            Self::DescriptionContains(text) => format!("Description: {text}"),
            Self::PriorityEquals(priority) => format!("Priority: {priority}"),
            Self::ProductEquals(product) => format!("Product: {product}"),
            Self::AnticipatedReleaseEquals(release) => format!("Release: {release}"),
            Self::StatusIn(statuses) => {
                let labels = statuses
                    .iter()
                    .map(|status| status.label())
                    .collect::<Vec<_>>();
                format!("Status: {}", labels.join(", "))
            }
            Self::CreatedWithinDays(days) => {
                format!("Date created: within the last {days} days")
            }
        }
    }

    fn condition_at(&self, now: OffsetDateTime) -> Condition {
        match self {
            Self::DescriptionContains(text) => Condition::DescriptionContains(text.clone()),
            Self::PriorityEquals(priority) => Condition::PriorityEquals(*priority),
            Self::ProductEquals(product) => Condition::ProductEquals(product.clone()),
            Self::AnticipatedReleaseEquals(release) => {
                Condition::ReleaseEquals(release.clone())
            }
            Self::StatusIn(statuses) => Condition::Any(
                statuses
                    .iter()
                    .copied()
                    .map(Condition::StatusEquals)
                    .collect(),
            ),
            // A window reaching past the earliest representable date covers
            // every issue.
            Self::CreatedWithinDays(days) => now
                .checked_sub(Duration::days(i64::from(*days)))
                .map_or(Condition::Always, Condition::CreatedOnOrAfter),
        }
    }
}

impl fmt::Display for IssueFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Ordered, conjunctive collection of issue filters. Adding never replaces an
/// existing filter of the same kind; both must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    filters: Vec<IssueFilter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn add(&self, filter: IssueFilter) -> Self {
        let mut filters = self.filters.clone();
        filters.push(filter);
        Self { filters }
    }

    #[must_use]
    pub fn clear(&self) -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn labels(&self) -> Vec<String> {
        self.filters.iter().map(IssueFilter::label).collect()
    }

    pub fn compile(&self) -> Condition {
        self.compile_at(OffsetDateTime::now_utc())
    }

    /// Compile against a fixed clock so day-window filters are reproducible.
    pub fn compile_at(&self, now: OffsetDateTime) -> Condition {
        match self.filters.as_slice() {
            [] => Condition::Always,
            [only] => only.condition_at(now),
            filters => Condition::All(
                filters
                    .iter()
                    .map(|filter| filter.condition_at(now))
                    .collect(),
            ),
        }
    }
}

/// Storage-neutral predicate tree over issues. Storage compiles it into its
/// own query language; [`Condition::matches`] is the reference semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Always,
    All(Vec<Condition>),
    Any(Vec<Condition>),
    DescriptionContains(String),
    PriorityEquals(Priority),
    ProductEquals(String),
    ReleaseEquals(String),
    StatusEquals(Status),
    CreatedOnOrAfter(OffsetDateTime),
}

impl Condition {
    pub fn matches(&self, issue: &Issue) -> bool {
        match self {
            Self::Always => true,
            Self::All(conditions) => conditions.iter().all(|condition| condition.matches(issue)),
            Self::Any(conditions) => conditions.iter().any(|condition| condition.matches(issue)),
            Self::DescriptionContains(text) => issue
                .description
                .to_ascii_lowercase()
                .contains(&text.to_ascii_lowercase()),
            Self::PriorityEquals(priority) => issue.priority == *priority,
            Self::ProductEquals(product) => issue.product == *product,
            Self::ReleaseEquals(release) => {
                issue.anticipated_release.as_deref() == Some(release.as_str())
            }
            Self::StatusEquals(status) => issue.status == *status,
            Self::CreatedOnOrAfter(threshold) => issue.created_at >= *threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Condition, FilterSet, IssueFilter};
    use crate::{Issue, IssueId, Priority, ProductId, ReleaseId, Status};
    use time::{Duration, OffsetDateTime, macros::datetime};

    const NOW: OffsetDateTime = datetime!(2026-03-10 12:00 UTC);

    fn issue(product: &str, priority: u8, status: Status, age_days: i64) -> Issue {
        Issue {
            id: IssueId::new(1),
            description: "Login page hangs".to_owned(),
            product_id: ProductId::new(1),
            product: product.to_owned(),
            anticipated_release_id: Some(ReleaseId::new(3)),
            anticipated_release: Some("1.2".to_owned()),
            status,
            priority: Priority::new(priority).expect("valid priority"),
            created_at: NOW - Duration::days(age_days),
        }
    }

    fn sample_issues() -> Vec<Issue> {
        let mut issues = Vec::new();
        for product in ["P1", "P2"] {
            for priority in 1..=5 {
                for status in Status::ALL {
                    issues.push(issue(product, priority, status, i64::from(priority) * 3));
                }
            }
        }
        issues
    }

    fn p(priority: u8) -> Priority {
        Priority::new(priority).expect("valid priority")
    }

    #[test]
    fn empty_set_matches_everything() {
        let condition = FilterSet::new().compile_at(NOW);
        assert_eq!(condition, Condition::Always);
        assert!(sample_issues().iter().all(|issue| condition.matches(issue)));
    }

    #[test]
    fn add_returns_new_set_and_keeps_original() {
        let base = FilterSet::new().add(IssueFilter::ProductEquals("P1".to_owned()));
        let narrowed = base.add(IssueFilter::PriorityEquals(p(3)));
        assert_eq!(base.len(), 1);
        assert_eq!(narrowed.len(), 2);
    }

    #[test]
    fn adding_is_conjunction_with_existing_set() {
        let base = FilterSet::new().add(IssueFilter::StatusIn(vec![
            Status::Created,
            Status::Done,
        ]));
        let extra = IssueFilter::CreatedWithinDays(7);
        let combined = base.add(extra.clone()).compile_at(NOW);
        let base_condition = base.compile_at(NOW);
        let extra_condition = FilterSet::new().add(extra).compile_at(NOW);
        for issue in sample_issues() {
            assert_eq!(
                combined.matches(&issue),
                base_condition.matches(&issue) && extra_condition.matches(&issue)
            );
        }
    }

    #[test]
    fn product_and_priority_must_both_hold_in_any_order() {
        let product = IssueFilter::ProductEquals("P1".to_owned());
        let priority = IssueFilter::PriorityEquals(p(3));
        let forward = FilterSet::new()
            .add(product.clone())
            .add(priority.clone())
            .compile_at(NOW);
        let backward = FilterSet::new().add(priority).add(product).compile_at(NOW);
        let issues = sample_issues();
        let matched = issues
            .iter()
            .filter(|issue| forward.matches(issue))
            .collect::<Vec<_>>();
        assert_eq!(matched.len(), Status::ALL.len());
        assert!(
            matched
                .iter()
                .all(|issue| issue.product == "P1" && issue.priority.get() == 3)
        );
        for issue in &issues {
            assert_eq!(forward.matches(issue), backward.matches(issue));
        }
    }

    #[test]
    fn same_kind_filters_accumulate() {
        let set = FilterSet::new()
            .add(IssueFilter::PriorityEquals(p(2)))
            .add(IssueFilter::PriorityEquals(p(4)));
        let condition = set.compile_at(NOW);
        assert_eq!(set.len(), 2);
        assert!(!sample_issues().iter().any(|issue| condition.matches(issue)));
    }

    #[test]
    fn status_in_set_is_disjunctive() {
        let condition = FilterSet::new()
            .add(IssueFilter::StatusIn(vec![Status::Done, Status::Cancelled]))
            .compile_at(NOW);
        assert!(condition.matches(&issue("P1", 1, Status::Done, 0)));
        assert!(condition.matches(&issue("P1", 1, Status::Cancelled, 0)));
        assert!(!condition.matches(&issue("P1", 1, Status::Assessed, 0)));
    }

    #[test]
    fn created_within_days_is_inclusive_threshold() {
        let condition = FilterSet::new()
            .add(IssueFilter::CreatedWithinDays(6))
            .compile_at(NOW);
        assert!(condition.matches(&issue("P1", 1, Status::Created, 6)));
        assert!(!condition.matches(&issue("P1", 1, Status::Created, 7)));
    }

    #[test]
    fn day_window_past_the_calendar_matches_everything() {
        let condition = FilterSet::new()
            .add(IssueFilter::CreatedWithinDays(u32::MAX))
            .compile_at(NOW);
        assert_eq!(condition, Condition::Always);
        assert!(condition.matches(&issue("P1", 1, Status::Created, 40_000)));

        let narrowed = FilterSet::new()
            .add(IssueFilter::ProductEquals("P2".to_owned()))
            .add(IssueFilter::CreatedWithinDays(5_000_000))
            .compile_at(NOW);
        assert!(narrowed.matches(&issue("P2", 1, Status::Created, 40_000)));
        assert!(!narrowed.matches(&issue("P1", 1, Status::Created, 0)));
    }

    #[test]
    fn description_match_is_substring_ignoring_ascii_case() {
        let condition = FilterSet::new()
            .add(IssueFilter::DescriptionContains("page".to_owned()))
            .compile_at(NOW);
        assert!(condition.matches(&issue("P1", 1, Status::Created, 0)));
        let miss = FilterSet::new()
            .add(IssueFilter::DescriptionContains("LOGOUT".to_owned()))
            .compile_at(NOW);
        assert!(!miss.matches(&issue("P1", 1, Status::Created, 0)));
    }

    #[test]
    fn release_filter_never_matches_unassigned_issue() {
        let condition = FilterSet::new()
            .add(IssueFilter::AnticipatedReleaseEquals("1.2".to_owned()))
            .compile_at(NOW);
        let mut unassigned = issue("P1", 1, Status::Created, 0);
        assert!(condition.matches(&unassigned));
        unassigned.anticipated_release = None;
        unassigned.anticipated_release_id = None;
        assert!(!condition.matches(&unassigned));
    }

    #[test]
    fn clear_empties_set() {
        let set = FilterSet::new()
            .add(IssueFilter::PriorityEquals(p(1)))
            .add(IssueFilter::ProductEquals("P2".to_owned()));
        assert!(set.clear().is_empty());
        assert_eq!(set.clear().compile_at(NOW), Condition::Always);
    }

    #[test]
    fn labels_follow_insertion_order() {
        let set = FilterSet::new()
            .add(IssueFilter::StatusIn(vec![Status::Created, Status::InProgress]))
            .add(IssueFilter::CreatedWithinDays(30));
        assert_eq!(
            set.labels(),
            vec![
                "Status: Created, InProgress".to_owned(),
                "Date created: within the last 30 days".to_owned(),
            ]
        );
    }
}
