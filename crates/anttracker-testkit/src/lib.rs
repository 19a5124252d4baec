// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use anttracker_app::{
    ContactFormInput, IssueFormInput, Priority, ProductFormInput, ProductId, ReleaseFormInput,
    ReleaseId,
};
use std::path::PathBuf;
use time::{Date, Duration, Month, OffsetDateTime, Time};

const PRODUCT_NOUNS: [&str; 12] = [
    "Anthill", "Colony", "Forager", "Tunnel", "Queen", "Larva", "Mandible", "Pheromone", "Worker",
    "Soldier", "Nest", "Trail",
];
const PRODUCT_SUFFIXES: [&str; 6] = ["Studio", "Cloud", "Mobile", "Desktop", "Server", "Kit"];

const ISSUE_VERBS: [&str; 10] = [
    "Crash on", "Slow", "Wrong total in", "Blank", "Typo in", "Freeze in", "Timeout on",
    "Missing icon in", "Bad layout in", "Leak in",
];
const ISSUE_AREAS: [&str; 10] = [
    "login", "export", "search", "settings", "report", "sync", "upload", "print", "dashboard",
    "signup",
];

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];
const DEPARTMENTS: [&str; 7] = [
    "Engineering",
    "Support",
    "Sales",
    "Marketing",
    "Finance",
    "Operations",
    "",
];
const EMAIL_DOMAINS: [&str; 4] = ["ant.io", "hill.net", "colony.org", "nest.dev"];

const REFERENCE_YEAR: i32 = 2026;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator for valid tracker form inputs. The same seed always
/// yields the same sequence.
#[derive(Debug, Clone)]
pub struct TrackerFaker {
    rng: DeterministicRng,
    serial: usize,
}

impl TrackerFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            serial: 0,
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    /// Product names carry a serial so repeated calls never collide on the
    /// unique name index.
    pub fn product(&mut self) -> ProductFormInput {
        let noun = self.pick(&PRODUCT_NOUNS);
        let suffix = self.pick(&PRODUCT_SUFFIXES);
        let serial = self.next_serial();
        ProductFormInput {
            name: format!("{noun} {suffix} {serial}"),
        }
    }

    pub fn release(&mut self, product_id: ProductId) -> ReleaseFormInput {
        let serial = self.next_serial();
        let major = self.int_n(4) + 1;
        ReleaseFormInput {
            product_id,
            name: format!("{major}.{serial}"),
            release_date: self.date_in_year(REFERENCE_YEAR),
        }
    }

    pub fn contact(&mut self) -> ContactFormInput {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        let domain = self.pick(&EMAIL_DOMAINS);
        let serial = self.next_serial();
        let lead = if self.int_n(2) == 0 { "" } else { "1" };
        ContactFormInput {
            name: format!("{first} {last}"),
            email: format!("{}{serial}@{domain}", first.to_ascii_lowercase()),
            phone: format!("{lead}555{:07}", self.int_n(10_000_000)),
            department: self.pick(&DEPARTMENTS).to_owned(),
        }
    }

    pub fn issue(
        &mut self,
        product_id: ProductId,
        anticipated_release_id: Option<ReleaseId>,
    ) -> IssueFormInput {
        let verb = self.pick(&ISSUE_VERBS);
        let area = self.pick(&ISSUE_AREAS);
        let priority = Priority::all()
            .nth(self.int_n(usize::from(Priority::MAX)))
            .expect("index is below the priority count");
        IssueFormInput {
            description: format!("{verb} {area}"),
            product_id,
            anticipated_release_id,
            priority,
        }
    }

    pub fn date_in_year(&mut self, year: i32) -> Date {
        let start = Date::from_calendar_date(year, Month::January, 1).expect("valid calendar date");
        start + Duration::days(self.int_n(365) as i64)
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn next_serial(&mut self) -> usize {
        self.serial += 1;
        self.serial
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("anttracker.db");
    Ok((dir, db_path))
}

/// Fixed clock for tests that filter on creation time.
pub fn reference_now() -> OffsetDateTime {
    let date = Date::from_calendar_date(REFERENCE_YEAR, Month::March, 10).expect("valid calendar date");
    let noon = Time::from_hms(12, 0, 0).expect("valid noon");
    date.with_time(noon).assume_utc()
}
