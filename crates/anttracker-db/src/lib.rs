// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use anttracker_app::{
    Condition, Contact, ContactFormInput, ContactId, Issue, IssueChange, IssueFormInput, IssueId,
    Priority, Product, ProductFormInput, ProductId, Release, ReleaseFormInput, ReleaseId, Request,
    RequestFormInput, RequestId, Status,
};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};
use tracing::{debug, info};

pub const APP_NAME: &str = "anttracker";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    ("products", &["id", "name", "created_at"]),
    (
        "releases",
        &["id", "product_id", "name", "release_date", "created_at"],
    ),
    (
        "contacts",
        &["id", "name", "email", "phone", "department", "created_at"],
    ),
    (
        "issues",
        &[
            "id",
            "description",
            "product_id",
            "anticipated_release_id",
            "status",
            "priority",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "requests",
        &[
            "id",
            "issue_id",
            "affected_release_id",
            "contact_id",
            "requested_at",
        ],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_products_name",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_products_name ON products (name);",
    },
    RequiredIndex {
        name: "idx_releases_product_name",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_releases_product_name ON releases (product_id, name);",
    },
    RequiredIndex {
        name: "idx_contacts_email",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_contacts_email ON contacts (email);",
    },
    RequiredIndex {
        name: "idx_issues_product_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_issues_product_id ON issues (product_id);",
    },
    RequiredIndex {
        name: "idx_issues_anticipated_release_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_issues_anticipated_release_id ON issues (anticipated_release_id);",
    },
    RequiredIndex {
        name: "idx_issues_status",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_issues_status ON issues (status);",
    },
    RequiredIndex {
        name: "idx_issues_created_at",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_issues_created_at ON issues (created_at);",
    },
    RequiredIndex {
        name: "idx_requests_issue_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_requests_issue_id ON requests (issue_id);",
    },
];

const ISSUE_SELECT: &str = "
    SELECT
      i.id, i.description, i.product_id, p.name,
      i.anticipated_release_id, r.name,
      i.status, i.priority, i.created_at
    FROM issues i
    JOIN products p ON p.id = i.product_id
    LEFT JOIN releases r ON r.id = i.anticipated_release_id
";

const REQUEST_SELECT: &str = "
    SELECT
      q.id, q.issue_id, q.affected_release_id, r.name,
      q.contact_id, c.name, c.email, c.department, q.requested_at
    FROM requests q
    JOIN releases r ON r.id = q.affected_release_id
    JOIN contacts c ON c.id = q.contact_id
";

const DEMO_PRODUCTS: usize = 6;
const DEMO_RELEASES_PER_PRODUCT: usize = 6;
const DEMO_ISSUES_PER_RELEASE: usize = 21;

const DEMO_CONTACTS: &[(&str, &str, &str, &str)] = &[
    ("Ada Lovelace", "ada@anthill.io", "5550100001", "Engineering"),
    ("Grace Hopper", "grace@anthill.io", "15550100002", "Support"),
    ("Alan Turing", "alan@anthill.io", "5550100003", "Research"),
    ("Edsger Dijkstra", "edsger@anthill.io", "5550100004", ""),
];

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        info!(path = %path.display(), "opened database");
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        debug!("opened in-memory database");
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
            info!("created schema");
        }

        ensure_required_indexes(&self.conn)?;
        Ok(())
    }

    pub fn create_product(&self, product: &ProductFormInput) -> Result<ProductId> {
        product.validate()?;
        self.conn
            .execute(
                "INSERT INTO products (name, created_at) VALUES (?, ?)",
                params![product.name.trim(), now_timestamp()?],
            )
            .with_context(|| format!("insert product {:?}", product.name))?;
        let id = ProductId::new(self.conn.last_insert_rowid());
        info!(%id, name = %product.name, "created product");
        Ok(id)
    }

    pub fn get_product(&self, product_id: ProductId) -> Result<Product> {
        self.conn
            .query_row(
                "SELECT id, name FROM products WHERE id = ?",
                params![product_id.get()],
                product_from_row,
            )
            .optional()
            .with_context(|| format!("load product {product_id}"))?
            .ok_or_else(|| {
                anyhow!("product {product_id} not found -- choose an existing product and retry")
            })
    }

    pub fn count_products(&self) -> Result<usize> {
        count(&self.conn, "SELECT COUNT(*) FROM products", [])
    }

    pub fn list_products_page(&self, offset: usize, limit: usize) -> Result<Vec<Product>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM products ORDER BY id ASC LIMIT ? OFFSET ?")
            .context("prepare products page query")?;
        let rows = stmt
            .query_map(params![to_i64(limit)?, to_i64(offset)?], product_from_row)
            .context("query products page")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect products page")
    }

    pub fn list_product_names(&self) -> Result<Vec<String>> {
        list_names(&self.conn, "SELECT name FROM products ORDER BY name ASC", "product names")
    }

    pub fn create_release(&self, release: &ReleaseFormInput) -> Result<ReleaseId> {
        release.validate()?;
        self.get_product(release.product_id)?;
        self.conn
            .execute(
                "
                INSERT INTO releases (product_id, name, release_date, created_at)
                VALUES (?, ?, ?, ?)
                ",
                params![
                    release.product_id.get(),
                    release.name.trim(),
                    format_date(release.release_date)?,
                    now_timestamp()?,
                ],
            )
            .with_context(|| format!("insert release {:?}", release.name))?;
        let id = ReleaseId::new(self.conn.last_insert_rowid());
        info!(%id, product = %release.product_id, name = %release.name, "created release");
        Ok(id)
    }

    pub fn get_release(&self, release_id: ReleaseId) -> Result<Release> {
        self.conn
            .query_row(
                "SELECT id, product_id, name, release_date FROM releases WHERE id = ?",
                params![release_id.get()],
                release_from_row,
            )
            .optional()
            .with_context(|| format!("load release {release_id}"))?
            .ok_or_else(|| {
                anyhow!("release {release_id} not found -- choose an existing release and retry")
            })
    }

    pub fn list_releases_for_product(&self, product_id: ProductId) -> Result<Vec<Release>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, product_id, name, release_date
                FROM releases
                WHERE product_id = ?
                ORDER BY release_date ASC, id ASC
                ",
            )
            .context("prepare releases query")?;
        let rows = stmt
            .query_map(params![product_id.get()], release_from_row)
            .context("query releases")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect releases")
    }

    /// Distinct release names across every product.
    pub fn list_release_names(&self) -> Result<Vec<String>> {
        list_names(
            &self.conn,
            "SELECT DISTINCT name FROM releases ORDER BY name ASC",
            "release names",
        )
    }

    pub fn count_releases(&self, product_id: ProductId) -> Result<usize> {
        count(
            &self.conn,
            "SELECT COUNT(*) FROM releases WHERE product_id = ?",
            params![product_id.get()],
        )
    }

    pub fn list_releases_page(
        &self,
        product_id: ProductId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Release>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, product_id, name, release_date
                FROM releases
                WHERE product_id = ?
                ORDER BY release_date ASC, id ASC
                LIMIT ? OFFSET ?
                ",
            )
            .context("prepare releases page query")?;
        let rows = stmt
            .query_map(
                params![product_id.get(), to_i64(limit)?, to_i64(offset)?],
                release_from_row,
            )
            .context("query releases page")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect releases page")
    }

    pub fn create_contact(&self, contact: &ContactFormInput) -> Result<ContactId> {
        contact.validate()?;
        self.conn
            .execute(
                "
                INSERT INTO contacts (name, email, phone, department, created_at)
                VALUES (?, ?, ?, ?, ?)
                ",
                params![
                    contact.name.trim(),
                    contact.email.trim(),
                    contact.phone,
                    contact.department.trim(),
                    now_timestamp()?,
                ],
            )
            .with_context(|| format!("insert contact {:?}", contact.email))?;
        let id = ContactId::new(self.conn.last_insert_rowid());
        info!(%id, "created contact");
        Ok(id)
    }

    pub fn count_contacts(&self) -> Result<usize> {
        count(&self.conn, "SELECT COUNT(*) FROM contacts", [])
    }

    pub fn list_contacts_page(&self, offset: usize, limit: usize) -> Result<Vec<Contact>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, name, email, phone, department
                FROM contacts
                ORDER BY name ASC, id ASC
                LIMIT ? OFFSET ?
                ",
            )
            .context("prepare contacts page query")?;
        let rows = stmt
            .query_map(params![to_i64(limit)?, to_i64(offset)?], |row| {
                Ok(Contact {
                    id: ContactId::new(row.get(0)?),
                    name: row.get(1)?,
                    email: row.get(2)?,
                    phone: row.get(3)?,
                    department: row.get(4)?,
                })
            })
            .context("query contacts page")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect contacts page")
    }

    pub fn create_issue(&self, issue: &IssueFormInput) -> Result<IssueId> {
        self.create_issue_at(issue, OffsetDateTime::now_utc())
    }

    /// Insert an issue with an explicit creation time. New issues always start
    /// out `Created`.
    pub fn create_issue_at(
        &self,
        issue: &IssueFormInput,
        created_at: OffsetDateTime,
    ) -> Result<IssueId> {
        issue.validate()?;
        self.get_product(issue.product_id)?;
        if let Some(release_id) = issue.anticipated_release_id {
            ensure_release_of_product(&self.conn, release_id, issue.product_id)?;
        }
        let created = format_timestamp(created_at)?;
        self.conn
            .execute(
                "
                INSERT INTO issues (
                  description, product_id, anticipated_release_id,
                  status, priority, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    issue.description.trim(),
                    issue.product_id.get(),
                    issue.anticipated_release_id.map(ReleaseId::get),
                    Status::Created.as_str(),
                    issue.priority.get(),
                    created,
                    created,
                ],
            )
            .context("insert issue")?;
        let id = IssueId::new(self.conn.last_insert_rowid());
        info!(%id, product = %issue.product_id, "created issue");
        Ok(id)
    }

    pub fn find_issue(&self, issue_id: IssueId) -> Result<Option<Issue>> {
        find_issue(&self.conn, issue_id)
    }

    pub fn get_issue(&self, issue_id: IssueId) -> Result<Issue> {
        self.find_issue(issue_id)?.ok_or_else(|| issue_not_found(issue_id))
    }

    pub fn count_issues(&self, condition: &Condition) -> Result<usize> {
        let (clause, values) = compile_condition(condition)?;
        let sql = format!(
            "
            SELECT COUNT(*)
            FROM issues i
            JOIN products p ON p.id = i.product_id
            LEFT JOIN releases r ON r.id = i.anticipated_release_id
            WHERE {clause}
            "
        );
        let total = count(&self.conn, &sql, params_from_iter(values.iter()))?;
        debug!(total, %clause, "counted issues");
        Ok(total)
    }

    pub fn fetch_issue_page(
        &self,
        condition: &Condition,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Issue>> {
        let (clause, mut values) = compile_condition(condition)?;
        values.push(Value::Integer(to_i64(limit)?));
        values.push(Value::Integer(to_i64(offset)?));
        let sql = format!("{ISSUE_SELECT} WHERE {clause} ORDER BY i.id ASC LIMIT ? OFFSET ?");
        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("prepare issues page query")?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), issue_from_row)
            .context("query issues page")?;
        let issues = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("collect issues page")?;
        debug!(offset, limit, rows = issues.len(), "fetched issue page");
        Ok(issues)
    }

    /// Apply one change to an issue as a single unit of work and return the
    /// stored result. Nothing is written when the change is rejected.
    pub fn update_issue(&self, issue_id: IssueId, change: &IssueChange) -> Result<Issue> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin issue update")?;
        let mut issue = find_issue(&tx, issue_id)?.ok_or_else(|| issue_not_found(issue_id))?;
        if let IssueChange::AnticipatedRelease { id, .. } = change {
            ensure_release_of_product(&tx, *id, issue.product_id)?;
        }
        change.apply(&mut issue)?;

        let rows_affected = tx
            .execute(
                "
                UPDATE issues
                SET
                  description = ?,
                  anticipated_release_id = ?,
                  status = ?,
                  priority = ?,
                  updated_at = ?
                WHERE id = ?
                ",
                params![
                    issue.description,
                    issue.anticipated_release_id.map(ReleaseId::get),
                    issue.status.as_str(),
                    issue.priority.get(),
                    now_timestamp()?,
                    issue_id.get(),
                ],
            )
            .with_context(|| format!("update issue {issue_id}"))?;
        if rows_affected == 0 {
            return Err(issue_not_found(issue_id));
        }

        let updated = find_issue(&tx, issue_id)?.ok_or_else(|| issue_not_found(issue_id))?;
        tx.commit().context("commit issue update")?;
        info!(%issue_id, field = change.field(), "updated issue");
        Ok(updated)
    }

    pub fn create_request(&self, request: &RequestFormInput) -> Result<RequestId> {
        self.create_request_at(request, OffsetDateTime::now_utc())
    }

    pub fn create_request_at(
        &self,
        request: &RequestFormInput,
        requested_at: OffsetDateTime,
    ) -> Result<RequestId> {
        request.validate()?;
        let issue = self.get_issue(request.issue_id)?;
        ensure_release_of_product(&self.conn, request.affected_release_id, issue.product_id)?;
        self.conn
            .execute(
                "
                INSERT INTO requests (issue_id, affected_release_id, contact_id, requested_at)
                VALUES (?, ?, ?, ?)
                ",
                params![
                    request.issue_id.get(),
                    request.affected_release_id.get(),
                    request.contact_id.get(),
                    format_timestamp(requested_at)?,
                ],
            )
            .with_context(|| format!("insert request for issue {}", request.issue_id))?;
        let id = RequestId::new(self.conn.last_insert_rowid());
        info!(%id, issue = %request.issue_id, "created request");
        Ok(id)
    }

    pub fn count_requests(&self, issue_id: IssueId) -> Result<usize> {
        count(
            &self.conn,
            "SELECT COUNT(*) FROM requests WHERE issue_id = ?",
            params![issue_id.get()],
        )
    }

    pub fn list_requests_page(
        &self,
        issue_id: IssueId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Request>> {
        let sql = format!(
            "{REQUEST_SELECT} WHERE q.issue_id = ? ORDER BY q.requested_at ASC, q.id ASC LIMIT ? OFFSET ?"
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("prepare requests page query")?;
        let rows = stmt
            .query_map(
                params![issue_id.get(), to_i64(limit)?, to_i64(offset)?],
                request_from_row,
            )
            .context("query requests page")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect requests page")
    }

    /// Populate an empty database with sample products, releases, issues,
    /// contacts and requests. A database that already has products is left
    /// alone.
    pub fn seed_demo_data(&self) -> Result<()> {
        if self.count_products()? > 0 {
            debug!("database already has products; skipping demo seed");
            return Ok(());
        }

        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin demo seed")?;
        let now = OffsetDateTime::now_utc();
        let today = now.date();

        let mut contact_ids = Vec::with_capacity(DEMO_CONTACTS.len());
        for (name, email, phone, department) in DEMO_CONTACTS {
            contact_ids.push(self.create_contact(&ContactFormInput {
                name: (*name).to_owned(),
                email: (*email).to_owned(),
                phone: (*phone).to_owned(),
                department: (*department).to_owned(),
            })?);
        }

        for product_index in 0..DEMO_PRODUCTS {
            let product_id = self.create_product(&ProductFormInput {
                name: format!("Product {product_index}"),
            })?;
            for release_index in 0..DEMO_RELEASES_PER_PRODUCT {
                let release_id = self.create_release(&ReleaseFormInput {
                    product_id,
                    name: release_index.to_string(),
                    release_date: today + Duration::weeks(to_i64(release_index)? * 4),
                })?;
                for issue_index in 0..DEMO_ISSUES_PER_RELEASE {
                    let priority = Priority::new(u8::try_from(issue_index / 5 % 5 + 1)?)
                        .ok_or_else(|| anyhow!("demo priority out of range"))?;
                    let issue_id = self.create_issue_at(
                        &IssueFormInput {
                            description: format!("Issue {issue_index}"),
                            product_id,
                            anticipated_release_id: Some(release_id),
                            priority,
                        },
                        now - Duration::days(to_i64(issue_index)?),
                    )?;
                    let status = Status::ALL[issue_index % Status::ALL.len()];
                    tx.execute(
                        "UPDATE issues SET status = ? WHERE id = ?",
                        params![status.as_str(), issue_id.get()],
                    )
                    .context("set demo issue status")?;
                    if release_index == 0 && issue_index < contact_ids.len() {
                        self.create_request_at(
                            &RequestFormInput {
                                issue_id,
                                affected_release_id: release_id,
                                contact_id: contact_ids[issue_index],
                            },
                            now - Duration::hours(to_i64(issue_index)?),
                        )?;
                    }
                }
            }
        }

        tx.commit().context("commit demo seed")?;
        info!(
            products = DEMO_PRODUCTS,
            issues = DEMO_PRODUCTS * DEMO_RELEASES_PER_PRODUCT * DEMO_ISSUES_PER_RELEASE,
            "seeded demo data"
        );
        Ok(())
    }
}

/// Directory holding the database and log file.
pub fn data_dir() -> Result<PathBuf> {
    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set ANTTRACKER_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir)
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("ANTTRACKER_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }
    Ok(data_dir()?.join("anttracker.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

/// Translate a condition tree into a SQL boolean expression over the
/// `ISSUE_SELECT` aliases, with positional parameters.
fn compile_condition(condition: &Condition) -> Result<(String, Vec<Value>)> {
    let mut values = Vec::new();
    let clause = compile_into(condition, &mut values)?;
    Ok((clause, values))
}

fn compile_into(condition: &Condition, values: &mut Vec<Value>) -> Result<String> {
    let clause = match condition {
        Condition::Always => "1 = 1".to_owned(),
        Condition::All(parts) => join_clauses(parts, " AND ", "1 = 1", values)?,
        Condition::Any(parts) => join_clauses(parts, " OR ", "1 = 0", values)?,
        Condition::DescriptionContains(text) => {
            values.push(Value::Text(text.clone()));
            "instr(lower(i.description), lower(?)) > 0".to_owned()
        }
        Condition::PriorityEquals(priority) => {
            values.push(Value::Integer(i64::from(priority.get())));
            "i.priority = ?".to_owned()
        }
        Condition::ProductEquals(name) => {
            values.push(Value::Text(name.clone()));
            "p.name = ?".to_owned()
        }
        Condition::ReleaseEquals(name) => {
            values.push(Value::Text(name.clone()));
            "r.name = ?".to_owned()
        }
        Condition::StatusEquals(status) => {
            values.push(Value::Text(status.as_str().to_owned()));
            "i.status = ?".to_owned()
        }
        Condition::CreatedOnOrAfter(threshold) => {
            values.push(Value::Text(format_timestamp(*threshold)?));
            "i.created_at >= ?".to_owned()
        }
    };
    Ok(clause)
}

fn join_clauses(
    parts: &[Condition],
    separator: &str,
    empty: &str,
    values: &mut Vec<Value>,
) -> Result<String> {
    if parts.is_empty() {
        return Ok(empty.to_owned());
    }
    let clauses = parts
        .iter()
        .map(|part| compile_into(part, values))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("({})", clauses.join(separator)))
}

fn find_issue(conn: &Connection, issue_id: IssueId) -> Result<Option<Issue>> {
    conn.query_row(
        &format!("{ISSUE_SELECT} WHERE i.id = ?"),
        params![issue_id.get()],
        issue_from_row,
    )
    .optional()
    .with_context(|| format!("load issue {issue_id}"))
}

fn ensure_release_of_product(
    conn: &Connection,
    release_id: ReleaseId,
    product_id: ProductId,
) -> Result<()> {
    let owner: Option<i64> = conn
        .query_row(
            "SELECT product_id FROM releases WHERE id = ?",
            params![release_id.get()],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("load release {release_id}"))?;
    match owner {
        Some(owner) if owner == product_id.get() => Ok(()),
        Some(_) => bail!(
            "release {release_id} belongs to another product -- choose a release of product {product_id}"
        ),
        None => bail!("release {release_id} not found -- choose an existing release and retry"),
    }
}

fn issue_not_found(issue_id: IssueId) -> anyhow::Error {
    anyhow!("issue {issue_id} not found -- it may have been deleted")
}

fn count<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<usize> {
    let total: i64 = conn
        .query_row(sql, params, |row| row.get(0))
        .context("count rows")?;
    usize::try_from(total).context("row count out of range")
}

fn list_names(conn: &Connection, sql: &str, what: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(sql)
        .with_context(|| format!("prepare {what} query"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .with_context(|| format!("query {what}"))?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .with_context(|| format!("collect {what}"))
}

fn to_i64(value: usize) -> Result<i64> {
    i64::try_from(value).context("value out of range for sqlite integer")
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: ProductId::new(row.get(0)?),
        name: row.get(1)?,
    })
}

fn release_from_row(row: &Row<'_>) -> rusqlite::Result<Release> {
    let release_date_raw: String = row.get(3)?;
    Ok(Release {
        id: ReleaseId::new(row.get(0)?),
        product_id: ProductId::new(row.get(1)?),
        name: row.get(2)?,
        release_date: parse_date(&release_date_raw).map_err(to_sql_error)?,
    })
}

fn issue_from_row(row: &Row<'_>) -> rusqlite::Result<Issue> {
    let status_raw: String = row.get(6)?;
    let status = Status::parse(&status_raw)
        .ok_or_else(|| invalid_column(6, format!("unknown issue status {status_raw}")))?;
    let priority_raw: i64 = row.get(7)?;
    let priority = u8::try_from(priority_raw)
        .ok()
        .and_then(Priority::new)
        .ok_or_else(|| invalid_column(7, format!("issue priority {priority_raw} out of range")))?;
    let created_at_raw: String = row.get(8)?;

    Ok(Issue {
        id: IssueId::new(row.get(0)?),
        description: row.get(1)?,
        product_id: ProductId::new(row.get(2)?),
        product: row.get(3)?,
        anticipated_release_id: row.get::<_, Option<i64>>(4)?.map(ReleaseId::new),
        anticipated_release: row.get(5)?,
        status,
        priority,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
    })
}

fn request_from_row(row: &Row<'_>) -> rusqlite::Result<Request> {
    let requested_at_raw: String = row.get(8)?;
    Ok(Request {
        id: RequestId::new(row.get(0)?),
        issue_id: IssueId::new(row.get(1)?),
        affected_release_id: ReleaseId::new(row.get(2)?),
        affected_release: row.get(3)?,
        contact_id: ContactId::new(row.get(4)?),
        contact_name: row.get(5)?,
        contact_email: row.get(6)?,
        contact_department: row.get(7)?,
        requested_at: parse_datetime(&requested_at_raw).map_err(to_sql_error)?,
    })
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; use an anttracker database or point ANTTRACKER_DB_PATH at a new file"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; run migration before launching",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }

    let existing_indexes = index_names(conn)?;
    let missing = REQUIRED_INDEXES
        .iter()
        .filter(|index| !existing_indexes.contains(index.name))
        .map(|index| index.name)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!(
            "database is missing required indexes: {}; run migration before launching",
            missing.join(", ")
        );
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))
}

fn index_names(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT name
            FROM sqlite_master
            WHERE type = 'index'
              AND name NOT LIKE 'sqlite_%'
            ORDER BY name ASC
            ",
        )
        .context("prepare index names query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query index names")?;
    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("collect index names")
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

// Whole seconds in UTC so stored timestamps compare correctly as text.
fn format_timestamp(value: OffsetDateTime) -> Result<String> {
    value
        .to_offset(UtcOffset::UTC)
        .format(&format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second]Z"
        ))
        .context("format timestamp")
}

fn now_timestamp() -> Result<String> {
    format_timestamp(OffsetDateTime::now_utc())
}

fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(value);
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    bail!("unsupported datetime format {raw:?}")
}

fn parse_date(raw: &str) -> Result<Date> {
    if let Ok(value) = Date::parse(raw, &format_description!("[year]-[month]-[day]")) {
        return Ok(value);
    }
    Ok(parse_datetime(raw)?.date())
}

fn format_date(value: Date) -> Result<String> {
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .context("format date")
}

fn invalid_column(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    invalid_column(0, error.to_string())
}

#[cfg(test)]
mod tests {
    use super::{compile_condition, format_timestamp, parse_datetime};
    use anttracker_app::{Condition, Priority, Status};
    use rusqlite::types::Value;
    use time::macros::datetime;

    #[test]
    fn timestamps_are_whole_seconds_in_utc() -> anyhow::Result<()> {
        let formatted = format_timestamp(datetime!(2026-03-10 14:30:15.75 +02:00))?;
        assert_eq!(formatted, "2026-03-10T12:30:15Z");
        assert_eq!(
            parse_datetime(&formatted)?,
            datetime!(2026-03-10 12:30:15 UTC)
        );
        Ok(())
    }

    #[test]
    fn nested_condition_compiles_with_ordered_params() -> anyhow::Result<()> {
        let condition = Condition::All(vec![
            Condition::ProductEquals("P1".to_owned()),
            Condition::Any(vec![
                Condition::StatusEquals(Status::Done),
                Condition::StatusEquals(Status::Cancelled),
            ]),
            Condition::PriorityEquals(Priority::new(3).expect("valid priority")),
        ]);
        let (clause, values) = compile_condition(&condition)?;
        assert_eq!(
            clause,
            "(p.name = ? AND (i.status = ? OR i.status = ?) AND i.priority = ?)"
        );
        assert_eq!(
            values,
            vec![
                Value::Text("P1".to_owned()),
                Value::Text("DONE".to_owned()),
                Value::Text("CANCELLED".to_owned()),
                Value::Integer(3),
            ]
        );
        Ok(())
    }

    #[test]
    fn empty_disjunction_matches_nothing() -> anyhow::Result<()> {
        let (clause, values) = compile_condition(&Condition::Any(Vec::new()))?;
        assert_eq!(clause, "1 = 0");
        assert!(values.is_empty());
        Ok(())
    }
}
