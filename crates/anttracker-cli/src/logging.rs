// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Route `tracing` output to `file`. The terminal belongs to the menus, so
/// nothing is ever logged to stdout or stderr.
pub fn init(level: &str, file: &Path) -> Result<()> {
    let filter = mk_filter(level)?;
    let writer = open_log_file(file)?;
    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_timer(UtcTime::rfc_3339())
        .with_writer(Mutex::new(writer));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|error| anyhow!("initialize logging: {error}"))
}

fn mk_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level).with_context(|| {
        format!(
            "invalid log level {level:?}; use error, warn, info, debug, trace or a target=level directive"
        )
    })
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| {
            format!(
                "open log file {} -- set [log].file to a writable path",
                path.display()
            )
        })
}

#[cfg(test)]
mod tests {
    use super::{mk_filter, open_log_file};
    use anyhow::Result;
    use std::io::Write;

    #[test]
    fn plain_levels_and_directives_are_accepted() -> Result<()> {
        mk_filter("warn")?;
        mk_filter("anttracker_db=debug,info")?;
        Ok(())
    }

    #[test]
    fn malformed_level_is_rejected_with_hint() {
        let error = mk_filter("anttracker_db=loud").expect_err("bad level should fail");
        assert!(error.to_string().contains("invalid log level"));
    }

    #[test]
    fn log_file_is_created_with_parents_and_appended() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("nested").join("anttracker.log");
        writeln!(open_log_file(&path)?, "first")?;
        writeln!(open_log_file(&path)?, "second")?;
        assert_eq!(std::fs::read_to_string(&path)?, "first\nsecond\n");
        Ok(())
    }
}
