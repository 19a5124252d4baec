// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anttracker_db::Store;
use anttracker_tui::StdTerminal;
use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use runtime::DbRuntime;
use std::env;
use std::path::PathBuf;
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `anttracker --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    logging::init(&config.log_level(), &config.log_file()?)?;

    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or ANTTRACKER_DB_PATH",
            db_path.display()
        )
    })?;
    store.bootstrap()?;
    if options.demo {
        store.seed_demo_data()?;
    }
    if options.check_only {
        info!(db = %db_path.display(), "startup check passed");
        return Ok(());
    }

    let mut terminal = StdTerminal::new();
    let mut runtime = DbRuntime::new(&store);
    anttracker_tui::run_app(&mut terminal, &mut runtime)
}

const FLAGS: [(&str, &str); 7] = [
    ("--config <path>", "Use a specific config file"),
    ("--print-config-path", "Print the resolved config path and exit"),
    ("--print-path", "Print the resolved database path and exit"),
    ("--print-example-config", "Print a v1 config template and exit"),
    ("--demo", "Browse seeded sample data in an in-memory database"),
    ("--check", "Validate config, logging and database, then exit"),
    ("--help", "Show this help"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_db_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

impl CliOptions {
    fn new(config_path: PathBuf) -> Self {
        Self {
            config_path,
            print_config_path: false,
            print_db_path: false,
            demo: false,
            print_example: false,
            check_only: false,
            show_help: false,
        }
    }
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions::new(default_config_path);
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let flag = match arg.as_ref() {
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(path.as_ref());
                continue;
            }
            "--print-config-path" => &mut options.print_config_path,
            "--print-path" => &mut options.print_db_path,
            "--print-example-config" => &mut options.print_example,
            "--demo" => &mut options.demo,
            "--check" => &mut options.check_only,
            "--help" | "-h" => &mut options.show_help,
            unknown => bail!("unknown argument {unknown:?}; run with --help to see supported options"),
        };
        *flag = true;
    }
    Ok(options)
}

fn help_text() -> String {
    let mut text = String::from("anttracker - terminal issue tracker\n\nUsage: anttracker [options]\n");
    for (flag, about) in FLAGS {
        text.push_str(&format!("  {flag:<24} {about}\n"));
    }
    text
}

fn print_help() {
    print!("{}", help_text());
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, FLAGS, help_text, parse_cli_args};
    use anyhow::Result;
    use std::path::PathBuf;

    fn default_path() -> PathBuf {
        PathBuf::from("/tmp/anttracker-config.toml")
    }

    #[test]
    fn no_arguments_keeps_defaults() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_path())?;
        assert_eq!(options, CliOptions::new(default_path()));
        Ok(())
    }

    #[test]
    fn config_override_takes_the_last_value() -> Result<()> {
        let options = parse_cli_args(
            ["--config", "/first.toml", "--demo", "--config", "/second.toml"],
            default_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/second.toml"));
        assert!(options.demo);
        Ok(())
    }

    #[test]
    fn config_without_value_is_an_error() {
        let error = parse_cli_args(["--config"], default_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));
    }

    #[test]
    fn unknown_argument_points_at_help() {
        let error =
            parse_cli_args(["--verbose"], default_path()).expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("\"--verbose\""));
        assert!(message.contains("--help"));
    }

    #[test]
    fn each_flag_sets_only_its_own_option() -> Result<()> {
        let cases: [(&str, fn(&CliOptions) -> bool); 7] = [
            ("--print-config-path", |o| o.print_config_path),
            ("--print-path", |o| o.print_db_path),
            ("--print-example-config", |o| o.print_example),
            ("--demo", |o| o.demo),
            ("--check", |o| o.check_only),
            ("--help", |o| o.show_help),
            ("-h", |o| o.show_help),
        ];
        for (flag, is_set) in cases {
            let options = parse_cli_args([flag], default_path())?;
            assert!(is_set(&options), "{flag} was not applied");
            let toggled = [
                options.print_config_path,
                options.print_db_path,
                options.print_example,
                options.demo,
                options.check_only,
                options.show_help,
            ];
            assert_eq!(toggled.iter().filter(|set| **set).count(), 1, "{flag}");
        }
        Ok(())
    }

    #[test]
    fn help_lists_every_flag() {
        let help = help_text();
        for (flag, about) in FLAGS {
            assert!(help.contains(flag), "missing {flag}");
            assert!(help.contains(about));
        }
    }
}
