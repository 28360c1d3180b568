use crate::cli::LintArgs;
use color_eyre::eyre::{eyre, Result};
use duct::cmd;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Fmt,
    Clippy,
    Test,
}

const PIPELINE: [Step; 3] = [Step::Fmt, Step::Clippy, Step::Test];

impl Step {
    fn args(self, fix: bool) -> Vec<&'static str> {
        match (self, fix) {
            (Step::Fmt, false) => vec!["fmt", "--all", "--check"],
            (Step::Fmt, true) => vec!["fmt", "--all"],
            (Step::Clippy, false) => vec!["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
            (Step::Clippy, true) => vec![
                "clippy",
                "--workspace",
                "--all-targets",
                "--fix",
                "--allow-dirty",
                "--",
                "-D",
                "warnings",
            ],
            (Step::Test, _) => vec!["test", "--workspace", "--all-targets"],
        }
    }

    fn skipped(self, args: &LintArgs) -> bool {
        match self {
            Step::Fmt => args.no_fmt,
            Step::Clippy => args.no_clippy,
            Step::Test => args.no_test,
        }
    }
}

fn display_name(args: &[&str]) -> String {
    format!("cargo {}", args.join(" "))
}

fn log_entry(name: &str, output: &str) -> String {
    format!("=== {name} ===\n{output}\n")
}

/// Run the lint pipeline, stopping at the first failing step
///
/// Every step's output is appended to `target/xtask-lint.log`.
pub fn run(args: &LintArgs) -> Result<()> {
    let log_path = log_path()?;
    let mut log = fs::File::create(&log_path)?;

    for step in PIPELINE.into_iter().filter(|step| !step.skipped(args)) {
        let step_args = step.args(args.fix);
        let name = display_name(&step_args);

        let output = cmd("cargo", &step_args)
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run()?;
        let text = String::from_utf8_lossy(&output.stdout);

        write!(log, "{}", log_entry(&name, &text))?;

        if !output.status.success() {
            print!("{text}");
            println!("\nlint failed at: {name}");
            println!("log: {}", log_path.display());
            return Err(eyre!("{name} failed"));
        }

        if args.verbose {
            print!("{text}");
        }
        println!("✓ {name}");
    }

    println!("log: {}", log_path.display());
    Ok(())
}

fn log_path() -> Result<PathBuf> {
    let target_dir = std::env::current_dir()?.join("target");
    fs::create_dir_all(&target_dir)?;
    Ok(target_dir.join("xtask-lint.log"))
}
