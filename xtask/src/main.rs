use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for tilespace")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// fmt, clippy, tests and docs
    Check,
    /// cargo fmt --check
    Fmt,
    /// Clippy with warnings denied
    Clippy,
    /// Workspace tests
    Test,
    /// Rustdoc without dependencies
    Doc,
    /// Flood fill and frame-render timings
    Bench,
    /// Drive the CLI end to end against a scratch project
    Smoke {
        /// Project directory, created if missing
        #[arg(long, default_value = "target/smoke")]
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            for step in [Step::Fmt, Step::Clippy, Step::Test, Step::Doc] {
                cargo(&step.args())?;
            }
        }
        Commands::Fmt => cargo(&Step::Fmt.args())?,
        Commands::Clippy => cargo(&Step::Clippy.args())?,
        Commands::Test => cargo(&Step::Test.args())?,
        Commands::Doc => cargo(&Step::Doc.args())?,
        Commands::Bench => cargo(&Step::Bench.args())?,
        Commands::Smoke { dir } => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating {}", dir.display()))?;
            for args in smoke_runs(&dir) {
                cargo(&args)?;
            }
            println!("==> Smoke output in {}", dir.display());
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Fmt,
    Clippy,
    Test,
    Doc,
    Bench,
}

impl Step {
    fn args(self) -> Vec<String> {
        let args: &[&str] = match self {
            Self::Fmt => &["fmt", "--all", "--", "--check"],
            Self::Clippy => &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
            Self::Test => &["test", "--workspace"],
            Self::Doc => &["doc", "--workspace", "--no-deps"],
            Self::Bench => &["bench", "-p", "tilespace-render", "--bench", "bench_render"],
        };
        args.iter().map(|s| s.to_string()).collect()
    }
}

/// CLI invocations for the smoke run: create, inspect, render, export.
fn smoke_runs(dir: &Path) -> Vec<Vec<String>> {
    let project = dir.display().to_string();
    let ppm = dir.join("smoke.ppm").display().to_string();
    let export = dir.join("export").display().to_string();
    let sub: [&[&str]; 4] = [
        &["new", "smoke", "--width", "2", "--height", "1"],
        &["inspect", "smoke"],
        &["render", "smoke", "--width", "320", "--height", "240", "--out", &ppm],
        &["export", "smoke", "--out", &export],
    ];
    sub.iter()
        .map(|rest| {
            let mut args: Vec<String> = ["run", "-q", "-p", "tilespace-cli", "--", "--project"]
                .iter()
                .map(|s| s.to_string())
                .collect();
            args.push(project.clone());
            args.extend(rest.iter().map(|s| s.to_string()));
            args
        })
        .collect()
}

fn cargo(args: &[String]) -> Result<()> {
    println!("==> cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("cargo {} failed", args.first().map_or("", String::as_str));
    }
    Ok(())
}
