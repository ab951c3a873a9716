use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use reminder_fixer::config::{discover, RuleSet, ScanMode};
use reminder_fixer::rewrite::Rewriter;
use reminder_fixer::runner::{run, FixedFile, WriteMode};
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const ROOT_ENV: &str = "REMINDER_FIXER_ROOT";

#[derive(Parser)]
#[command(name = "reminder-fixer")]
#[command(about = "Rename fields and inject missing constructor arguments across a source tree", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite matching files in place
    Apply {
        #[command(flatten)]
        target: TargetArgs,

        /// Dry run - report what would change without writing
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Only print fixed files, no summary
        #[arg(short, long)]
        quiet: bool,
    },

    /// List files that would change; exits 1 if any would
    Check {
        #[command(flatten)]
        target: TargetArgs,

        /// Show unified diff of pending changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Print the effective rule set and its passes in order
    Rules {
        #[command(flatten)]
        rules: RuleArgs,
    },
}

#[derive(Args)]
struct RuleArgs {
    /// Rule file (defaults to ./reminder-fixer.toml, then the built-in rules)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How constructor calls are delimited
    #[arg(long, value_enum)]
    scan: Option<ScanArg>,
}

#[derive(Args)]
struct TargetArgs {
    /// Directory to rewrite (overrides the rule file and REMINDER_FIXER_ROOT)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// File name suffix to select (overrides the rule file)
    #[arg(short, long)]
    ext: Option<String>,

    #[command(flatten)]
    rules: RuleArgs,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScanArg {
    Balanced,
    Heuristic,
}

impl From<ScanArg> for ScanMode {
    fn from(arg: ScanArg) -> Self {
        match arg {
            ScanArg::Balanced => ScanMode::Balanced,
            ScanArg::Heuristic => ScanMode::Heuristic,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Apply {
            target,
            dry_run,
            diff,
            quiet,
        } => cmd_apply(target, dry_run, diff, quiet),

        Commands::Check { target, diff } => cmd_check(target, diff),

        Commands::Rules { rules } => cmd_rules(rules),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "reminder_fixer=warn",
        1 => "reminder_fixer=info",
        _ => "reminder_fixer=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load the rule set and apply the `--scan` override.
fn load_rules(args: &RuleArgs) -> Result<RuleSet> {
    let cwd = env::current_dir().context("cannot determine current directory")?;
    let mut rules = discover(args.config.as_deref(), &cwd)?;
    if let Some(scan) = args.scan {
        rules.meta.scan = scan.into();
    }
    Ok(rules)
}

/// Resolve the directory to rewrite.
///
/// Priority order:
/// 1. Explicit --root flag
/// 2. `meta.root` in the rule file
/// 3. REMINDER_FIXER_ROOT environment variable
/// 4. `./lib` if it exists
fn resolve_root(cli_root: Option<PathBuf>, rules: &RuleSet) -> Result<PathBuf> {
    if let Some(path) = cli_root {
        return Ok(path);
    }

    if let Some(path) = &rules.meta.root {
        return Ok(path.clone());
    }

    if let Some(env_root) = env::var_os(ROOT_ENV) {
        let path = PathBuf::from(env_root);
        if !path.exists() {
            anyhow::bail!(
                "{} points to a missing directory: {}",
                ROOT_ENV,
                path.display()
            );
        }
        return Ok(path);
    }

    let lib = PathBuf::from("lib");
    if lib.is_dir() {
        tracing::info!("using ./lib as root");
        return Ok(lib);
    }

    anyhow::bail!(
        "{}\n{}\n  {}\n  {}\n  {}",
        "Could not determine which directory to rewrite.".red(),
        "Try one of:".bold(),
        "1. Pass it explicitly: reminder-fixer apply --root path/to/lib",
        "2. Set `root` under [meta] in reminder-fixer.toml",
        "3. Set environment variable: export REMINDER_FIXER_ROOT=path/to/lib"
    )
}

/// Helper: Show unified diff between original and fixed content
fn display_diff(file: &Path, original: &str, fixed: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (fixed)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, fixed);

    for group in diff.grouped_ops(3) {
        for op in group {
            for change in diff.iter_changes(&op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => format!("-{}", change).red(),
                    ChangeTag::Insert => format!("+{}", change).green(),
                    ChangeTag::Equal => format!(" {}", change).normal(),
                };
                print!("{}", sign);
                if change.missing_newline() {
                    println!();
                }
            }
        }
    }
}

fn cmd_apply(target: TargetArgs, dry_run: bool, show_diff: bool, quiet: bool) -> Result<()> {
    let rules = load_rules(&target.rules)?;
    let root = resolve_root(target.root, &rules)?;
    let extension = target.ext.unwrap_or_else(|| rules.meta.extension.clone());
    let rewriter = Rewriter::new(&rules)?;

    let mode = if dry_run {
        WriteMode::DryRun
    } else {
        WriteMode::Write
    };

    let summary = run(&rewriter, &root, &extension, mode, |fixed: &FixedFile| {
        if dry_run {
            println!("Would fix {}", fixed.path.display());
        } else {
            println!("Fixed {}", fixed.path.display());
        }
        if show_diff {
            display_diff(&fixed.path, &fixed.original, &fixed.fixed);
        }
    })?;

    if !quiet && !summary.fixed.is_empty() {
        println!();
        println!(
            "{} {} of {} {} files {}",
            "Summary:".bold(),
            format!("{}", summary.fixed.len()).green(),
            summary.scanned,
            extension,
            if dry_run { "would change" } else { "fixed" }
        );
    }

    Ok(())
}

fn cmd_check(target: TargetArgs, show_diff: bool) -> Result<()> {
    let rules = load_rules(&target.rules)?;
    let root = resolve_root(target.root, &rules)?;
    let extension = target.ext.unwrap_or_else(|| rules.meta.extension.clone());
    let rewriter = Rewriter::new(&rules)?;

    let summary = run(
        &rewriter,
        &root,
        &extension,
        WriteMode::DryRun,
        |fixed: &FixedFile| {
            println!(
                "{} {} ({})",
                "✗".red(),
                fixed.path.display(),
                fixed.changed_by.join(", ").dimmed()
            );
            if show_diff {
                display_diff(&fixed.path, &fixed.original, &fixed.fixed);
            }
        },
    )?;

    if summary.fixed.is_empty() {
        println!(
            "{} {} files up to date",
            "✓".green(),
            summary.scanned
        );
        return Ok(());
    }

    eprintln!(
        "{} of {} files need fixing",
        format!("{}", summary.fixed.len()).red(),
        summary.scanned
    );
    std::process::exit(1);
}

fn cmd_rules(args: RuleArgs) -> Result<()> {
    let rules = load_rules(&args)?;
    let rewriter = Rewriter::new(&rules)?;

    let name = if rules.meta.name.is_empty() {
        "(unnamed)"
    } else {
        rules.meta.name.as_str()
    };
    println!("{} {}", "Rule set:".bold(), name);
    if let Some(description) = &rules.meta.description {
        println!("  {}", description.dimmed());
    }
    if let Some(root) = &rules.meta.root {
        println!("Root: {}", root.display());
    }
    println!("Extension: {}", rules.meta.extension);
    println!("Scan: {}", rules.meta.scan);
    println!();

    for (idx, rule) in rules.rules.iter().enumerate() {
        println!("{}. {}", idx + 1, rule);
    }
    println!();

    println!("{}", "Passes:".bold());
    for pass in rewriter.passes() {
        println!("  - {}", pass);
    }

    Ok(())
}
