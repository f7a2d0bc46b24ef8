use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use kpick::{
    filters::{find_files, split_fragments, SkipPaths},
    search::{FnHooks, COMMENT_PATTERN},
    ScanConfig, ScanEngine, ScanReport,
};
use std::io::{self, BufRead, Write};
use std::{num::NonZeroUsize, path::PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Find lines matching a pattern (Hangul by default)", long_about = None)]
struct Cli {
    /// Directory to scan
    #[arg(short = 'd', long = "dir", default_value = ".")]
    root: PathBuf,

    /// Only scan files with this extension ("*" for all files)
    #[arg(short = 'e', long = "ext", default_value = "*")]
    extension: String,

    /// Comma-separated path fragments to skip (".git" and "tmp" are always skipped)
    #[arg(short = 's', long = "skip-paths")]
    skip_paths: Option<String>,

    /// Report lines matching this regular expression
    #[arg(short = 'm', long = "match")]
    match_pattern: Option<String>,

    /// Never report lines matching this regular expression
    #[arg(short = 'i', long = "ignore", conflicts_with = "ignore_comments")]
    ignore_pattern: Option<String>,

    /// Never report lines containing common comment markers
    #[arg(long)]
    ignore_comments: bool,

    /// Print each file as it is scanned
    #[arg(short, long)]
    verbose: bool,

    /// Ask before scanning the files that were found
    #[arg(long)]
    interactive: bool,

    /// Only print files that could not be scanned
    #[arg(long)]
    error_only: bool,

    /// Number of worker threads
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Open file limit to size chunks with, instead of the OS limit
    #[arg(long)]
    max_open_files: Option<usize>,

    /// Configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn to_config(&self) -> ScanConfig {
        let defaults = ScanConfig::default();
        let ignore_pattern = if self.ignore_comments {
            Some(COMMENT_PATTERN.to_string())
        } else {
            self.ignore_pattern.clone()
        };

        ScanConfig {
            root_path: self.root.clone(),
            file_extension: self.extension.clone(),
            skip_paths: self
                .skip_paths
                .as_deref()
                .map(split_fragments)
                .unwrap_or_default(),
            match_pattern: self
                .match_pattern
                .clone()
                .unwrap_or(defaults.match_pattern),
            ignore_pattern,
            verbose: self.verbose,
            interactive: self.interactive,
            error_only: self.error_only,
            thread_count: self.threads.unwrap_or(defaults.thread_count),
            max_open_files: self.max_open_files,
            log_level: defaults.log_level,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ScanConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?
        .merge_with_cli(cli.to_config());

    init_logging(&config.log_level);
    debug!("Effective configuration: {:?}", config);
    run(&config, cli.json)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(config: &ScanConfig, json: bool) -> Result<()> {
    let skip = SkipPaths::new(config.skip_paths.as_slice())?;
    let extension = &config.file_extension;
    let root = config.root_path.display();

    if !json {
        println!("find [*.{extension}] files in [{root}] directory");
    }
    let files = find_files(&config.root_path, extension, &skip)?;

    if files.is_empty() {
        if json {
            println!("{}", ScanReport::new().to_json()?);
        } else {
            println!("[*.{extension}] file not found in [{root}] directory");
        }
        return Ok(());
    }

    if config.interactive {
        let question = format!("found [{}] files. scan it? (y/n): ", files.len());
        let stdin = io::stdin();
        // Keep stdout parseable in JSON mode
        let mut prompt: Box<dyn Write> = if json {
            Box::new(io::stderr())
        } else {
            Box::new(io::stdout())
        };
        if !confirm(&mut stdin.lock(), &mut prompt, &question, "y", "n")? {
            return Ok(());
        }
    }

    let target = config.scan_target()?;
    let match_pattern = target.match_pattern().to_string();
    let verbose = config.verbose;
    let hooks = FnHooks::new(
        |path| {
            if verbose {
                println!("[{}] scanning \"{}\"", path.display(), match_pattern);
            }
        },
        |path| {
            if verbose {
                println!("[{}] scanning done", path.display());
            }
        },
    );

    let engine = ScanEngine::from_config(config)?;
    let report = engine.run(&files, &target, &hooks);

    if json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    if config.verbose || config.error_only {
        print_errors(&report);
    }
    if !config.error_only {
        print_matches(&report);
    }
    print_summary(&report);
    Ok(())
}

/// Asks `question` until the answer is `ok` or `cancel`. End of input declines.
fn confirm<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
    ok: &str,
    cancel: &str,
) -> io::Result<bool> {
    loop {
        write!(output, "{question}")?;
        output.flush()?;

        let mut response = String::new();
        if input.read_line(&mut response)? == 0 {
            return Ok(false);
        }

        let response = response.trim();
        if response == ok {
            return Ok(true);
        }
        if response == cancel {
            return Ok(false);
        }
    }
}

fn print_errors(report: &ScanReport) {
    for error in &report.errors {
        println!(
            "[{}] scanning error - {}",
            error.path.display(),
            error.message.red()
        );
    }
}

fn print_matches(report: &ScanReport) {
    for file in &report.files {
        println!("{}", file.path.display().to_string().blue());
        for (line_number, line) in &file.matched_lines {
            println!("{}: {}", line_number.to_string().green(), line);
        }
    }
}

fn print_summary(report: &ScanReport) {
    let summary = &report.summary;
    println!("[{}] scanning files", summary.files_scanned);
    println!("[{}] error", summary.errors);
    println!("[{}] success", summary.successes());
    println!("[{}] files matched", summary.files_with_matches);
}
