//! bankstmt CLI - bank statement extraction tool

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use bankstmt::{
    parse_file_with_options, plan_chunks, render, JsonFormat, LopdfBackend, ParseOptions,
    Statement, Warning,
};

#[derive(Parser)]
#[command(name = "bankstmt")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Extract bank-statement PDFs to CSV and JSON", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a statement and write the CSV set
    Parse {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Parse a statement to JSON
    Json {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Show page count and chunk plan
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Pages per chunk
    #[arg(long, env = "BANKSTMT_CHUNK_SIZE", default_value_t = bankstmt::parser::DEFAULT_CHUNK_SIZE)]
    chunk_size: u32,

    /// Maximum worker threads
    #[arg(long, env = "BANKSTMT_WORKERS", default_value_t = bankstmt::parser::DEFAULT_MAX_WORKERS)]
    workers: usize,

    /// Process chunks one at a time on the main thread
    #[arg(long)]
    sequential: bool,

    /// Stop waiting for chunks after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,
}

impl RunArgs {
    fn options(&self) -> ParseOptions {
        let mut options = ParseOptions::new()
            .with_chunk_size(self.chunk_size)
            .with_max_workers(self.workers)
            .with_parallel(!self.sequential);
        if let Some(secs) = self.timeout_secs {
            options = options.with_timeout(Duration::from_secs(secs));
        }
        options
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { input, output, run } => cmd_parse(&input, output.as_deref(), &run),
        Commands::Json {
            input,
            output,
            compact,
            run,
        } => cmd_json(&input, output.as_deref(), compact, &run),
        Commands::Info { input, json, run } => cmd_info(&input, json, &run),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Parse with a progress bar fed from the chunk callback.
fn parse_with_progress(input: &Path, run: &RunArgs) -> bankstmt::Result<Statement> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} chunks {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_message("Parsing statement...");

    let progress = pb.clone();
    let options = run.options().with_progress(move |done, total| {
        progress.set_length(total as u64);
        progress.set_position(done as u64);
    });

    let result = parse_file_with_options(input, options);
    match &result {
        Ok(_) => pb.finish_with_message("Done!"),
        Err(_) => pb.abandon(),
    }
    result
}

fn cmd_parse(
    input: &Path,
    output: Option<&Path>,
    run: &RunArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_output", stem))
    });

    let statement = parse_with_progress(input, run)?;
    let paths = render::write_csv_dir(&statement, &output_dir)?;

    print_summary(&statement);

    println!("\n{}", "Output files:".green().bold());
    for (i, path) in paths.iter().enumerate() {
        let branch = if i + 1 == paths.len() { "└─" } else { "├─" };
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        println!("  {} {}", branch.dimmed(), name);
    }

    print_warnings(&statement.warnings);
    Ok(())
}

fn cmd_json(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    run: &RunArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let statement = parse_file_with_options(input, run.options())?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let json = render::to_json(&statement, format)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
        print_warnings(&statement.warnings);
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_info(input: &Path, json: bool, run: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let options = run.options();
    options.validate()?;

    let backend = LopdfBackend::load_file(input)?;
    let page_count = backend.page_count();
    let chunks = plan_chunks(page_count.max(1), options.chunk_size)?;
    let sequential = options.runs_sequentially(page_count);
    let workers = if sequential {
        1
    } else {
        options.worker_count(chunks.len())
    };

    if json {
        let plan = serde_json::json!({
            "file": input.display().to_string(),
            "pdf_version": backend.version(),
            "pages": page_count,
            "chunk_size": options.chunk_size,
            "chunks": chunks,
            "sequential": sequential,
            "workers": workers,
        });
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("{}", "Statement Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), backend.version());
    println!("{}: {}", "Pages".bold(), page_count);

    println!();
    println!("{}", "Chunk Plan".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!(
        "{}: {}",
        "Mode".bold(),
        if sequential { "sequential" } else { "parallel" }
    );
    println!("{}: {}", "Workers".bold(), workers);
    for chunk in &chunks {
        println!(
            "  {} pages {}-{}",
            format!("#{}", chunk.index).dimmed(),
            chunk.start_page,
            chunk.end_page
        );
    }

    Ok(())
}

fn print_summary(statement: &Statement) {
    println!();
    println!("{}", "Statement Summary".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let metadata = &statement.metadata;
    if !metadata.name.is_empty() {
        println!("{}: {}", "Account holder".bold(), metadata.name);
    }
    if !metadata.account_number.is_empty() {
        println!("{}: {}", "Account".bold(), metadata.account_number);
    }
    if !metadata.transaction_period.is_empty() {
        println!("{}: {}", "Period".bold(), metadata.transaction_period);
    }

    println!("{}: {}", "Pages".bold(), statement.page_count);
    println!("{}: {}", "Transactions".bold(), statement.transactions.len());
    println!(
        "{}: {}",
        "Withdrawals".bold(),
        statement.total_withdrawals()
    );
    println!("{}: {}", "Deposits".bold(), statement.total_deposits());
    if let Some(closing) = statement.totals.closing_balance {
        println!("{}: {}", "Closing balance".bold(), closing);
    }
    println!("{}: {}", "Legend entries".bold(), statement.legends.len());
}

fn print_warnings(warnings: &[Warning]) {
    if warnings.is_empty() {
        return;
    }
    println!(
        "\n{}",
        format!("{} warnings:", warnings.len()).yellow().bold()
    );
    for warning in warnings {
        println!("  {} {}", "!".yellow(), warning);
    }
}
