// Entry point and high-level CLI flow.
//
// The dataset is loaded once up front and then handed by reference to
// whichever page runs:
// - `top` / menu [1] and [2] show the top-N companies of a segment,
// - `overall` / menu [3] ranks companies over a year-end range.
// Without a subcommand the program runs the interactive menu loop.
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use market_dashboard::loader::{self, Dataset, LoadReport};
use market_dashboard::ranking::{self, Weights};
use market_dashboard::types::{Metric, Segment};
use market_dashboard::util::{format_int, format_year_end};
use market_dashboard::{logging, output, reports, DashboardError};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Market performance dashboard for company financials", long_about = None)]
struct Cli {
    /// CSV file with company financial metrics
    #[arg(short, long, env = "MARKET_DASHBOARD_FILE", default_value = "top150.csv")]
    file: PathBuf,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Top companies of a segment by a current-period metric
    Top(TopArgs),
    /// Weighted composite ranking over a year-end range
    Overall(OverallArgs),
}

#[derive(Parser, Debug)]
struct TopArgs {
    #[arg(long, value_enum)]
    segment: Segment,

    #[arg(long, value_enum, default_value = "turnover")]
    metric: Metric,

    /// Number of companies to show (defaults to 10)
    #[arg(long)]
    top: Option<usize>,

    #[arg(long)]
    csv: Option<PathBuf>,

    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct OverallArgs {
    /// First year-end to include, e.g. Mar-21 (defaults to the earliest)
    #[arg(long)]
    from: Option<String>,

    /// Last year-end to include, e.g. Dec-23 (defaults to the latest)
    #[arg(long)]
    to: Option<String>,

    /// AT,OP,ROCE weights in percent, multiples of 10 summing to 100
    #[arg(long, default_value = "30,30,40")]
    weights: Weights,

    #[arg(long)]
    csv: Option<PathBuf>,

    #[arg(long)]
    json: Option<PathBuf>,
}

/// Print `label` and read one trimmed line. `None` on end of input.
fn prompt(label: &str) -> Option<String> {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Ask the user whether to go back to the page menu.
fn prompt_back_to_menu() -> bool {
    loop {
        let Some(resp) = prompt("Back to page selection (Y/N): ") else {
            return false;
        };
        match resp.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn print_load_report(path: &Path, data: &Dataset, report: &LoadReport) {
    println!(
        "Loaded {} ({} rows read, {} companies, {})",
        path.display(),
        format_int(report.total_rows),
        format_int(data.len()),
        report.encoding
    );
    if report.parse_errors > 0 {
        println!(
            "Note: {} rows skipped due to parse errors.",
            format_int(report.parse_errors)
        );
    }
    if report.coerced_cells > 0 || report.undated_rows > 0 {
        println!(
            "Info: {} non-numeric cells treated as missing, {} rows without a readable year end.",
            format_int(report.coerced_cells),
            format_int(report.undated_rows)
        );
    }
    println!();
}

fn export<T: serde::Serialize>(
    rows: &[T],
    whole: &impl serde::Serialize,
    csv: Option<&Path>,
    json: Option<&Path>,
) -> Result<()> {
    if let Some(path) = csv {
        output::write_csv(path, rows)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("(Table exported to {})", path.display());
    }
    if let Some(path) = json {
        output::write_json(path, whole)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("(Table exported to {})", path.display());
    }
    Ok(())
}

fn run_top(data: &Dataset, args: TopArgs) -> Result<()> {
    let rows = reports::filter_segment(data, args.segment);
    if rows.is_empty() {
        bail!("no companies with activity '{}'", args.segment.code());
    }
    let top_n = args.top.unwrap_or_else(|| reports::default_top_n(rows.len()));
    if top_n == 0 {
        bail!("--top must be at least 1");
    }
    let selection = reports::select_top(&rows, args.metric, top_n);
    print!("{}", output::render_top(args.segment.title(), &selection));
    export(
        &selection.rows,
        &selection.rows,
        args.csv.as_deref(),
        args.json.as_deref(),
    )
}

fn run_overall(data: &Dataset, args: OverallArgs) -> Result<()> {
    let (start, end) = data.range(args.from.as_deref(), args.to.as_deref())?;
    let rows = reports::filter_by_year_end(data.records(), start, end);
    info!(start = %start, end = %end, rows = rows.len(), "overall ranking requested");
    let table = ranking::score_with(&rows, &args.weights);
    println!("Calculate companies overall performance");
    println!("({} to {})\n", format_year_end(start), format_year_end(end));
    print!("{}", output::render_ranked(&table));
    export(&table.rows, &table, args.csv.as_deref(), args.json.as_deref())
}

fn choose_metric() -> Option<Metric> {
    println!("Choose a filter:");
    for (idx, metric) in Metric::ALL.iter().enumerate() {
        println!("[{}] {}", idx + 1, metric.label());
    }
    loop {
        let choice = prompt("Enter choice: ")?;
        match choice.parse::<usize>() {
            Ok(n) if (1..=Metric::ALL.len()).contains(&n) => return Some(Metric::ALL[n - 1]),
            _ => println!("Invalid choice. Please enter 1 to {}.", Metric::ALL.len()),
        }
    }
}

fn choose_top_n(available: usize) -> Option<usize> {
    let default = reports::default_top_n(available);
    loop {
        let choice = prompt(&format!("Top (1-{}, default {}): ", available, default))?;
        if choice.is_empty() {
            return Some(default);
        }
        match choice.parse::<usize>() {
            Ok(n) if (1..=available).contains(&n) => return Some(n),
            _ => println!("Invalid choice. Please enter a number from 1 to {}.", available),
        }
    }
}

fn interactive_segment(data: &Dataset, segment: Segment) -> Option<()> {
    let rows = reports::filter_segment(data, segment);
    if rows.is_empty() {
        println!("(no companies with activity '{}')\n", segment.code());
        return Some(());
    }
    let metric = choose_metric()?;
    let top_n = choose_top_n(rows.len())?;
    let selection = reports::select_top(&rows, metric, top_n);
    println!();
    print!("{}", output::render_top(segment.title(), &selection));
    Some(())
}

fn choose_bound(label: &str, default: NaiveDate, lo: NaiveDate, hi: NaiveDate) -> Option<NaiveDate> {
    loop {
        let raw = prompt(&format!("{} (Mon-YY, default {}): ", label, format_year_end(default)))?;
        if raw.is_empty() {
            return Some(default);
        }
        match loader::parse_bound(&raw) {
            Ok(d) if lo <= d && d <= hi => return Some(d),
            Ok(_) => println!(
                "Date must be between {} and {}.",
                lo.format("%m/%Y"),
                hi.format("%m/%Y")
            ),
            Err(e) => println!("{}", e),
        }
    }
}

fn choose_weight(label: &str) -> Option<u32> {
    loop {
        let raw = prompt(&format!("{}: (%) [0-90, step 10]: ", label))?;
        match raw.parse::<u32>() {
            Ok(w) if Weights::choices().any(|c| c == w) => return Some(w),
            _ => println!("Invalid weight. Choose one of 0, 10, ..., 90."),
        }
    }
}

fn interactive_overall(data: &Dataset) -> Option<()> {
    println!("Calculate companies overall performance\n");
    let Some((lo, hi)) = data.date_bounds() else {
        println!("Error: {}\n", DashboardError::NoDatedRows);
        return Some(());
    };
    println!(
        "Select a date range between {} and {}",
        lo.format("%m/%Y"),
        hi.format("%m/%Y")
    );
    let start = choose_bound("From", lo, lo, hi)?;
    let end = choose_bound("To", hi, start, hi)?;
    let rows = reports::filter_by_year_end(data.records(), start, end);

    println!("\nSelect weight of each metric:");
    let at = choose_weight("Annualized turnover")?;
    let op = choose_weight("Operating profit")?;
    let roce = choose_weight("ROCE")?;

    match ranking::score(&rows, at, op, roce) {
        Ok(table) => {
            println!();
            print!("{}", output::render_ranked(&table));
        }
        Err(e) => println!("Error: {}\n", e),
    }
    Some(())
}

fn run_menu(data: &Dataset) {
    loop {
        println!("Market Performance");
        println!("[1] Branded companies performance");
        println!("[2] Own branded companies performance");
        println!("[3] Calculate companies overall performance\n");
        let Some(choice) = prompt("Enter choice: ") else {
            break;
        };
        println!();
        let finished = match choice.as_str() {
            "1" => interactive_segment(data, Segment::Branded),
            "2" => interactive_segment(data, Segment::OwnBranded),
            "3" => interactive_overall(data),
            _ => {
                println!("Invalid choice. Please enter 1, 2 or 3.\n");
                continue;
            }
        };
        if finished.is_none() || !prompt_back_to_menu() {
            println!("Exiting the program.");
            break;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let (data, report) = loader::load_dataset(&cli.file)
        .with_context(|| format!("loading {}", cli.file.display()))?;
    print_load_report(&cli.file, &data, &report);

    match cli.command {
        Some(Command::Top(args)) => run_top(&data, args),
        Some(Command::Overall(args)) => run_overall(&data, args),
        None => {
            run_menu(&data);
            Ok(())
        }
    }
}
