use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fab_core::{
    run, Event, EventEnvelope, ProductivityRow, RunParams, ShortfallRecord, Stage, StockLedger,
    TableHazard,
};
use fab_world::load_table;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "fab_cli", about = "Production chain simulation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one run and print the productivity, stock, and shortfall reports.
    Run {
        /// Path to the recipe table JSON.
        #[arg(long, default_value = "./content/recipes.json")]
        table: String,
        /// Population driving popular demand.
        #[arg(long)]
        population: f64,
        /// Fraction of full productivity industries operate at, in (0, 1].
        #[arg(long, default_value_t = 1.0)]
        utilization: f64,
        /// Directory run artifacts are written under.
        #[arg(long, default_value = "runs")]
        output_dir: String,
        /// Skip writing run artifacts.
        #[arg(long)]
        no_report: bool,
        /// Print the full event trace after the reports.
        #[arg(long)]
        verbose: bool,
    },
    /// Validate a recipe table and report hazards without running it.
    Validate {
        /// Path to the recipe table JSON.
        #[arg(long, default_value = "./content/recipes.json")]
        table: String,
    },
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

fn generate_run_id(population: f64) -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = now.as_secs();
    // Manual UTC time formatting to avoid adding a chrono dependency.
    let days = secs / 86400;
    let time_of_day = secs % 86400;
    let hours = time_of_day / 3600;
    let minutes = (time_of_day % 3600) / 60;
    let seconds = time_of_day % 60;

    // Days since epoch → year/month/day (simplified Gregorian).
    let (year, month, day) = epoch_days_to_date(days);

    format!("{year:04}{month:02}{day:02}_{hours:02}{minutes:02}{seconds:02}_pop{population}")
}

fn epoch_days_to_date(mut days: u64) -> (u64, u64, u64) {
    // Algorithm from http://howardhinnant.github.io/date_algorithms.html
    days += 719_468;
    let era = days / 146_097;
    let day_of_era = days % 146_097;
    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36524 - day_of_era / 146_096) / 365;
    let year = year_of_era + era * 400;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let mp = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if month <= 2 { year + 1 } else { year };
    (year, month, day)
}

fn create_run_dir(output_dir: &str, run_id: &str) -> Result<PathBuf> {
    let dir = PathBuf::from(output_dir).join(run_id);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating run directory: {}", dir.display()))?;
    Ok(dir)
}

fn run_command(
    table_path: &str,
    params: RunParams,
    output_dir: &str,
    no_report: bool,
    verbose: bool,
) -> Result<()> {
    let loaded = load_table(Path::new(table_path))?;
    print_hazards(&loaded.hazards);

    let mut ledger = loaded.ledger();
    let report = run(&loaded.table, params, &mut ledger)?;

    println!(
        "Run complete: population={} utilization={} rows={} table_version={}",
        params.population,
        params.utilization,
        loaded.row_count(),
        loaded.table_version,
    );
    print_productivity(&report.productivity.rows);
    print_stock(&ledger);
    print_shortfalls(&report.shortfalls);
    if verbose {
        print_events(&report.events);
    }

    if !no_report {
        let run_id = generate_run_id(params.population);
        let run_dir = create_run_dir(output_dir, &run_id)?;
        fab_world::write_run_info(
            &run_dir,
            &run_id,
            params,
            &loaded.table_version,
            "fab_cli",
            serde_json::json!({ "table": table_path }),
        )?;
        write_json(&run_dir.join("productivity.json"), &report.productivity.rows)?;
        write_json(&run_dir.join("stock.json"), &stock_json(&ledger))?;
        write_json(&run_dir.join("shortfalls.json"), &report.shortfalls)?;
        println!("Run directory: {}", run_dir.display());
    }

    Ok(())
}

fn validate_command(table_path: &str) -> Result<()> {
    let loaded = load_table(Path::new(table_path))?;
    println!(
        "{table_path}: OK ({} stages, {} rows, table_version {})",
        loaded.table.stages.len(),
        loaded.row_count(),
        loaded.table_version,
    );
    print_hazards(&loaded.hazards);
    Ok(())
}

// ---------------------------------------------------------------------------
// Report rendering
// ---------------------------------------------------------------------------

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let file =
        std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, value)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Final stock as a product → quantity object, sorted by product id.
fn stock_json(ledger: &StockLedger) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (product, quantity) in ledger.entries_sorted() {
        map.insert(product.0, serde_json::Value::from(quantity));
    }
    serde_json::Value::Object(map)
}

fn print_hazards(hazards: &[TableHazard]) {
    for hazard in hazards {
        println!("warning: {hazard}");
    }
}

fn print_productivity(rows: &[ProductivityRow]) {
    println!("{}", "-".repeat(80));
    println!(
        "{:<20} {:<15} {:>12} {:>12}  {}",
        "industry", "stage", "full", "operating", "products"
    );
    for row in rows {
        let stage = row.stage.map_or("-", Stage::name);
        let products = row
            .products
            .iter()
            .map(|product| product.0.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:<20} {:<15} {:>12.3} {:>12.3}  {products}",
            row.industry.0, stage, row.full_productivity, row.operating_productivity,
        );
    }
}

fn print_stock(ledger: &StockLedger) {
    println!("{}", "-".repeat(80));
    println!("Final stock");
    for (product, quantity) in ledger.entries_sorted() {
        println!("  {:<28} {quantity:>14.3}", product.0);
    }
}

fn print_shortfalls(shortfalls: &[ShortfallRecord]) {
    println!("{}", "-".repeat(80));
    if shortfalls.is_empty() {
        println!("All demanded products fully produced.");
        return;
    }
    println!("Shortfalls");
    for record in shortfalls {
        println!("  {} ({})", record.product.0, record.industry.0);
        for deficit in &record.missing {
            println!("      missing {:>12.3}  {}", deficit.deficit, deficit.input.0);
        }
    }
}

fn print_events(events: &[EventEnvelope]) {
    println!("{}", "-".repeat(80));
    println!("Events");
    for envelope in events {
        println!(
            "  [{} {:<14}] {}",
            envelope.id.0,
            envelope.stage.name(),
            describe(&envelope.event),
        );
    }
}

fn describe(event: &Event) -> String {
    match event {
        Event::Extracted {
            industry,
            product,
            extracted,
            availability_left,
        } => format!("{industry} extracted {extracted:.3} {product} ({availability_left:.3} left)"),
        Event::Produced {
            industry,
            product,
            produced,
            demanded,
        } => format!("{industry} produced {produced:.3} / {demanded:.3} {product}"),
        Event::Stalled {
            industry,
            product,
            demanded,
        } => format!("{industry} stalled on {product} (demanded {demanded:.3})"),
        Event::Skipped { industry, product } => {
            format!("{industry} skipped {product} (no demand)")
        }
        Event::InputShort {
            industry,
            product,
            input,
            deficit,
        } => format!("{industry} short {deficit:.3} {input} for {product}"),
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            table,
            population,
            utilization,
            output_dir,
            no_report,
            verbose,
        } => {
            run_command(
                &table,
                RunParams {
                    population,
                    utilization,
                },
                &output_dir,
                no_report,
                verbose,
            )?;
        }
        Commands::Validate { table } => validate_command(&table)?,
    }
    Ok(())
}
