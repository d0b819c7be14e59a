use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use trade_journal::analytics::{BucketType, CrossTab, Dimension, TradeFilter};
use trade_journal::config::Settings;
use trade_journal::database::SqliteTradeStore;
use trade_journal::journal::{BucketReport, ImportBatch, Journal, TradeLogEntry};
use trade_journal::types::format_wall_clock;

#[derive(Parser)]
#[command(name = "trade-journal")]
#[command(version = "0.1.0")]
#[command(about = "Trade journal metrics and performance reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file path (defaults to ./journal.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Args)]
struct FilterArgs {
    /// First entry date included (YYYY-MM-DD)
    #[arg(long, global = true)]
    from: Option<String>,
    /// Last entry date included (YYYY-MM-DD)
    #[arg(long, global = true)]
    to: Option<String>,
    /// Symbol to include (repeatable)
    #[arg(long, global = true)]
    symbol: Vec<String>,
    /// Strategy (playbook) id
    #[arg(long, global = true)]
    strategy: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Import trades from a JSON file
    Import {
        /// JSON array of trades, or an object with trades, strategies and tags
        #[arg(short, long)]
        file: PathBuf,
    },
    /// List trades with their computed P&L and R
    List,
    /// Delete a trade by id
    Delete {
        #[arg(long)]
        id: String,
    },
    /// Show overall performance
    Summary,
    /// Aggregate trades into time buckets
    Report {
        /// Bucket type (day, month, time, duration)
        #[arg(short, long, default_value = "day")]
        by: String,
        /// Cross-tabulate against strategy, tag, status or side
        #[arg(long)]
        cross: Option<String>,
    },
    /// Show the cumulative P&L curve
    Equity {
        /// Group by calendar day instead of per trade
        #[arg(long)]
        daily: bool,
    },
    /// Print the effective settings
    Config,
}

fn parse_date(raw: &str, which: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid {} date format. Use YYYY-MM-DD", which))
}

impl FilterArgs {
    fn to_filter(&self) -> Result<TradeFilter> {
        let from = self.from.as_deref().map(|s| parse_date(s, "from")).transpose()?;
        let to = self.to.as_deref().map(|s| parse_date(s, "to")).transpose()?;

        if let (Some(from), Some(to)) = (from, to) {
            if to < from {
                return Err(anyhow!("--to must not be before --from"));
            }
        }

        Ok(TradeFilter {
            from,
            to,
            symbols: self.symbol.clone(),
            playbook_id: self.strategy.clone(),
            ..Default::default()
        })
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let settings = Settings::load(cli.config.as_deref())?;

    if let Commands::Config = cli.command {
        if cli.json {
            return print_json(&settings);
        }
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    let filter = cli.filter.to_filter()?;
    let store = SqliteTradeStore::new(&settings.database_url).await?;
    let journal = Journal::new(store, settings);

    match cli.command {
        Commands::Import { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let batch = ImportBatch::from_json(&raw)?;
            let report = journal.import(batch).await?;
            if cli.json {
                print_json(&report)?;
            }
        }
        Commands::List => {
            let log = journal.trade_log(&filter).await?;
            if cli.json {
                print_json(&log)?;
            } else {
                print_trade_log(&log);
            }
        }
        Commands::Delete { id } => {
            journal.delete(&id).await?;
        }
        Commands::Summary => {
            let summary = journal.summary(&filter).await?;
            if cli.json {
                print_json(&summary)?;
            } else {
                summary.print_summary();
            }
        }
        Commands::Report { by, cross } => {
            let bucket_type = BucketType::from_str(&by)?;
            let dimension = cross.as_deref().map(Dimension::from_str).transpose()?;
            let report = journal.report(&filter, bucket_type, dimension).await?;
            if cli.json {
                print_json(&report)?;
            } else {
                print_report(&report);
            }
        }
        Commands::Equity { daily } => {
            if daily {
                let days = journal.daily(&filter).await?;
                if cli.json {
                    return print_json(&days);
                }
                println!("\n=== Daily P&L ===");
                println!("{:<12} {:>12} {:>7} {:>5} {:>6}", "Date", "P&L", "Trades", "Wins", "Losses");
                for day in &days {
                    println!(
                        "{:<12} {:>12.2} {:>7} {:>5} {:>6}",
                        day.date.to_string(), day.pnl, day.trades, day.wins, day.losses
                    );
                }
            } else {
                let curve = journal.equity(&filter).await?;
                if cli.json {
                    return print_json(&curve);
                }
                println!("\n=== Equity Curve ===");
                println!("{:<24} {:>12} {:>14} {:>12}", "Closed", "P&L", "Cumulative", "Drawdown");
                for point in &curve {
                    println!(
                        "{:<24} {:>12.2} {:>14.2} {:>12.2}",
                        format_wall_clock(&point.time),
                        point.pnl,
                        point.cumulative_pnl,
                        point.drawdown
                    );
                }
            }
        }
        Commands::Config => {}
    }

    info!("Done");
    Ok(())
}

fn print_trade_log(log: &[TradeLogEntry]) {
    println!("\n=== Trades ===");
    println!(
        "{:<10} {:<20} {:<8} {:<5} {:>8} {:>10} {:>10} {:>10} {:>7}",
        "Id", "Entry", "Symbol", "Side", "Qty", "Entry $", "Exit $", "P&L", "R"
    );
    for entry in log {
        let trade = &entry.trade;
        let short_id: String = trade.id.chars().take(8).collect();
        let exit = trade.exit_price.map(|p| format!("{:.2}", p)).unwrap_or_else(|| "open".to_string());
        let r = entry.r_multiple.map(|r| format!("{:.2}", r)).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<10} {:<20} {:<8} {:<5} {:>8} {:>10.2} {:>10} {:>10.2} {:>7}",
            short_id,
            trade.entry_date.format("%Y-%m-%d %H:%M").to_string(),
            trade.symbol,
            trade.direction.as_str(),
            trade.quantity,
            trade.entry_price,
            exit,
            entry.pnl,
            r
        );
    }
}

fn print_report(report: &BucketReport) {
    println!("\n=== Performance by {} ===", report.bucket_type);
    println!(
        "{:<14} {:>6} {:>12} {:>7} {:>7} {:>10} {:>10} {:>8} {:>12}",
        "Bucket", "Trades", "Net P&L", "Win %", "PF", "Avg Win", "Avg Loss", "Total R", "Max DD"
    );
    for row in &report.rows {
        println!(
            "{:<14} {:>6} {:>12.2} {:>7.1} {:>7.2} {:>10.2} {:>10.2} {:>8.2} {:>12.2}",
            row.label,
            row.count,
            row.net_pnl,
            row.win_rate,
            row.profit_factor,
            row.avg_win,
            row.avg_loss,
            row.total_r,
            row.max_drawdown
        );
    }

    if let Some(cross) = &report.cross {
        print_cross_tab(cross);
    }
}

fn print_cross_tab(cross: &CrossTab) {
    println!();
    let mut header = format!("{:<14}", "");
    for col in &cross.cols {
        header.push_str(&format!(" {:>18}", col));
    }
    println!("{}", header);

    for row in &cross.matrix {
        let mut line = format!("{:<14}", row.label);
        for cell in &row.cells {
            let text = match cell {
                Some(cell) => format!("{:.2} ({})", cell.pnl, cell.count),
                None => "-".to_string(),
            };
            line.push_str(&format!(" {:>18}", text));
        }
        println!("{}", line);
    }
}
