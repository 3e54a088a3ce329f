//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::csv_price_adapter::CsvPriceAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::order_csv_adapter::{load_orders, write_orders};
use crate::adapters::prediction_csv_adapter::load_predictions;
use crate::domain::allocation::AllocationPortfolio;
use crate::domain::config_validation::{
    validate_data_config, validate_simulation_config, validate_strategy_config,
};
use crate::domain::deleverage::{DeleverageOutcome, deleverage};
use crate::domain::error::LevtraderError;
use crate::domain::metrics::PortfolioPerformance;
use crate::domain::order::{Order, concat_orders};
use crate::domain::run_config::{DataConfig, SimulationConfig, StrategyConfig};
use crate::domain::simulation::simulate;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PriceSource;

#[derive(Parser, Debug)]
#[command(name = "levtrader", about = "Leverage-capped order simulator and signal generator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate an order file and deleverage it under the cap
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        orders: PathBuf,
        /// Write the deleveraged order stream here
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        max_leverage: Option<f64>,
        /// Report leverage without removing any order
        #[arg(long)]
        no_deleverage: bool,
    },
    /// Generate orders from the configured strategy
    Signals {
        #[arg(short, long)]
        config: PathBuf,
        /// Write the order stream here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also simulate and deleverage the generated orders
        #[arg(long)]
        simulate: bool,
    },
    /// Price a fixed-weight portfolio and report its performance
    Allocate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long, value_delimiter = ',', required = true)]
        symbols: Vec<String>,
        /// One weight per symbol, in the same order
        #[arg(long, value_delimiter = ',', required = true)]
        allocations: Vec<f64>,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Simulate {
            config,
            orders,
            output,
            max_leverage,
            no_deleverage,
        } => run_simulate(&config, &orders, output.as_deref(), max_leverage, no_deleverage),
        Command::Signals {
            config,
            output,
            simulate,
        } => run_signals(&config, output.as_deref(), simulate),
        Command::Allocate {
            config,
            symbols,
            allocations,
            start,
            end,
        } => run_allocate(&config, &symbols, &allocations, start, end),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: &LevtraderError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

pub fn price_source(config: &dyn ConfigPort) -> Result<CsvPriceAdapter, LevtraderError> {
    let data = DataConfig::from_config(config)?;
    Ok(CsvPriceAdapter::new(data.dir).with_index_symbol(&data.index_symbol))
}

/// Initial simulation, deleverage outcome and performance of the result.
#[derive(Debug)]
pub struct SimulationReport {
    pub initial_peak_leverage: Option<f64>,
    pub outcome: DeleverageOutcome,
    pub performance: Option<PortfolioPerformance>,
}

/// Price, simulate and deleverage an order stream.
///
/// Prices are requested from the first order date to the configured end
/// date, or the last order date when none is set. A zero iteration budget
/// reports the leverage without removing orders.
pub fn run_simulation_pipeline(
    source: &dyn PriceSource,
    orders: Vec<Order>,
    sim: &SimulationConfig,
) -> Result<SimulationReport, LevtraderError> {
    let start = orders.iter().map(|o| o.date).min().ok_or(LevtraderError::EmptyOrders)?;
    let last = orders.iter().map(|o| o.date).max().ok_or(LevtraderError::EmptyOrders)?;
    let end = sim.end_date.unwrap_or(last);

    let mut symbols: Vec<String> = orders.iter().map(|o| o.symbol.clone()).collect();
    symbols.sort();
    symbols.dedup();

    let prices = Arc::new(source.get_data(&symbols, start, end, false)?);
    let portfolio = simulate(orders, sim.start_value, sim.end_date, prices)?;
    let initial_peak_leverage = portfolio.max_leverage();

    let outcome = deleverage(portfolio, &sim.deleverage);
    let performance = PortfolioPerformance::assess(&outcome.portfolio, sim.risk_free_rate);

    Ok(SimulationReport {
        initial_peak_leverage,
        outcome,
        performance,
    })
}

/// Run the configured strategy and merge every symbol into one stream.
pub fn run_signal_pipeline(source: &dyn PriceSource, config: &StrategyConfig) -> Result<Vec<Order>, LevtraderError> {
    let predictions = match &config.predictions {
        Some(path) if config.single_symbol_mode() => load_predictions(path)?,
        _ => Default::default(),
    };
    let strategy = config.build(predictions)?;
    let prices = source.get_data(
        &config.symbols,
        config.start_date,
        config.end_date,
        config.single_symbol_mode(),
    )?;
    let per_symbol = strategy.process_strategy(&config.symbols, &prices)?;
    Ok(concat_orders(per_symbol.into_values()))
}

/// Price a fixed-weight portfolio with the configured start value and
/// assess it against the benchmark.
pub fn run_allocation_pipeline(
    source: &dyn PriceSource,
    symbols: &[String],
    allocations: &[f64],
    start: NaiveDate,
    end: NaiveDate,
    sim: &SimulationConfig,
) -> Result<(AllocationPortfolio, Option<PortfolioPerformance>), LevtraderError> {
    let portfolio = AllocationPortfolio::load(source, symbols, allocations, start, end, sim.start_value)?;
    let performance = PortfolioPerformance::assess(&portfolio, sim.risk_free_rate);
    Ok((portfolio, performance))
}

fn print_performance(p: &PortfolioPerformance) {
    println!("Cumulative return:     {:.4}", p.cumulative_return);
    println!("Average daily return:  {:.6}", p.avg_daily_return);
    println!("Volatility:            {:.6}", p.volatility);
    println!("Sharpe ratio:          {:.4}", p.sharpe_ratio);
    println!("Max drawdown:          {:.4}", p.max_drawdown);
    println!("Beta:                  {:.4}", p.beta);
}

fn print_report(report: &SimulationReport, cap: f64) {
    let outcome = &report.outcome;
    let portfolio = &outcome.portfolio;
    let fmt_lev = |l: Option<f64>| l.map_or_else(|| "n/a".to_string(), |l| format!("{:.4}", l));

    println!("Leverage cap:          {:.2}", cap);
    println!("Initial peak leverage: {}", fmt_lev(report.initial_peak_leverage));
    println!("Final peak leverage:   {}", fmt_lev(portfolio.max_leverage()));
    println!("Deleverage status:     {}", outcome.status);
    println!("Passes:                {}", outcome.iterations);
    println!("Orders kept/removed:   {}/{}", portfolio.orders().len(), outcome.removed.len());
    for order in &outcome.removed {
        println!("  removed {} {} {} {}", order.date, order.action, order.shares, order.symbol);
    }
    if let Some(last) = portfolio.values().last() {
        println!("Final value ({}):  {:.2}", last.date, last.total);
    }
    if let Some(p) = &report.performance {
        print_performance(p);
    }
}

fn print_orders(orders: &[Order]) {
    println!("Date,Symbol,Order,Shares");
    for o in orders {
        println!("{},{},{},{}", o.date, o.symbol, o.action, o.shares.abs());
    }
}

fn run_simulate(
    config_path: &Path,
    orders_path: &Path,
    output: Option<&Path>,
    max_leverage: Option<f64>,
    no_deleverage: bool,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let mut sim = match SimulationConfig::from_config(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    if let Some(cap) = max_leverage {
        sim.deleverage.max_leverage = cap;
    }
    if no_deleverage {
        sim.deleverage.max_iterations = Some(0);
    }

    let source = match price_source(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    eprintln!("Loading orders from {}", orders_path.display());
    let orders = match load_orders(orders_path) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };

    let report = match run_simulation_pipeline(&source, orders, &sim) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };
    print_report(&report, sim.deleverage.max_leverage);

    if let Some(path) = output {
        if let Err(e) = write_orders(path, report.outcome.portfolio.orders()) {
            return fail(&e);
        }
        eprintln!("Orders written to {}", path.display());
    }
    ExitCode::SUCCESS
}

fn run_signals(config_path: &Path, output: Option<&Path>, then_simulate: bool) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let strategy_config = match StrategyConfig::from_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let source = match price_source(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    eprintln!(
        "Running {} on {} symbol(s)",
        strategy_config.kind,
        strategy_config.symbols.len()
    );
    let orders = match run_signal_pipeline(&source, &strategy_config) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };

    match output {
        Some(path) => {
            if let Err(e) = write_orders(path, &orders) {
                return fail(&e);
            }
            eprintln!("{} orders written to {}", orders.len(), path.display());
        }
        None => print_orders(&orders),
    }

    if then_simulate {
        if orders.is_empty() {
            eprintln!("No orders to simulate");
            return ExitCode::SUCCESS;
        }
        let sim = match SimulationConfig::from_config(&adapter) {
            Ok(s) => s,
            Err(e) => return fail(&e),
        };
        match run_simulation_pipeline(&source, orders, &sim) {
            Ok(report) => print_report(&report, sim.deleverage.max_leverage),
            Err(e) => return fail(&e),
        }
    }
    ExitCode::SUCCESS
}

fn run_allocate(
    config_path: &Path,
    symbols: &[String],
    allocations: &[f64],
    start: NaiveDate,
    end: NaiveDate,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let sim = match SimulationConfig::from_config(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let source = match price_source(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let (portfolio, performance) = match run_allocation_pipeline(&source, symbols, allocations, start, end, &sim) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };
    for (symbol, weight) in portfolio.symbols().iter().zip(portfolio.allocations()) {
        println!("  {:<8} {:.4}", symbol, weight);
    }
    if let (Some(date), Some(value)) = (portfolio.dates().last(), portfolio.values().last()) {
        println!("Final value ({}):  {:.2}", date, value);
    }
    if let Some(p) = &performance {
        print_performance(p);
    }
    ExitCode::SUCCESS
}

/// Check every section present in the file.
pub fn validate_config(config: &dyn ConfigPort, has_strategy: bool) -> Result<(), LevtraderError> {
    validate_data_config(config)?;
    validate_simulation_config(config)?;
    if has_strategy {
        validate_strategy_config(config)?;
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let has_strategy = adapter.get_string("strategy", "kind").is_some();
    match validate_config(&adapter, has_strategy) {
        Ok(()) => {
            println!("Config is valid: {}", config_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}
