//! CLI integration tests for command orchestration.
//!
//! Tests cover:
//! - Argument parsing for every subcommand
//! - Config validation across sections
//! - Simulate and signals commands against CSV files on disk

use chrono::{Days, NaiveDate};
use clap::Parser;
use levtrader::adapters::file_config_adapter::FileConfigAdapter;
use levtrader::adapters::order_csv_adapter::{load_orders, write_orders};
use levtrader::cli::{self, Cli, Command};
use levtrader::domain::error::LevtraderError;
use levtrader::domain::order::{Action, Order};
use levtrader::domain::run_config::SimulationConfig;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn day(i: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2011, 1, 3).unwrap() + Days::new(i)
}

fn write_prices(dir: &Path, symbol: &str, prices: &[f64]) {
    let mut content = String::from("Date,Open,High,Low,Close,Volume,Adj Close\n");
    // newest first, as the files usually come
    for (i, p) in prices.iter().enumerate().rev() {
        content.push_str(&format!("{},{p},{},{},{p},1000,{p}\n", day(i as u64), p + 1.0, p - 1.0));
    }
    fs::write(dir.join(format!("{}.csv", symbol)), content).unwrap();
}

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("levtrader").chain(args.iter().copied())).unwrap()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn setup(extra_config: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    write_prices(&data, "SPY", &[300.0; 30]);
    write_prices(&data, "IBM", &[10.0; 30]);

    let config = dir.path().join("levtrader.ini");
    fs::write(
        &config,
        format!(
            "[data]\ndir = {}\n\n[simulation]\nstart_value = 10000\nmax_leverage = 2.0\n{}",
            data.display(),
            extra_config
        ),
    )
    .unwrap();
    (dir, config)
}

mod argument_parsing {
    use super::*;

    #[test]
    fn simulate_arguments() {
        let cli = Cli::try_parse_from([
            "levtrader",
            "simulate",
            "--config",
            "a.ini",
            "--orders",
            "orders.csv",
            "--max-leverage",
            "1.5",
            "--no-deleverage",
        ])
        .unwrap();
        match cli.command {
            Command::Simulate {
                config,
                orders,
                output,
                max_leverage,
                no_deleverage,
            } => {
                assert_eq!(config, Path::new("a.ini"));
                assert_eq!(orders, Path::new("orders.csv"));
                assert!(output.is_none());
                assert_eq!(max_leverage, Some(1.5));
                assert!(no_deleverage);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn signals_arguments() {
        let cli = Cli::try_parse_from(["levtrader", "signals", "-c", "a.ini", "-o", "out.csv", "--simulate"]).unwrap();
        assert!(matches!(cli.command, Command::Signals { simulate: true, output: Some(_), .. }));
    }

    #[test]
    fn allocate_arguments() {
        let cli = parse(&[
            "allocate",
            "-c",
            "a.ini",
            "--symbols",
            "IBM,AAPL",
            "--allocations",
            "0.6,0.4",
            "--start",
            "2011-01-03",
            "--end",
            "2011-01-12",
        ]);
        match cli.command {
            Command::Allocate {
                symbols,
                allocations,
                start,
                end,
                ..
            } => {
                assert_eq!(symbols, vec!["IBM".to_string(), "AAPL".to_string()]);
                assert_eq!(allocations, vec![0.6, 0.4]);
                assert_eq!(start, day(0));
                assert_eq!(end, day(9));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn allocate_rejects_bad_date() {
        assert!(
            Cli::try_parse_from([
                "levtrader",
                "allocate",
                "-c",
                "a.ini",
                "--symbols",
                "IBM",
                "--allocations",
                "1",
                "--start",
                "03/01/2011",
                "--end",
                "2011-01-12",
            ])
            .is_err()
        );
    }

    #[test]
    fn simulate_requires_orders() {
        assert!(Cli::try_parse_from(["levtrader", "simulate", "--config", "a.ini"]).is_err());
    }

    #[test]
    fn unknown_subcommand_fails() {
        assert!(Cli::try_parse_from(["levtrader", "backtest"]).is_err());
    }
}

mod config_validation {
    use super::*;

    #[test]
    fn full_config_is_valid() {
        let adapter = FileConfigAdapter::from_string(
            r#"
[data]
dir = prices

[simulation]
start_value = 1000000
max_leverage = 2

[strategy]
kind = macd_bollinger
symbols = IBM
start_date = 2010-01-01
end_date = 2010-12-31

[stop_loss]
enabled = true
window = 10
"#,
        )
        .unwrap();
        assert!(cli::validate_config(&adapter, true).is_ok());
    }

    #[test]
    fn strategy_section_is_optional() {
        let adapter = FileConfigAdapter::from_string("[data]\ndir = prices\n").unwrap();
        assert!(cli::validate_config(&adapter, false).is_ok());
    }

    #[test]
    fn missing_data_section_fails() {
        let adapter = FileConfigAdapter::from_string("[simulation]\nstart_value = 10\n").unwrap();
        let err = cli::validate_config(&adapter, false).unwrap_err();
        assert!(matches!(err, LevtraderError::ConfigMissing { section, .. } if section == "data"));
    }

    #[test]
    fn price_source_reads_data_section() {
        let (_dir, config) = setup("");
        let adapter = FileConfigAdapter::from_file(&config).unwrap();
        let source = cli::price_source(&adapter).unwrap();
        assert_eq!(source.list_symbols().unwrap(), vec!["IBM", "SPY"]);
    }
}

mod commands {
    use super::*;

    #[test]
    fn simulate_writes_deleveraged_orders() {
        let (dir, config) = setup("");
        let orders_path = dir.path().join("orders.csv");
        let out_path = dir.path().join("out.csv");
        write_orders(
            &orders_path,
            &[
                Order::new(day(0), "IBM", Action::Buy, 100),
                Order::new(day(1), "IBM", Action::Buy, 100),
                Order::new(day(2), "IBM", Action::Buy, 2_000),
            ],
        )
        .unwrap();

        let cli = parse(&[
            "simulate",
            "--config",
            path_str(&config),
            "--orders",
            path_str(&orders_path),
            "--output",
            path_str(&out_path),
        ]);
        cli::run(cli);

        let kept = load_orders(&out_path).unwrap();
        assert_eq!(
            kept,
            vec![
                Order::new(day(0), "IBM", Action::Buy, 100),
                Order::new(day(1), "IBM", Action::Buy, 100),
            ]
        );
    }

    #[test]
    fn no_deleverage_keeps_every_order() {
        let (dir, config) = setup("");
        let orders_path = dir.path().join("orders.csv");
        let out_path = dir.path().join("out.csv");
        write_orders(&orders_path, &[Order::new(day(0), "IBM", Action::Buy, 5_000)]).unwrap();

        let cli = parse(&[
            "simulate",
            "-c",
            path_str(&config),
            "--orders",
            path_str(&orders_path),
            "-o",
            path_str(&out_path),
            "--no-deleverage",
        ]);
        cli::run(cli);

        assert_eq!(load_orders(&out_path).unwrap().len(), 1);
    }

    #[test]
    fn missing_orders_file_writes_nothing() {
        let (dir, config) = setup("");
        let out_path = dir.path().join("out.csv");
        let cli = parse(&[
            "simulate",
            "-c",
            path_str(&config),
            "--orders",
            path_str(&dir.path().join("nope.csv")),
            "-o",
            path_str(&out_path),
        ]);
        cli::run(cli);
        assert!(!out_path.exists());
    }

    #[test]
    fn allocation_uses_configured_start_value() {
        let (dir, config) = setup("");
        let rising: Vec<f64> = (0..30).map(|i| 10.0 + i as f64).collect();
        write_prices(&dir.path().join("data"), "AAPL", &rising);

        let adapter = FileConfigAdapter::from_file(&config).unwrap();
        let source = cli::price_source(&adapter).unwrap();
        let sim = SimulationConfig::from_config(&adapter).unwrap();
        let (portfolio, performance) = cli::run_allocation_pipeline(
            &source,
            &["IBM".to_string(), "AAPL".to_string()],
            &[0.5, 0.5],
            day(0),
            day(9),
            &sim,
        )
        .unwrap();

        assert_eq!(portfolio.values().len(), 10);
        // IBM is flat, AAPL goes from 10 to 19
        assert!((portfolio.values()[9] - 14_500.0).abs() < 1e-6);
        let performance = performance.unwrap();
        assert!((performance.cumulative_return - 0.45).abs() < 1e-9);
        // flat benchmark
        assert_eq!(performance.beta, 1.0);
    }

    #[test]
    fn allocation_count_must_match_symbols() {
        let (_dir, config) = setup("");
        let adapter = FileConfigAdapter::from_file(&config).unwrap();
        let source = cli::price_source(&adapter).unwrap();
        let err = cli::run_allocation_pipeline(
            &source,
            &["IBM".to_string()],
            &[0.5, 0.5],
            day(0),
            day(9),
            &SimulationConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LevtraderError::AllocationMismatch { .. }));
    }

    #[test]
    fn signals_writes_threshold_orders() {
        let (dir, _) = setup("");
        let preds = dir.path().join("preds.csv");
        fs::write(&preds, format!("Date,Prediction\n{},0.02\n", day(10))).unwrap();
        let config = dir.path().join("signals.ini");
        fs::write(
            &config,
            format!(
                "[data]\ndir = {}\n\n[strategy]\nkind = threshold\nsymbols = IBM\nstart_date = {}\nend_date = {}\nholding_days = 3\nshares = 50\npredictions = {}\n",
                dir.path().join("data").display(),
                day(0),
                day(29),
                preds.display()
            ),
        )
        .unwrap();
        let out_path = dir.path().join("signals.csv");

        let cli = parse(&[
            "signals",
            "-c",
            path_str(&config),
            "-o",
            path_str(&out_path),
        ]);
        cli::run(cli);

        assert_eq!(
            load_orders(&out_path).unwrap(),
            vec![
                Order::new(day(10), "IBM", Action::Buy, 50),
                Order::new(day(13), "IBM", Action::Sell, 50),
            ]
        );
    }
}
