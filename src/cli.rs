//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_model_adapter::JsonModelAdapter;
use crate::domain::backtest::run_backtest;
use crate::domain::bar_series::BarSeries;
use crate::domain::config_validation::AppConfig;
use crate::domain::error::TradelabError;
use crate::domain::features::{FeatureFrame, IndicatorEngine};
use crate::domain::labels::direction_labels;
use crate::domain::metrics::{PerformanceReport, Summary};
use crate::domain::signal::{ConstantSignal, LogisticModel, ModelSignal, SignalSource};
use crate::domain::sweep::{run_threshold_sweep, threshold_grid};
use crate::ports::data_port::DataPort;
use crate::ports::model_port::ModelPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "tradelab", about = "Causal feature pipeline and signal backtester")]
pub struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

/// Overrides shared by every command that loads bars.
#[derive(clap::Args, Debug, Clone)]
pub struct DataArgs {
    #[arg(short, long)]
    pub config: PathBuf,
    #[arg(long)]
    pub symbol: Option<String>,
    /// Read bars from this CSV instead of `<data.dir>/<SYMBOL>.csv`
    #[arg(long)]
    pub data: Option<PathBuf>,
}

/// Where probabilities come from.
#[derive(clap::Args, Debug, Clone)]
pub struct SignalArgs {
    /// JSON logistic model; overrides `[model] path`
    #[arg(long)]
    pub model: Option<PathBuf>,
    /// Use a fixed probability instead of a model
    #[arg(long, conflicts_with = "model")]
    pub probability: Option<f64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest and write the report
    Backtest {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        signal: SignalArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export the feature dataset with direction labels
    Features {
        #[command(flatten)]
        data: DataArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Backtest a range of decision thresholds in parallel
    Sweep {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        signal: SignalArgs,
        #[arg(long, default_value_t = 0.5)]
        from: f64,
        #[arg(long, default_value_t = 0.7)]
        to: f64,
        #[arg(long, default_value_t = 0.05)]
        step: f64,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose);

    let outcome = match cli.command {
        Command::Backtest {
            data,
            signal,
            output,
        } => run_backtest_command(&data, &signal, output.as_deref()),
        Command::Features { data, output } => run_features(&data, output.as_deref()),
        Command::Sweep {
            data,
            signal,
            from,
            to,
            step,
        } => run_sweep(&data, &signal, from, to, step),
        Command::Validate { config } => run_validate(&config),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp_secs()
        .format_target(false)
        .try_init();
}

pub fn load_config(path: &Path) -> Result<AppConfig, TradelabError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    AppConfig::from_port(&adapter)
}

fn load_app(args: &DataArgs) -> Result<AppConfig, TradelabError> {
    let mut app = load_config(&args.config)?;
    if let Some(symbol) = &args.symbol {
        app.data.symbol = symbol.clone();
    }
    if let Some(file) = &args.data {
        app.data.file = Some(file.clone());
    }
    Ok(app)
}

pub fn load_series(app: &AppConfig) -> Result<BarSeries, TradelabError> {
    let adapter = match &app.data.file {
        Some(file) => CsvAdapter::with_file(file.clone()),
        None => CsvAdapter::new(app.data.dir.clone()),
    };
    let bars = adapter.fetch_bars(&app.data.symbol, app.data.start, app.data.end)?;
    if bars.is_empty() {
        return Err(TradelabError::Data {
            reason: format!("no bars for {}", app.data.symbol),
        });
    }
    BarSeries::new(bars)
}

fn compute_frame(app: &AppConfig, series: &BarSeries) -> Result<FeatureFrame, TradelabError> {
    let frame = IndicatorEngine::new(app.features.clone()).compute(series)?;
    log::info!(
        "{} {}: {} bars, {} features, first complete row {}",
        app.data.symbol,
        app.data.timeframe,
        series.len(),
        frame.names().len(),
        frame.warmup()
    );
    Ok(frame)
}

/// A signal source description that can be instantiated once per run.
#[derive(Debug, Clone)]
pub enum SourceSpec {
    Model(LogisticModel),
    Constant(f64),
}

impl SourceSpec {
    pub fn resolve(app: &AppConfig, args: &SignalArgs) -> Result<Self, TradelabError> {
        if let Some(p) = args.probability {
            return Ok(SourceSpec::Constant(p));
        }
        let path = args
            .model
            .clone()
            .or_else(|| app.model_path.clone())
            .ok_or_else(|| TradelabError::ConfigInvalid {
                section: "model".to_string(),
                key: "path".to_string(),
                reason: "no model configured (set [model] path, --model or --probability)"
                    .to_string(),
            })?;
        Ok(SourceSpec::Model(JsonModelAdapter::new(path).load_classifier()?))
    }

    pub fn build(&self) -> Box<dyn SignalSource + Send> {
        match self {
            SourceSpec::Model(model) => Box::new(ModelSignal::new(model.clone())),
            SourceSpec::Constant(p) => Box::new(ConstantSignal::new(*p)),
        }
    }
}

fn print_summary(summary: &Summary) {
    eprintln!("\n=== Results ===");
    eprintln!("Total Return:     {:.2}%", summary.total_return * 100.0);
    eprintln!("Annualized:       {:.2}%", summary.annualized_return * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", summary.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", summary.sortino_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", summary.max_drawdown * 100.0);
    eprintln!("Total Trades:     {}", summary.trade_count);
    eprintln!("Win Rate:         {:.1}%", summary.win_rate * 100.0);
    eprintln!("Avg Trade P&L:    {:.2}", summary.average_trade_pnl);
    eprintln!("Profit Factor:    {:.2}", summary.profit_factor);
    eprintln!("Commission:       {:.2}", summary.total_commission);
    eprintln!("Final Equity:     {:.2}", summary.final_equity);
}

fn run_backtest_command(
    data: &DataArgs,
    signal: &SignalArgs,
    output: Option<&Path>,
) -> Result<(), TradelabError> {
    let app = load_app(data)?;
    let series = load_series(&app)?;
    let frame = compute_frame(&app, &series)?;
    let mut source = SourceSpec::resolve(&app, signal)?.build();

    eprintln!(
        "Running backtest: {} ({} bars, threshold {})",
        app.data.symbol,
        series.len(),
        app.backtest.threshold
    );
    let result = run_backtest(app.backtest.clone(), &series, &frame, &mut source)?;
    let summary = PerformanceReport::new(app.report).summarize(result.equity_curve(), result.trades());
    print_summary(&summary);

    let dir = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| app.output_dir.join(&app.data.symbol));
    CsvReportAdapter::new().write(&result, &summary, &dir)?;
    eprintln!("\nReport written to: {}", dir.display());
    Ok(())
}

fn run_features(data: &DataArgs, output: Option<&Path>) -> Result<(), TradelabError> {
    let app = load_app(data)?;
    let series = load_series(&app)?;
    let frame = compute_frame(&app, &series)?;
    let labels = direction_labels(&series, app.horizon_days);

    let path = output.map(Path::to_path_buf).unwrap_or_else(|| {
        app.output_dir
            .join(format!("{}_{}_featured.csv", app.data.symbol, app.data.timeframe))
    });
    CsvReportAdapter::new().write_features(&frame, &labels, &path)?;
    eprintln!("Features written to: {} ({} rows)", path.display(), frame.len());
    Ok(())
}

fn run_sweep(
    data: &DataArgs,
    signal: &SignalArgs,
    from: f64,
    to: f64,
    step: f64,
) -> Result<(), TradelabError> {
    let app = load_app(data)?;
    let series = load_series(&app)?;
    let frame = compute_frame(&app, &series)?;
    let spec = SourceSpec::resolve(&app, signal)?;
    let report = PerformanceReport::new(app.report);

    let thresholds = threshold_grid(from, to, step)?;
    let points = run_threshold_sweep(&app.backtest, &thresholds, &series, &frame, &report, || {
        spec.build()
    })?;

    println!("threshold,total_return,max_drawdown,sharpe_ratio,trade_count,win_rate");
    for point in &points {
        let s = &point.summary;
        println!(
            "{:.4},{:.6},{:.6},{:.4},{},{:.4}",
            point.threshold, s.total_return, s.max_drawdown, s.sharpe_ratio, s.trade_count, s.win_rate
        );
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), TradelabError> {
    eprintln!("Validating config: {}", config_path.display());
    let app = load_config(config_path)?;

    eprintln!("  Symbol:           {} ({})", app.data.symbol, app.data.timeframe);
    let names: Vec<String> = app
        .features
        .indicators
        .iter()
        .map(|d| format!("{}={}", d.name, d.kind))
        .collect();
    eprintln!("  Features:         {}", names.join(", "));
    eprintln!("  Warm-up bars:     {}", app.features.max_window());
    match app.features.max_gap {
        Some(gap) => eprintln!("  Gap check:        fail above {} days", gap.num_days()),
        None => eprintln!("  Gap check:        off (set [features] max_gap_days to enable)"),
    }
    eprintln!("  Initial capital:  {:.2}", app.backtest.initial_capital);
    eprintln!("  Commission rate:  {}", app.backtest.execution.commission_rate);
    eprintln!("  Threshold:        {}", app.backtest.threshold);
    match &app.model_path {
        Some(path) => {
            let model = JsonModelAdapter::new(path.clone()).load_classifier()?;
            if let Some(missing) = model
                .features
                .iter()
                .find(|f| !app.features.indicators.iter().any(|d| &d.name == *f))
            {
                return Err(TradelabError::Model {
                    reason: format!("model feature '{missing}' is not computed by [features]"),
                });
            }
            eprintln!("  Model:            {} ({} features)", path.display(), model.features.len());
        }
        None => eprintln!("  Model:            (none)"),
    }

    eprintln!("\nConfiguration is valid.");
    Ok(())
}
