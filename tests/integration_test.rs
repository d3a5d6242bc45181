//! Integration tests for the feature pipeline and simulator.
//!
//! Tests cover:
//! - Indicator causality against truncated histories (proptest)
//! - Ordering enforcement (unordered, duplicate, gap)
//! - Next-bar execution: no decision fills on its own bar
//! - Cash and equity conservation across fills
//! - Drawdown and report statistics over simulated runs
//! - Determinism of repeated runs
//! - The 20-bar step-up scenario end to end
//! - Model-driven pipeline through a mock data port

mod common;

use approx::assert_relative_eq;
use common::*;
use proptest::prelude::*;
use tradelab::domain::backtest::{run_backtest, BacktestConfig, Simulator};
use tradelab::domain::bar_series::BarSeries;
use tradelab::domain::error::{OrderingError, TradelabError};
use tradelab::domain::execution::{ExecutionConfig, InsufficientFundsPolicy};
use tradelab::domain::features::{FeatureConfig, IndicatorDef, IndicatorEngine};
use tradelab::domain::indicator::IndicatorType;
use tradelab::domain::metrics::PerformanceReport;
use tradelab::domain::position::{FillNote, FillReason};
use tradelab::domain::signal::{
    AlternatingSignal, ConstantSignal, LogisticModel, ModelSignal, TableSignal,
};
use tradelab::ports::data_port::DataPort;

fn all_kinds() -> FeatureConfig {
    FeatureConfig::new(vec![
        IndicatorDef::of(IndicatorType::Sma(5)),
        IndicatorDef::of(IndicatorType::Ema(4)),
        IndicatorDef::of(IndicatorType::Rsi(3)),
        IndicatorDef::of(IndicatorType::Atr(3)),
        IndicatorDef::of(IndicatorType::Roc(2)),
        IndicatorDef::of(IndicatorType::Stddev(4)),
        IndicatorDef::of(IndicatorType::Obv),
        IndicatorDef::of(IndicatorType::LogReturn),
    ])
}

fn no_features() -> FeatureConfig {
    FeatureConfig::new(vec![IndicatorDef::of(IndicatorType::Sma(1))])
}

fn config(initial_capital: f64) -> BacktestConfig {
    BacktestConfig {
        initial_capital,
        ..BacktestConfig::default()
    }
}

mod causality {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn rows_unchanged_by_truncation(
            closes in prop::collection::vec(10.0f64..200.0, 8..60),
            cut in 0usize..60,
        ) {
            let series = make_series(&closes);
            let config = all_kinds();
            let max_window = config.max_window();
            let engine = IndicatorEngine::new(config);
            let full = engine.compute(&series).unwrap();

            let len = (cut % series.len()).max(max_window);
            prop_assume!(len <= series.len());
            let truncated = engine.compute(&series.prefix(len)).unwrap();

            prop_assert_eq!(truncated.len(), len);
            for (i, row) in truncated.rows().iter().enumerate() {
                prop_assert_eq!(row, full.get(i).unwrap());
            }
        }

        #[test]
        fn warmup_rows_absent(closes in prop::collection::vec(1.0f64..100.0, 6..30)) {
            let series = make_series(&closes);
            let frame = IndicatorEngine::new(all_kinds()).compute(&series).unwrap();
            for def in &all_kinds().indicators {
                for (i, row) in frame.rows().iter().enumerate() {
                    let valid = i + 1 >= def.window();
                    prop_assert_eq!(row.get(&def.name).is_some(), valid, "{} row {}", def.name, i);
                }
            }
        }
    }

    #[test]
    fn future_shock_does_not_move_past_rows() {
        let mut closes: Vec<f64> = (0..30).map(|i| 100.0 + (i % 5) as f64).collect();
        let base = IndicatorEngine::new(all_kinds())
            .compute(&make_series(&closes))
            .unwrap();
        closes[29] = 10_000.0;
        let shocked = IndicatorEngine::new(all_kinds())
            .compute(&make_series(&closes))
            .unwrap();

        assert_eq!(&base.rows()[..29], &shocked.rows()[..29]);
        assert_ne!(base.rows()[29], shocked.rows()[29]);
    }
}

mod ordering {
    use super::*;

    #[test]
    fn unordered_series_rejected() {
        let mut bars = flat_bars(&[1.0, 2.0, 3.0]);
        bars.swap(1, 2);
        assert!(matches!(
            BarSeries::new(bars),
            Err(TradelabError::Ordering(OrderingError::Unordered { index: 2, .. }))
        ));
    }

    #[test]
    fn duplicate_timestamp_rejected() {
        let mut bars = flat_bars(&[1.0, 2.0, 3.0]);
        bars[2].timestamp = bars[1].timestamp;
        assert!(matches!(
            BarSeries::new(bars),
            Err(TradelabError::Ordering(OrderingError::Duplicate { index: 2, .. }))
        ));
    }

    #[test]
    fn gap_rejected_only_when_configured() {
        let mut bars = flat_bars(&[1.0, 2.0, 3.0, 4.0]);
        bars[3].timestamp = day(10);
        let series = BarSeries::new(bars).unwrap();

        assert!(IndicatorEngine::new(no_features()).compute(&series).is_ok());
        let err = IndicatorEngine::new(no_features().with_max_gap(chrono::Duration::days(3)))
            .compute(&series)
            .unwrap_err();
        assert!(matches!(
            err,
            TradelabError::Ordering(OrderingError::Gap { index: 3, .. })
        ));
    }

    #[test]
    fn series_shorter_than_window_is_fatal() {
        let series = make_series(&[1.0, 2.0, 3.0]);
        assert!(matches!(
            IndicatorEngine::new(FeatureConfig::default()).compute(&series),
            Err(TradelabError::InsufficientWarmup {
                bars: 3,
                required: 50
            })
        ));
    }
}

mod execution_timing {
    use super::*;

    #[test]
    fn alternating_signal_never_fills_same_bar() {
        let closes: Vec<f64> = (0..12).map(|i| 100.0 + i as f64).collect();
        let series = make_series(&closes);
        let frame = IndicatorEngine::new(no_features()).compute(&series).unwrap();
        let mut source = AlternatingSignal::new(0.9, 0.1);

        let result = run_backtest(config(10_000.0), &series, &frame, &mut source).unwrap();

        // Decisions at bars 0, 2, 4, .. go long; 1, 3, .. go flat.
        let signal_fills: Vec<_> = result
            .fills()
            .iter()
            .filter(|f| f.reason == FillReason::Signal)
            .collect();
        for (k, fill) in signal_fills.iter().enumerate() {
            let bar = &series.bars()[k + 1];
            assert_eq!(fill.timestamp, bar.timestamp);
            assert_relative_eq!(fill.price, bar.open);
        }
        for trade in result.trades() {
            assert!(trade.exit_timestamp > trade.entry_timestamp);
        }
    }

    #[test]
    fn table_signal_switches_only_next_bar() {
        let series = make_series(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        let frame = IndicatorEngine::new(no_features()).compute(&series).unwrap();
        let mut source = TableSignal::new(0.2).with(day(3), 0.8);

        let result = run_backtest(config(10_000.0), &series, &frame, &mut source).unwrap();

        assert_eq!(result.trades().len(), 1);
        let trade = &result.trades()[0];
        assert_eq!(trade.entry_timestamp, day(4));
        assert_eq!(trade.exit_timestamp, day(5));
        assert_relative_eq!(trade.entry_price, series.bars()[3].open);
        assert_relative_eq!(trade.exit_price, series.bars()[4].open);
    }
}

mod conservation {
    use super::*;

    fn costly_config() -> BacktestConfig {
        BacktestConfig {
            initial_capital: 10_000.0,
            allow_shorting: true,
            execution: ExecutionConfig {
                commission_rate: 0.002,
                slippage_rate: 0.001,
                position_size: 0.8,
                ..ExecutionConfig::default()
            },
            ..BacktestConfig::default()
        }
    }

    #[test]
    fn cash_changes_only_by_notional_and_commission() {
        let closes: Vec<f64> = (0..40)
            .map(|i| 100.0 + 10.0 * ((i as f64) * 0.7).sin())
            .collect();
        let series = make_series(&closes);
        let frame = IndicatorEngine::new(no_features()).compute(&series).unwrap();
        let mut source = AlternatingSignal::new(0.8, 0.1);

        let result = run_backtest(costly_config(), &series, &frame, &mut source).unwrap();
        assert!(!result.fills().is_empty());

        let mut cash = 10_000.0;
        let mut position = 0.0;
        for fill in result.fills() {
            cash -= fill.quantity * fill.price + fill.commission;
            position += fill.quantity;
            assert_relative_eq!(cash, fill.cash_after, epsilon = 1e-6);
            assert_relative_eq!(position, fill.position_after, epsilon = 1e-9);
        }
    }

    #[test]
    fn closed_run_equity_is_capital_plus_realized() {
        let closes: Vec<f64> = (0..30).map(|i| 50.0 + (i % 7) as f64 * 3.0).collect();
        let series = make_series(&closes);
        let frame = IndicatorEngine::new(no_features()).compute(&series).unwrap();
        let mut source = AlternatingSignal::new(0.9, 0.05);

        let result = run_backtest(costly_config(), &series, &frame, &mut source).unwrap();
        let realized: f64 = result.trades().iter().map(|t| t.realized_pnl).sum();

        assert!(result.portfolio.position.is_flat());
        assert_relative_eq!(result.final_equity(), 10_000.0 + realized, epsilon = 1e-6);
    }

    #[test]
    fn equity_points_mark_to_close() {
        let series = make_series(&[100.0, 102.0, 98.0, 105.0]);
        let frame = IndicatorEngine::new(no_features()).compute(&series).unwrap();
        let mut source = ConstantSignal::new(0.9);
        let result = run_backtest(costly_config(), &series, &frame, &mut source).unwrap();

        for point in result.equity_curve() {
            assert_relative_eq!(point.total_equity, point.cash + point.position_value);
        }
        assert_eq!(result.equity_curve().len(), series.len());
    }

    #[test]
    fn oversized_entry_clamped_and_annotated() {
        let series = make_series(&[100.0, 100.0, 100.0]);
        let frame = IndicatorEngine::new(no_features()).compute(&series).unwrap();
        let config = BacktestConfig {
            execution: ExecutionConfig {
                commission_rate: 0.01,
                position_size: 1.0,
                ..ExecutionConfig::default()
            },
            ..config(1_000.0)
        };
        let result = run_backtest(config, &series, &frame, &mut ConstantSignal::new(0.9)).unwrap();

        let entry = &result.fills()[0];
        assert!(matches!(entry.note, Some(FillNote::Clamped { .. })));
        assert!(entry.cash_after >= 0.0);
    }

    #[test]
    fn reject_policy_leaves_portfolio_flat() {
        let series = make_series(&[100.0, 100.0, 100.0]);
        let frame = IndicatorEngine::new(no_features()).compute(&series).unwrap();
        let config = BacktestConfig {
            execution: ExecutionConfig {
                commission_rate: 0.01,
                funds_policy: InsufficientFundsPolicy::Reject,
                ..ExecutionConfig::default()
            },
            ..config(1_000.0)
        };
        let result = run_backtest(config, &series, &frame, &mut ConstantSignal::new(0.9)).unwrap();

        assert!(result.trades().is_empty());
        assert!(result
            .fills()
            .iter()
            .all(|f| matches!(f.note, Some(FillNote::Rejected { .. }))));
        assert_relative_eq!(result.final_equity(), 1_000.0);
    }
}

mod reporting {
    use super::*;

    #[test]
    fn idempotent_runs() {
        let closes: Vec<f64> = (0..80).map(|i| 100.0 + ((i * 37) % 11) as f64).collect();
        let series = make_series(&closes);
        let engine = IndicatorEngine::new(FeatureConfig::standard(5, 3, 8, 5));
        let model = LogisticModel::new(
            vec!["rsi".into(), "log_return".into()],
            vec![0.05, -20.0],
            -2.5,
        )
        .unwrap();

        let run = || {
            let frame = engine.compute(&series).unwrap();
            let mut source = ModelSignal::new(model.clone());
            run_backtest(config(10_000.0), &series, &frame, &mut source).unwrap()
        };
        let a = run();
        let b = run();

        assert_eq!(
            serde_json::to_vec(a.equity_curve()).unwrap(),
            serde_json::to_vec(b.equity_curve()).unwrap()
        );
        assert_eq!(
            serde_json::to_vec(a.trades()).unwrap(),
            serde_json::to_vec(b.trades()).unwrap()
        );
    }

    #[test]
    fn summary_of_losing_round_trip() {
        let series = make_series(&[100.0, 100.0, 80.0, 80.0]);
        let frame = IndicatorEngine::new(no_features()).compute(&series).unwrap();
        let mut source = TableSignal::new(0.1).with(day(1), 0.9).with(day(2), 0.9);
        let result = run_backtest(config(1_000.0), &series, &frame, &mut source).unwrap();
        let summary = PerformanceReport::default().summarize(result.equity_curve(), result.trades());

        assert_eq!(summary.trade_count, 1);
        assert_eq!(summary.trades_lost, 1);
        assert_eq!(summary.win_rate, 0.0);
        assert_relative_eq!(summary.total_return, -0.2, epsilon = 1e-9);
        assert_relative_eq!(summary.max_drawdown, 0.2, epsilon = 1e-9);
    }
}

mod end_to_end {
    use super::*;

    #[test]
    fn step_up_scenario() {
        let series = step_scenario();
        let frame = IndicatorEngine::new(no_features()).compute(&series).unwrap();
        let mut source = ConstantSignal::new(0.9);

        let result = run_backtest(config(10_000.0), &series, &frame, &mut source).unwrap();

        let entry = &result.fills()[0];
        assert_eq!(entry.timestamp, day(2));
        assert_relative_eq!(entry.price, 100.0);
        assert_relative_eq!(entry.quantity, 100.0);

        assert_eq!(result.trades().len(), 1);
        let trade = &result.trades()[0];
        assert_eq!(trade.exit_timestamp, day(20));
        assert_relative_eq!(trade.realized_pnl, 1_000.0, epsilon = 1e-9);
        assert_eq!(result.fills().last().unwrap().reason, FillReason::EndOfData);

        assert_relative_eq!(result.final_equity(), 11_000.0, epsilon = 1e-9);
        let summary = PerformanceReport::default().summarize(result.equity_curve(), result.trades());
        assert_relative_eq!(summary.total_return, 0.10, epsilon = 1e-12);
        assert_eq!(summary.max_drawdown, 0.0);
    }

    #[test]
    fn streaming_can_stop_early() {
        let series = step_scenario();
        let frame = IndicatorEngine::new(no_features()).compute(&series).unwrap();
        let mut sim = Simulator::new(config(10_000.0), &series, &frame).unwrap();
        let mut source = ConstantSignal::new(0.9);

        for _ in 0..5 {
            sim.step(&mut source).unwrap();
        }
        let partial = sim.finish();
        assert_eq!(partial.bars_processed, 5);
        assert_eq!(partial.equity_curve().len(), 5);
        assert!(partial.portfolio.position.is_long());
    }

    #[test]
    fn model_pipeline_through_data_port() {
        let closes: Vec<f64> = (0..70)
            .map(|i| 100.0 + 5.0 * ((i as f64) * 0.3).sin() + i as f64 * 0.1)
            .collect();
        let port = MockDataPort::new().with_bars("SPY", gapless_bars(&closes));

        let bars = port.fetch_bars("SPY", Some(day(5)), None).unwrap();
        assert_eq!(bars.len(), 66);
        let series = BarSeries::new(bars).unwrap();
        let frame = IndicatorEngine::new(FeatureConfig::default())
            .compute(&series)
            .unwrap();
        assert_eq!(frame.warmup(), 49);

        let model = LogisticModel::new(
            vec!["rsi".into(), "ema_short".into(), "ema_long".into()],
            vec![0.02, 0.5, -0.5],
            -1.0,
        )
        .unwrap();
        let mut source = ModelSignal::new(model);
        let result = run_backtest(config(10_000.0), &series, &frame, &mut source).unwrap();

        assert_eq!(result.decisions, series.len() - 1 - frame.warmup());
        assert!(result
            .fills()
            .iter()
            .all(|f| f.timestamp > series.bars()[frame.warmup()].timestamp));
    }

    #[test]
    fn data_port_errors_surface() {
        let port = MockDataPort::new().with_error("BAD", "feed offline");
        assert!(matches!(
            port.fetch_bars("BAD", None, None),
            Err(TradelabError::Data { .. })
        ));
    }
}
