//! End-to-end pipeline tests: data in, report out.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use signalbot_backtest::{BacktestConfig, BacktestMode, Backtester};
use signalbot_core::types::{
    Candle, CandleSeries, ExitReason, MultiTimeframeData, Signal, SignalType, Timeframe,
};
use signalbot_core::Telemetry;
use signalbot_indicators::IndicatorConfig;
use signalbot_risk::{RiskConfig, RiskFilter};
use signalbot_strategies::{
    build_predictor, CrossoverSignalGenerator, Predictor, PredictorKind, SignalConfig,
    SignalEngine, SignalEngineConfig,
};

/// Crash, long flat stretch, then a tiny uptick: EMA(9) crosses above
/// EMA(21) on the last candle while RSI(14) is still below 30.
fn oversold_cross() -> Vec<f64> {
    let mut closes = vec![100.0; 30];
    closes.extend(std::iter::repeat(80.0).take(151));
    closes.push(80.0001);
    closes
}

fn series(symbol: &str, tf: Timeframe, closes: &[f64]) -> CandleSeries {
    let candles = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Candle::new(i as i64 * tf.as_secs(), c, c + 0.5, c - 0.5, c, 1_000.0))
        .collect();
    CandleSeries::from_candles(symbol, tf, candles).expect("ordered fixture")
}

fn data(timeframes: &[Timeframe], closes: &[f64]) -> MultiTimeframeData {
    let mut data = MultiTimeframeData::new("BTC/USDT");
    for tf in timeframes {
        data.insert(series("BTC/USDT", *tf, closes));
    }
    data
}

fn crossover_engine(timeframes: Vec<Timeframe>, telemetry: &Telemetry) -> SignalEngine {
    let generator = CrossoverSignalGenerator::new(
        SignalConfig::default(),
        IndicatorConfig::default(),
        telemetry.child("generator"),
    )
    .unwrap();
    let predictor =
        build_predictor(PredictorKind::RuleBased, generator, None, telemetry.clone()).unwrap();
    let config = SignalEngineConfig {
        timeframes,
        ..Default::default()
    };
    SignalEngine::new(config, predictor, telemetry.child("signals")).unwrap()
}

fn backtester(engine: SignalEngine, mode: BacktestMode, telemetry: &Telemetry) -> Backtester {
    let risk = RiskFilter::new(RiskConfig::default(), telemetry.child("risk")).unwrap();
    let config = BacktestConfig {
        mode,
        ..Default::default()
    };
    Backtester::new(config, engine, risk, telemetry.clone()).unwrap()
}

#[test]
fn test_latest_mode_end_to_end() {
    let telemetry = Telemetry::disabled();
    let timeframes = Timeframe::default_ladder();
    let engine = crossover_engine(timeframes.clone(), &telemetry);
    let report = backtester(engine, BacktestMode::Latest, &telemetry)
        .run(&data(&timeframes, &oversold_cross()));

    assert_eq!(report.signals.len(), 1);
    let signal = &report.signals[0];
    assert_eq!(signal.signal_type, SignalType::Long);
    assert_eq!(signal.timeframe, Timeframe::Hour4);
    assert_eq!(signal.confirmed_timeframes, 4);
    assert_eq!(signal.confirmation_score(), 1.0);
    assert!(signal.stop() < signal.entry_price);
    assert!(signal.target() > signal.entry_price);
    // 10000 * 2% over a stop two ATRs (about 1.0 each) away
    assert!(signal.position_size > dec!(99) && signal.position_size < dec!(101));

    // The trailing window never reaches either level.
    assert_eq!(report.trades.len(), 1);
    let trade = &report.trades[0];
    assert_eq!(trade.exit_reason, ExitReason::WindowClose);
    assert_eq!(trade.exit_price, 80.0001);
    assert_eq!(trade.gross_pnl, Decimal::ZERO);
    assert!(trade.is_loss());

    assert_eq!(report.metrics.total_trades, 1);
    assert_eq!(report.metrics.losing_trades, 1);
    assert_eq!(report.metrics.sharpe_ratio, 0.0);
    assert_eq!(report.telemetry.confirmed, 1);
    assert_eq!(report.telemetry.candidates, 4);
    assert_eq!(report.telemetry.trades, 1);
}

#[test]
fn test_short_series_degrades_to_no_signal() {
    let telemetry = Telemetry::disabled();
    let timeframes = Timeframe::default_ladder();
    let engine = crossover_engine(timeframes.clone(), &telemetry);
    let closes = oversold_cross();
    let report = backtester(engine, BacktestMode::Latest, &telemetry)
        .run(&data(&timeframes, &closes[closes.len() - 3..]));

    assert!(report.signals.is_empty());
    assert!(report.metrics.is_empty());
    assert_eq!(report.to_json().unwrap().matches("\"total_trades\": 0").count(), 1);
}

#[test]
fn test_empty_data_degrades_to_no_signal() {
    let telemetry = Telemetry::disabled();
    let engine = crossover_engine(Timeframe::default_ladder(), &telemetry);
    let report = backtester(engine, BacktestMode::WalkForward, &telemetry)
        .run(&MultiTimeframeData::new("BTC/USDT"));
    assert!(report.trades.is_empty());
}

#[test]
fn test_walk_forward_exits_on_later_candles() {
    let telemetry = Telemetry::disabled();
    let mut closes = oversold_cross();
    closes.extend([81.0, 82.0, 83.5, 84.0, 84.0]);

    let engine = crossover_engine(vec![Timeframe::Hour4], &telemetry);
    let report = backtester(engine, BacktestMode::WalkForward, &telemetry)
        .run(&data(&[Timeframe::Hour4], &closes));

    assert_eq!(report.signals.len(), 1);
    assert_eq!(report.signals[0].entry_price, 80.0001);

    let trade = &report.trades[0];
    assert_eq!(trade.exit_reason, ExitReason::Target);
    assert_eq!(trade.exit_price, report.signals[0].target());
    assert!(trade.is_win());
    assert_eq!(report.metrics.winning_trades, 1);
}

/// Fires a LONG with a one-point stop and two-point target on candles
/// flagged by volume.
struct Flagged;

impl Predictor for Flagged {
    fn name(&self) -> &str {
        "flagged"
    }

    fn warmup_period(&self) -> usize {
        1
    }

    fn predict(&self, series: &CandleSeries) -> Option<Signal> {
        let last = series.last()?;
        (last.volume == 777.0).then(|| {
            Signal::new(&series.symbol, SignalType::Long, last.close, 0.8, last.timestamp, series.timeframe)
                .with_levels(last.close - 1.0, last.close + 2.0)
        })
    }
}

#[test]
fn test_each_signal_sized_from_previous_balance() {
    let telemetry = Telemetry::disabled();
    let tf = Timeframe::Hour1;
    let candles: Vec<Candle> = (0..40)
        .map(|i| {
            let high = if i == 11 { 102.5 } else { 100.5 };
            let volume = if i == 10 || i == 20 { 777.0 } else { 1.0 };
            Candle::new(i * tf.as_secs(), 100.0, high, 99.5, 100.0, volume)
        })
        .collect();
    let mut data = MultiTimeframeData::new("BTC/USDT");
    data.insert(CandleSeries::from_candles("BTC/USDT", tf, candles).unwrap());

    let config = SignalEngineConfig {
        timeframes: vec![tf],
        ..Default::default()
    };
    let engine = SignalEngine::new(config, Box::new(Flagged), telemetry.clone()).unwrap();
    let report = backtester(engine, BacktestMode::WalkForward, &telemetry).run(&data);

    assert_eq!(report.trades.len(), 2);

    let first = &report.trades[0];
    assert_eq!(first.position_size, dec!(200));
    assert_eq!(first.exit_reason, ExitReason::Target);
    // 2 * 200 - (100 + 102) * 200 * 0.0015
    assert_eq!(first.net_pnl, dec!(339.4));

    // Sized from 10339.4, not from the initial 10000.
    let second = &report.trades[1];
    assert_eq!(second.position_size, dec!(206.788));
    assert_eq!(second.exit_reason, ExitReason::WindowClose);

    assert_eq!(
        report.metrics.final_equity,
        dec!(10000) + first.net_pnl + second.net_pnl
    );
}
