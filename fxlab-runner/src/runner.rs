//! One-genome orchestration: engine run in, `FitnessResult` out.

use fxlab_core::engine::{BacktestRunner, CancelToken, RunError};
use fxlab_core::store::BarStore;
use fxlab_core::strategy::Genome;

use crate::config::RunConfig;
use crate::fitness::{score, FitnessResult};
use crate::metrics::PerformanceMetrics;

/// Run one genome over a preloaded store and score the outcome.
///
/// Fatal errors (bad data, bad genome, cancellation) are returned; the
/// optimizer decides whether to translate them into a worst-fitness
/// placeholder or abort the whole run.
pub fn run_backtest(
    store: &BarStore,
    config: &RunConfig,
    genome: &Genome,
    cancel: CancelToken,
) -> Result<FitnessResult, RunError> {
    let runner = BacktestRunner::new(
        store,
        config.policy.clone(),
        config.costs,
        config.initial_balance,
    )?
    .with_cancel_token(cancel);
    let report = runner.run_genome(genome)?;

    // The curve starts at the initial balance so returns and drawdown are
    // measured from the account's true starting point.
    let mut equity: Vec<f64> = Vec::with_capacity(report.equity_curve.len() + 1);
    equity.push(report.initial_balance);
    equity.extend(report.equity_curve.iter().map(|p| p.equity));

    let metrics = PerformanceMetrics::compute(
        &equity,
        &report.trades,
        report.rejections.len(),
        store.base_timeframe(),
    );
    let fitness = score(&metrics, report.violations);

    Ok(FitnessResult {
        genome: genome.clone(),
        fitness,
        metrics: Some(metrics),
        equity_curve: report.equity_curve,
        trades: report.trades,
        rejections: report.rejections,
        violations: report.violations,
        failed: false,
        config_hash: config.config_hash(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use fxlab_core::domain::{Bar, Timeframe};
    use fxlab_core::store::BarSeries;
    use fxlab_core::strategy::{ParamValue, TemplateId};

    fn store_from(closes: &[f64]) -> BarStore {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
        let mut prev = closes[0];
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open = prev;
                prev = close;
                Bar {
                    timestamp: start + Duration::hours(i as i64),
                    timeframe: Timeframe::H1,
                    open,
                    high: open.max(close) + 0.0005,
                    low: open.min(close) - 0.0005,
                    close,
                    volume: 100.0,
                }
            })
            .collect();
        BarStore::new("EURUSD", BarSeries::new(Timeframe::H1, bars).unwrap())
    }

    fn config() -> RunConfig {
        toml::from_str(r#"instrument = "EURUSD""#).unwrap()
    }

    fn genome() -> Genome {
        Genome {
            template: TemplateId::MaCrossover,
            params: vec![
                ParamValue::Int(2),
                ParamValue::Int(51),
                ParamValue::Int(5),
                ParamValue::Float(2.0),
                ParamValue::Float(1.5),
                ParamValue::Bool(false),
                ParamValue::Int(10),
            ],
        }
    }

    #[test]
    fn scores_a_run_and_carries_the_artifacts() {
        let mut closes = vec![1.1000; 60];
        for i in 0..60 {
            closes.push(1.1000 + 0.0020 * (i + 1) as f64);
        }
        let store = store_from(&closes);
        let result = run_backtest(&store, &config(), &genome(), CancelToken::new()).unwrap();

        assert!(!result.failed);
        assert!(result.fitness > crate::fitness::WORST_FITNESS);
        assert!(!result.trades.is_empty());
        assert_eq!(result.equity_curve.len(), 120);
        assert_eq!(result.config_hash, config().config_hash());
        let metrics = result.metrics.unwrap();
        assert_eq!(metrics.trade_count, result.trades.len());
    }

    #[test]
    fn cancellation_propagates() {
        let store = store_from(&[1.1; 80]);
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(
            run_backtest(&store, &config(), &genome(), cancel),
            Err(RunError::Cancelled)
        ));
    }
}
