//! Metrics Extractor — derive quantitative/categorical metrics from raw trades
//!
//! Pure, single-pass, and order-insensitive except for the first-seen token
//! and strategy lists. Malformed fields are excluded from the relevant
//! aggregate; the extractor never fails for a non-empty trade set.

use tracing::debug;

use crate::stats::{mean, round2, round3, FrequencyCounter};
use crate::types::{DerivedMetrics, Diversification, HoldingPeriod, RiskAppetite, TradeRecord};

/// True when an optional field is present, non-empty, and not the literal
/// "None" sentinel that spreadsheets use for blank cells
fn is_meaningful(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !v.is_empty() && v != "None")
}

/// Compute derived metrics for an ordered trade history.
///
/// Returns `None` for an empty history; consumers substitute
/// [`DerivedMetrics::default`] downstream.
pub fn compute_metrics(trades: &[TradeRecord]) -> Option<DerivedMetrics> {
    if trades.is_empty() {
        return None;
    }

    let total_trades = trades.len();
    let profitable = trades
        .iter()
        .filter(|t| t.outcome.as_deref() == Some("Profit"))
        .count();
    let win_rate = profitable as f64 / total_trades as f64;

    // Asset and entry-reason frequency, preserving first-seen order
    let mut assets = FrequencyCounter::new();
    for asset in trades.iter().filter_map(|t| t.asset.as_deref()) {
        if !asset.is_empty() {
            assets.record(asset);
        }
    }
    let mut strategies = FrequencyCounter::new();
    for reason in trades.iter().filter_map(|t| t.entry_reason.as_deref()) {
        if !reason.is_empty() {
            strategies.record(reason);
        }
    }

    // Trade sizes: only values present and positive enter the aggregates
    let trade_values: Vec<f64> = trades
        .iter()
        .filter_map(|t| t.trade_value)
        .filter(|v| *v > 0.0)
        .collect();
    let avg_trade_size = mean(&trade_values).unwrap_or(0.0);
    let max_trade_size = trade_values.iter().cloned().fold(0.0_f64, f64::max);

    // Holding time: a recorded 0-day duration still counts toward the mean
    let durations: Vec<f64> = trades
        .iter()
        .filter_map(|t| t.trade_duration)
        .map(|d| d as f64)
        .collect();
    let avg_holding_time = mean(&durations).unwrap_or(0.0);

    // Sentiment alignment over trades that recorded a market condition
    let conditions = trades
        .iter()
        .filter(|t| matches!(t.market_condition.as_deref(), Some(c) if !c.is_empty()))
        .count();
    let bullish = trades
        .iter()
        .filter(|t| t.market_condition.as_deref() == Some("Bullish"))
        .count();
    let market_sentiment_alignment = if conditions > 0 {
        bullish as f64 / conditions as f64
    } else {
        0.0
    };

    // Stop-loss discipline inverts into risk appetite
    let stop_loss_trades = trades
        .iter()
        .filter(|t| matches!(t.stop_loss.as_deref(), Some(s) if !s.is_empty()))
        .count();
    let risk_management_score = stop_loss_trades as f64 / total_trades as f64;
    let risk_appetite = RiskAppetite::from_risk_management(risk_management_score);

    let technical_trades = trades
        .iter()
        .filter(|t| is_meaningful(t.indicator_signals_used.as_deref()))
        .count();
    let news_trades = trades
        .iter()
        .filter(|t| is_meaningful(t.news_or_sentiment_reference.as_deref()))
        .count();

    let metrics = DerivedMetrics {
        win_rate: round3(win_rate),
        // Placeholders: would need sequential P&L data
        average_trade_return: 0.0,
        max_drawdown: 0.0,
        avg_holding_time: round2(avg_holding_time),
        trade_frequency: total_trades,
        preferred_tokens: assets.first_keys(3),
        common_strategies: strategies.first_keys(3),
        portfolio_diversification: Diversification::from_unique_assets(assets.unique()),
        risk_appetite,
        holding_period: HoldingPeriod::from_avg_days(avg_holding_time),
        market_sentiment_alignment: round3(market_sentiment_alignment),
        technical_indicator_usage: round3(technical_trades as f64 / total_trades as f64),
        news_sensitivity: round3(news_trades as f64 / total_trades as f64),
        avg_trade_size: round2(avg_trade_size),
        max_trade_size: round2(max_trade_size),
    };

    debug!(
        total_trades,
        win_rate = metrics.win_rate,
        risk_appetite = risk_appetite.label(),
        "Derived metrics computed"
    );

    Some(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(outcome: &str) -> TradeRecord {
        TradeRecord {
            outcome: Some(outcome.to_string()),
            ..Default::default()
        }
    }

    fn full_trade(asset: &str, reason: &str, condition: &str, stop_loss: Option<&str>) -> TradeRecord {
        TradeRecord {
            asset: Some(asset.to_string()),
            entry_reason: Some(reason.to_string()),
            market_condition: Some(condition.to_string()),
            stop_loss: stop_loss.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_history_yields_none() {
        assert!(compute_metrics(&[]).is_none());
    }

    #[test]
    fn test_win_rate_seven_of_ten() {
        let mut trades: Vec<TradeRecord> = (0..7).map(|_| trade("Profit")).collect();
        trades.extend((0..3).map(|_| trade("Loss")));

        let metrics = compute_metrics(&trades).unwrap();
        assert_eq!(metrics.win_rate, 0.7);
        assert_eq!(metrics.trade_frequency, 10);
    }

    #[test]
    fn test_preferred_tokens_first_seen_order() {
        let trades: Vec<TradeRecord> = ["BTC", "ETH", "SOL", "ETH", "ETH", "DOGE"]
            .iter()
            .map(|a| TradeRecord {
                asset: Some(a.to_string()),
                ..Default::default()
            })
            .collect();

        let metrics = compute_metrics(&trades).unwrap();
        // NOT top-3-by-count: first-seen order wins
        assert_eq!(metrics.preferred_tokens, vec!["BTC", "ETH", "SOL"]);
        assert_eq!(
            metrics.portfolio_diversification,
            Diversification::Moderate
        );
    }

    #[test]
    fn test_holding_period_boundaries() {
        assert_eq!(HoldingPeriod::from_avg_days(0.999), HoldingPeriod::Intraday);
        assert_eq!(HoldingPeriod::from_avg_days(1.0), HoldingPeriod::Swing);
        assert_eq!(HoldingPeriod::from_avg_days(6.999), HoldingPeriod::Swing);
        assert_eq!(HoldingPeriod::from_avg_days(7.0), HoldingPeriod::LongTerm);
    }

    #[test]
    fn test_risk_appetite_boundaries() {
        assert_eq!(RiskAppetite::from_risk_management(0.71), RiskAppetite::Low);
        assert_eq!(RiskAppetite::from_risk_management(0.7), RiskAppetite::Medium);
        assert_eq!(RiskAppetite::from_risk_management(0.41), RiskAppetite::Medium);
        assert_eq!(RiskAppetite::from_risk_management(0.4), RiskAppetite::High);
    }

    #[test]
    fn test_trade_size_excludes_missing_and_zero() {
        let trades = vec![
            TradeRecord {
                trade_value: Some(100.0),
                ..Default::default()
            },
            TradeRecord {
                trade_value: Some(0.0),
                ..Default::default()
            },
            TradeRecord {
                trade_value: None,
                ..Default::default()
            },
            TradeRecord {
                trade_value: Some(300.0),
                ..Default::default()
            },
        ];

        let metrics = compute_metrics(&trades).unwrap();
        assert_eq!(metrics.avg_trade_size, 200.0);
        assert_eq!(metrics.max_trade_size, 300.0);
    }

    #[test]
    fn test_zero_duration_counts_toward_holding_time() {
        let trades = vec![
            TradeRecord {
                trade_duration: Some(0),
                ..Default::default()
            },
            TradeRecord {
                trade_duration: Some(2),
                ..Default::default()
            },
            TradeRecord {
                trade_duration: None,
                ..Default::default()
            },
        ];

        let metrics = compute_metrics(&trades).unwrap();
        assert_eq!(metrics.avg_holding_time, 1.0);
        assert_eq!(metrics.holding_period, HoldingPeriod::Swing);
    }

    #[test]
    fn test_sentiment_alignment_over_recorded_conditions_only() {
        let trades = vec![
            full_trade("BTC", "breakout", "Bullish", None),
            full_trade("BTC", "breakout", "Bearish", None),
            // No market condition recorded — excluded from the denominator
            TradeRecord::default(),
        ];

        let metrics = compute_metrics(&trades).unwrap();
        assert_eq!(metrics.market_sentiment_alignment, 0.5);
    }

    #[test]
    fn test_stop_loss_discipline_lowers_risk_appetite() {
        let trades: Vec<TradeRecord> = (0..10)
            .map(|i| {
                full_trade(
                    "BTC",
                    "breakout",
                    "Bullish",
                    if i < 8 { Some("0.95") } else { None },
                )
            })
            .collect();

        let metrics = compute_metrics(&trades).unwrap();
        assert_eq!(metrics.risk_appetite, RiskAppetite::Low);
    }

    #[test]
    fn test_indicator_and_news_literal_none_excluded() {
        let trades = vec![
            TradeRecord {
                indicator_signals_used: Some("RSI".into()),
                news_or_sentiment_reference: Some("None".into()),
                ..Default::default()
            },
            TradeRecord {
                indicator_signals_used: Some("None".into()),
                news_or_sentiment_reference: Some("Fed minutes".into()),
                ..Default::default()
            },
        ];

        let metrics = compute_metrics(&trades).unwrap();
        assert_eq!(metrics.technical_indicator_usage, 0.5);
        assert_eq!(metrics.news_sensitivity, 0.5);
    }

    #[test]
    fn test_ratios_stay_in_unit_interval() {
        let trades: Vec<TradeRecord> = (0..20)
            .map(|i| TradeRecord {
                asset: Some(format!("TOKEN{}", i % 9)),
                outcome: Some(if i % 2 == 0 { "Profit" } else { "Loss" }.into()),
                market_condition: Some("Bullish".into()),
                indicator_signals_used: Some("MACD".into()),
                news_or_sentiment_reference: Some("CPI print".into()),
                stop_loss: Some("tight".into()),
                ..Default::default()
            })
            .collect();

        let m = compute_metrics(&trades).unwrap();
        for ratio in [
            m.win_rate,
            m.market_sentiment_alignment,
            m.technical_indicator_usage,
            m.news_sensitivity,
        ] {
            assert!((0.0..=1.0).contains(&ratio));
        }
        assert_eq!(m.portfolio_diversification, Diversification::Broad);
    }
}
