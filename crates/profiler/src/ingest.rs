//! CSV ingestion — parse an uploaded trade-history spreadsheet into records
//!
//! Parsing is deliberately lenient: unknown columns are ignored, missing or
//! unparseable numeric cells become `None` (excluded from aggregates later),
//! and empty strings collapse to `None`. Only a structurally unreadable CSV
//! is an error.

use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::info;

use crate::types::{TradeAction, TradeRecord};

/// Column indexes resolved once from the header row
struct ColumnMap(HashMap<String, usize>);

impl ColumnMap {
    fn get<'r>(&self, record: &'r csv::StringRecord, name: &str) -> Option<&'r str> {
        self.0
            .get(name)
            .and_then(|&i| record.get(i))
            .filter(|v| !v.is_empty())
    }

    fn get_string(&self, record: &csv::StringRecord, name: &str) -> Option<String> {
        self.get(record, name).map(str::to_string)
    }

    fn get_f64(&self, record: &csv::StringRecord, name: &str) -> Option<f64> {
        self.get(record, name).and_then(|v| v.trim().parse().ok())
    }

    fn get_i64(&self, record: &csv::StringRecord, name: &str) -> Option<i64> {
        self.get(record, name).and_then(|v| v.trim().parse().ok())
    }
}

/// Parse CSV text into an ordered trade history (order = upload order).
pub fn parse_trades_csv(data: &str) -> Result<Vec<TradeRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(data.as_bytes());

    let columns = ColumnMap(
        reader
            .headers()
            .context("trade CSV has no header row")?
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect(),
    );

    let mut trades = Vec::new();
    for row in reader.records() {
        let record = row.context("unreadable CSV row")?;

        let action = match columns.get(&record, "action") {
            Some("Buy") => Some(TradeAction::Buy),
            Some("Sell") => Some(TradeAction::Sell),
            _ => None,
        };

        let tags = columns
            .get(&record, "tags")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        trades.push(TradeRecord {
            trade_id: columns.get_string(&record, "trade_id"),
            asset: columns.get_string(&record, "asset"),
            action,
            price: columns.get_f64(&record, "price"),
            volume: columns.get_f64(&record, "volume"),
            trade_value: columns.get_f64(&record, "trade_value"),
            date: columns.get_string(&record, "trade_date"),
            outcome: columns.get_string(&record, "trade_outcome"),
            tags,
            trade_duration: columns.get_i64(&record, "trade_duration"),
            capital_used: columns.get_f64(&record, "capital_used"),
            stop_loss: columns.get_string(&record, "stop_loss"),
            take_profit: columns.get_string(&record, "take_profit"),
            entry_reason: columns.get_string(&record, "entry_reason"),
            exit_reason: columns.get_string(&record, "exit_reason"),
            market_condition: columns.get_string(&record, "market_condition"),
            indicator_signals_used: columns.get_string(&record, "indicator_signals_used"),
            news_or_sentiment_reference: columns
                .get_string(&record, "news_or_sentiment_reference"),
            trading_platform: columns.get_string(&record, "trading_platform"),
            trade_type: columns.get_string(&record, "trade_type"),
            time_of_trade: columns.get_string(&record, "time_of_trade"),
            day_of_week: columns.get_string(&record, "day_of_week"),
        });
    }

    info!(count = trades.len(), "Parsed trade history CSV");
    Ok(trades)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_rows() {
        let csv = "\
trade_id,asset,action,price,volume,trade_value,trade_date,trade_outcome,trade_duration,stop_loss,entry_reason,market_condition,tags
T1,BTC,Buy,42000.5,0.1,4200.05,2024-01-02,Profit,3,41000,breakout,Bullish,\"swing, btc\"
T2,ETH,Sell,2200,1.5,3300,2024-01-05,Loss,,,news pop,Bearish,
";
        let trades = parse_trades_csv(csv).unwrap();
        assert_eq!(trades.len(), 2);

        let first = &trades[0];
        assert_eq!(first.asset.as_deref(), Some("BTC"));
        assert_eq!(first.action, Some(TradeAction::Buy));
        assert_eq!(first.trade_value, Some(4200.05));
        assert_eq!(first.trade_duration, Some(3));
        assert_eq!(first.outcome.as_deref(), Some("Profit"));
        assert_eq!(first.tags, vec!["swing", "btc"]);

        let second = &trades[1];
        assert_eq!(second.trade_duration, None);
        assert_eq!(second.stop_loss, None);
        assert!(second.tags.is_empty());
    }

    #[test]
    fn test_unparseable_numbers_become_none() {
        let csv = "\
asset,trade_value,trade_duration,action
BTC,not-a-number,two,Hold
";
        let trades = parse_trades_csv(csv).unwrap();
        assert_eq!(trades[0].trade_value, None);
        assert_eq!(trades[0].trade_duration, None);
        // Unknown action strings are dropped, not errors
        assert_eq!(trades[0].action, None);
    }

    #[test]
    fn test_empty_file_yields_no_trades() {
        let trades = parse_trades_csv("asset,action\n").unwrap();
        assert!(trades.is_empty());
    }

    #[test]
    fn test_missing_columns_are_tolerated() {
        let trades = parse_trades_csv("asset\nBTC\n").unwrap();
        assert_eq!(trades[0].asset.as_deref(), Some("BTC"));
        assert_eq!(trades[0].outcome, None);
    }
}
