//! Types for the trader profiling pipeline

use serde::{Deserialize, Serialize};

/// A single logged transaction, created once at ingestion and immutable after.
///
/// Every field except `tags` is optional: uploads come from heterogeneous
/// spreadsheets and the pipeline degrades to defaults rather than rejecting
/// rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeRecord {
    pub trade_id: Option<String>,
    pub asset: Option<String>,
    pub action: Option<TradeAction>,
    pub price: Option<f64>,
    pub volume: Option<f64>,
    pub trade_value: Option<f64>,
    pub date: Option<String>,
    /// "Profit", "Loss", or any free-form outcome string
    pub outcome: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Holding duration in whole days
    pub trade_duration: Option<i64>,
    pub capital_used: Option<f64>,
    /// Presence flag: any non-empty value counts as stop-loss discipline
    pub stop_loss: Option<String>,
    pub take_profit: Option<String>,
    /// Free-form entry reason, used as a strategy bucket key
    pub entry_reason: Option<String>,
    pub exit_reason: Option<String>,
    /// "Bullish", "Bearish", "Neutral", ...
    pub market_condition: Option<String>,
    /// Indicator names, or the literal string "None"
    pub indicator_signals_used: Option<String>,
    /// News/sentiment source, or the literal string "None"
    pub news_or_sentiment_reference: Option<String>,
    pub trading_platform: Option<String>,
    pub trade_type: Option<String>,
    pub time_of_trade: Option<String>,
    pub day_of_week: Option<String>,
}

/// Side of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeAction {
    Buy,
    Sell,
}

/// Free-text survey answers collected at registration.
///
/// `risk_tolerance` is stored verbatim but never read by the scorer: risk
/// appetite is recomputed from stop-loss usage in the trade history, so
/// behavioral evidence overrides self-report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveyResponses {
    pub primary_strategy: String,
    pub loss_reaction: String,
    pub risk_tolerance: String,
}

/// Risk appetite inferred from stop-loss usage frequency.
///
/// The mapping is inverted relative to discipline: frequent stop-loss usage
/// signals a LOW appetite for risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum RiskAppetite {
    Low,
    Medium,
    High,
}

/// Unknown stored strings fall back to the middle bucket
impl From<String> for RiskAppetite {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Low" => Self::Low,
            "High" => Self::High,
            _ => Self::Medium,
        }
    }
}

impl RiskAppetite {
    /// Classify from the stop-loss usage ratio (stop-loss trades / total)
    pub fn from_risk_management(score: f64) -> Self {
        if score > 0.7 {
            Self::Low
        } else if score > 0.4 {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

/// Categorical bucket of average trade duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum HoldingPeriod {
    Intraday,
    Swing,
    #[serde(rename = "Long-term")]
    LongTerm,
}

impl From<String> for HoldingPeriod {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Intraday" => Self::Intraday,
            "Long-term" => Self::LongTerm,
            _ => Self::Swing,
        }
    }
}

impl HoldingPeriod {
    /// Bucket an average holding time in days. Ties at exactly 1 and 7 fall
    /// into the higher bucket.
    pub fn from_avg_days(avg_days: f64) -> Self {
        if avg_days < 1.0 {
            Self::Intraday
        } else if avg_days < 7.0 {
            Self::Swing
        } else {
            Self::LongTerm
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Intraday => "Intraday",
            Self::Swing => "Swing",
            Self::LongTerm => "Long-term",
        }
    }
}

/// How spread out the traded assets are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Diversification {
    Concentrated,
    Moderate,
    Broad,
}

impl From<String> for Diversification {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Concentrated" => Self::Concentrated,
            "Broad" => Self::Broad,
            _ => Self::Moderate,
        }
    }
}

impl Diversification {
    /// Classify from the number of distinct assets traded
    pub fn from_unique_assets(count: usize) -> Self {
        if count < 3 {
            Self::Concentrated
        } else if count < 8 {
            Self::Moderate
        } else {
            Self::Broad
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Concentrated => "Concentrated",
            Self::Moderate => "Moderate",
            Self::Broad => "Broad",
        }
    }
}

/// Dominant trading style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum TradingStyle {
    Sentiment,
    Technical,
    Momentum,
    Value,
}

impl From<String> for TradingStyle {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Sentiment" => Self::Sentiment,
            "Momentum" => Self::Momentum,
            "Value" => Self::Value,
            _ => Self::Technical,
        }
    }
}

impl TradingStyle {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sentiment => "Sentiment",
            Self::Technical => "Technical",
            Self::Momentum => "Momentum",
            Self::Value => "Value",
        }
    }
}

/// Derived quantitative/categorical metrics for one trader.
///
/// Ratios are quotients clamped to [0,1] by construction and rounded to 3
/// decimal places; holding time and trade sizes are rounded to 2.
/// `average_trade_return` and `max_drawdown` are placeholders held at 0 —
/// computing them would need sequential P&L data the upload does not carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub win_rate: f64,
    pub average_trade_return: f64,
    pub max_drawdown: f64,
    pub avg_holding_time: f64,
    /// Total trade count over the dataset period
    pub trade_frequency: usize,
    /// First 3 distinct assets in first-seen order (see metrics module)
    pub preferred_tokens: Vec<String>,
    /// First 3 distinct entry reasons in first-seen order
    pub common_strategies: Vec<String>,
    pub portfolio_diversification: Diversification,
    pub risk_appetite: RiskAppetite,
    pub holding_period: HoldingPeriod,
    pub market_sentiment_alignment: f64,
    pub technical_indicator_usage: f64,
    pub news_sensitivity: f64,
    pub avg_trade_size: f64,
    pub max_trade_size: f64,
}

impl Default for DerivedMetrics {
    /// The documented fallbacks consumers substitute when no metrics were
    /// computed: Medium risk, Swing holding, Moderate diversification, and a
    /// neutral 0.5 sentiment alignment.
    fn default() -> Self {
        Self {
            win_rate: 0.0,
            average_trade_return: 0.0,
            max_drawdown: 0.0,
            avg_holding_time: 0.0,
            trade_frequency: 0,
            preferred_tokens: Vec::new(),
            common_strategies: Vec::new(),
            portfolio_diversification: Diversification::Moderate,
            risk_appetite: RiskAppetite::Medium,
            holding_period: HoldingPeriod::Swing,
            market_sentiment_alignment: 0.5,
            technical_indicator_usage: 0.0,
            news_sensitivity: 0.0,
            avg_trade_size: 0.0,
            max_trade_size: 0.0,
        }
    }
}

/// The six behavioral scores.
///
/// `trend_follower_score + contrarian_score == 1` exactly: the contrarian
/// score is computed as the complement, never independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehavioralScores {
    pub strategy_consistency_score: f64,
    pub behavioral_volatility_score: f64,
    pub adaptability_score: f64,
    pub confidence_bias_score: f64,
    pub trend_follower_score: f64,
    pub contrarian_score: f64,
}

/// Categorical response-pattern classifications from survey text + metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsePatterns {
    pub loss_response: String,
    pub profit_response: String,
    pub influencer_dependency: String,
}

/// Profile features: derived metrics merged with response patterns and style
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileFeatures {
    pub style: TradingStyle,
    pub risk_appetite: RiskAppetite,
    pub holding_period: HoldingPeriod,
    pub preferred_tokens: Vec<String>,
    pub common_strategies: Vec<String>,
    pub portfolio_diversification: Diversification,
    pub capital_allocation_pattern: String,
    pub win_rate: f64,
    pub average_trade_return: f64,
    pub max_drawdown: f64,
    pub avg_holding_time: f64,
    pub trade_frequency: usize,
    pub active_hours: String,
    pub market_sentiment_alignment: f64,
    pub response_to_loss: String,
    pub response_to_profit: String,
    pub technical_indicator_usage: f64,
    pub volatility_preference: String,
    pub news_sensitivity: f64,
    pub influencer_dependency: String,
    pub journal_or_notes_presence: String,
}

/// Persona label plus the six behavioral scores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedFeatures {
    pub persona_label: String,
    pub strategy_consistency_score: f64,
    pub behavioral_volatility_score: f64,
    pub adaptability_score: f64,
    pub confidence_bias_score: f64,
    pub trend_follower_score: f64,
    pub contrarian_score: f64,
}

/// Full behavioral profile persisted per trader, produced once at
/// registration and never incrementally updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehavioralProfile {
    pub profile_features: ProfileFeatures,
    pub derived_features: DerivedFeatures,
}
