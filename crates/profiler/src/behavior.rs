//! Behavioral Scorer — convert derived metrics plus survey text into
//! behavioral scores, a trading style, response patterns, and a persona label
//!
//! Like the extractor, every function here is pure and never fails: unknown
//! categorical values fall through to the final branch of each lookup, and
//! missing metrics are covered by `DerivedMetrics::default()` upstream.

use tracing::debug;

use crate::stats::round3;
use crate::types::{
    BehavioralProfile, BehavioralScores, DerivedFeatures, DerivedMetrics, ProfileFeatures,
    ResponsePatterns, RiskAppetite, SurveyResponses, TradingStyle,
};

const LOSS_CUT_WORDS: [&str; 4] = ["cut", "stop", "exit", "careful"];
const LOSS_REVENGE_WORDS: [&str; 4] = ["double", "more", "revenge", "bigger"];

/// Compute the six behavioral scores from derived metrics.
///
/// The survey is part of the scoring contract but currently unused here: the
/// free-text answers feed style classification and response patterns instead.
pub fn compute_behavioral_scores(
    metrics: &DerivedMetrics,
    _survey: &SurveyResponses,
) -> BehavioralScores {
    // Fewer distinct strategies means higher consistency. Floored at 0 only:
    // an empty strategy list yields 1.2, as the original pipeline computes it.
    let strategy_diversity = metrics.common_strategies.len() as f64;
    let strategy_consistency_score = (1.0 - (strategy_diversity - 1.0) * 0.2).max(0.0);

    let behavioral_volatility_score = match metrics.risk_appetite {
        RiskAppetite::Low => 0.2,
        RiskAppetite::Medium => 0.5,
        RiskAppetite::High => 0.8,
    };

    // Contrarian is the exact complement of trend-following, computed once
    // from the rounded trend score so the pair always sums to 1.
    let trend_follower_score = round3(metrics.market_sentiment_alignment);
    let contrarian_score = 1.0 - trend_follower_score;

    let confidence_bias_score = (metrics.win_rate * 1.2).min(1.0);

    // The raw strategy count (0..=3 from the capped list) enters un-normalized
    // and the result is not clamped.
    let adaptability_score =
        (strategy_diversity * 0.3 + metrics.technical_indicator_usage * 0.7) / 2.0;

    BehavioralScores {
        strategy_consistency_score: round3(strategy_consistency_score),
        behavioral_volatility_score: round3(behavioral_volatility_score),
        adaptability_score: round3(adaptability_score),
        confidence_bias_score: round3(confidence_bias_score),
        trend_follower_score,
        contrarian_score,
    }
}

/// Determine the dominant trading style. Behavioral evidence is checked
/// before the self-reported strategy text at each priority level.
pub fn classify_style(metrics: &DerivedMetrics, survey: &SurveyResponses) -> TradingStyle {
    let primary = survey.primary_strategy.to_lowercase();

    if metrics.news_sensitivity > 0.3 || primary.contains("sentiment") {
        TradingStyle::Sentiment
    } else if metrics.technical_indicator_usage > 0.5 || primary.contains("technical") {
        TradingStyle::Technical
    } else if metrics.market_sentiment_alignment > 0.7 || primary.contains("momentum") {
        TradingStyle::Momentum
    } else {
        TradingStyle::Value
    }
}

/// Build the human-readable persona label:
/// `"{risk}-risk {modifier} {style} trader"`
pub fn build_persona_label(
    metrics: &DerivedMetrics,
    survey: &SurveyResponses,
    scores: &BehavioralScores,
) -> String {
    let modifier = if scores.trend_follower_score > 0.7 {
        "trend-following"
    } else if scores.contrarian_score > 0.7 {
        "contrarian"
    } else if scores.adaptability_score > 0.7 {
        "adaptive"
    } else {
        "systematic"
    };

    format!(
        "{}-risk {} {} trader",
        metrics.risk_appetite.label().to_lowercase(),
        modifier,
        classify_style(metrics, survey).label().to_lowercase()
    )
}

/// Classify loss/profit reactions and influencer dependency.
pub fn classify_response_patterns(
    survey: &SurveyResponses,
    metrics: &DerivedMetrics,
) -> ResponsePatterns {
    let loss_reaction = survey.loss_reaction.to_lowercase();

    // The cut/stop family is checked first when both could match
    let loss_response = if LOSS_CUT_WORDS.iter().any(|w| loss_reaction.contains(w)) {
        "risk-averse"
    } else if LOSS_REVENGE_WORDS.iter().any(|w| loss_reaction.contains(w)) {
        "revenge trades"
    } else {
        "analytical"
    };

    let profit_response = match metrics.risk_appetite {
        RiskAppetite::High => "scaling up",
        RiskAppetite::Low => "taking profits",
        RiskAppetite::Medium => "steady approach",
    };

    let influencer_dependency = if metrics.news_sensitivity > 0.4 {
        "Yes"
    } else {
        "No"
    };

    ResponsePatterns {
        loss_response: loss_response.to_string(),
        profit_response: profit_response.to_string(),
        influencer_dependency: influencer_dependency.to_string(),
    }
}

/// "volatile" only for high-appetite traders who turn positions over fast
pub fn volatility_preference(metrics: &DerivedMetrics) -> &'static str {
    if metrics.risk_appetite == RiskAppetite::High && metrics.avg_holding_time < 2.0 {
        "volatile"
    } else {
        "stable"
    }
}

/// Compose scores, style, persona label, and response patterns into the full
/// behavioral profile persisted alongside the metrics.
pub fn analyze_behavior(metrics: &DerivedMetrics, survey: &SurveyResponses) -> BehavioralProfile {
    let scores = compute_behavioral_scores(metrics, survey);
    let style = classify_style(metrics, survey);
    let persona_label = build_persona_label(metrics, survey, &scores);
    let patterns = classify_response_patterns(survey, metrics);

    let profile_features = ProfileFeatures {
        style,
        risk_appetite: metrics.risk_appetite,
        holding_period: metrics.holding_period,
        preferred_tokens: metrics.preferred_tokens.clone(),
        common_strategies: metrics.common_strategies.clone(),
        portfolio_diversification: metrics.portfolio_diversification,
        capital_allocation_pattern: "Conservative".to_string(),
        win_rate: metrics.win_rate,
        average_trade_return: metrics.average_trade_return,
        max_drawdown: metrics.max_drawdown,
        avg_holding_time: metrics.avg_holding_time,
        trade_frequency: metrics.trade_frequency,
        active_hours: "Market Hours".to_string(),
        market_sentiment_alignment: metrics.market_sentiment_alignment,
        response_to_loss: patterns.loss_response,
        response_to_profit: patterns.profit_response,
        technical_indicator_usage: metrics.technical_indicator_usage,
        volatility_preference: volatility_preference(metrics).to_string(),
        news_sensitivity: metrics.news_sensitivity,
        influencer_dependency: patterns.influencer_dependency,
        journal_or_notes_presence: "No".to_string(),
    };

    let derived_features = DerivedFeatures {
        persona_label: persona_label.clone(),
        strategy_consistency_score: scores.strategy_consistency_score,
        behavioral_volatility_score: scores.behavioral_volatility_score,
        adaptability_score: scores.adaptability_score,
        confidence_bias_score: scores.confidence_bias_score,
        trend_follower_score: scores.trend_follower_score,
        contrarian_score: scores.contrarian_score,
    };

    debug!(persona = %persona_label, "Behavioral analysis complete");

    BehavioralProfile {
        profile_features,
        derived_features,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HoldingPeriod;

    fn survey(primary: &str, loss: &str) -> SurveyResponses {
        SurveyResponses {
            primary_strategy: primary.to_string(),
            loss_reaction: loss.to_string(),
            risk_tolerance: "Medium".to_string(),
        }
    }

    #[test]
    fn test_default_metrics_yield_wellformed_scores() {
        let scores = compute_behavioral_scores(&DerivedMetrics::default(), &survey("", ""));
        assert_eq!(scores.behavioral_volatility_score, 0.5);
        assert_eq!(scores.trend_follower_score, 0.5);
        assert_eq!(scores.contrarian_score, 0.5);
        assert_eq!(scores.confidence_bias_score, 0.0);
    }

    #[test]
    fn test_trend_and_contrarian_sum_to_one_exactly() {
        for alignment in [0.0, 0.1, 0.333, 0.5, 0.667, 0.9, 1.0] {
            let metrics = DerivedMetrics {
                market_sentiment_alignment: alignment,
                ..Default::default()
            };
            let scores = compute_behavioral_scores(&metrics, &survey("", ""));
            assert_eq!(scores.trend_follower_score + scores.contrarian_score, 1.0);
        }
    }

    #[test]
    fn test_confidence_bias_from_win_rate() {
        let metrics = DerivedMetrics {
            win_rate: 0.7,
            ..Default::default()
        };
        let scores = compute_behavioral_scores(&metrics, &survey("", ""));
        assert_eq!(scores.confidence_bias_score, 0.84);

        let metrics = DerivedMetrics {
            win_rate: 0.9,
            ..Default::default()
        };
        let scores = compute_behavioral_scores(&metrics, &survey("", ""));
        assert_eq!(scores.confidence_bias_score, 1.0);
    }

    #[test]
    fn test_strategy_consistency_floors_at_zero() {
        let metrics = DerivedMetrics {
            common_strategies: vec!["a".into(), "b".into(), "c".into()],
            ..Default::default()
        };
        let scores = compute_behavioral_scores(&metrics, &survey("", ""));
        assert_eq!(scores.strategy_consistency_score, 0.6);

        // One strategy: perfect consistency
        let metrics = DerivedMetrics {
            common_strategies: vec!["a".into()],
            ..Default::default()
        };
        let scores = compute_behavioral_scores(&metrics, &survey("", ""));
        assert_eq!(scores.strategy_consistency_score, 1.0);
    }

    #[test]
    fn test_style_priority_order() {
        let metrics = DerivedMetrics {
            news_sensitivity: 0.4,
            technical_indicator_usage: 0.9,
            ..Default::default()
        };
        // News sensitivity outranks technical usage
        assert_eq!(
            classify_style(&metrics, &survey("Technical", "")),
            TradingStyle::Sentiment
        );

        let metrics = DerivedMetrics::default();
        assert_eq!(
            classify_style(&metrics, &survey("I follow MOMENTUM plays", "")),
            TradingStyle::Momentum
        );
        assert_eq!(
            classify_style(&metrics, &survey("buy cheap", "")),
            TradingStyle::Value
        );
    }

    #[test]
    fn test_persona_label_high_risk_trend_following_momentum() {
        let metrics = DerivedMetrics {
            risk_appetite: RiskAppetite::High,
            market_sentiment_alignment: 0.8,
            ..Default::default()
        };
        let survey = survey("Momentum", "");
        let scores = compute_behavioral_scores(&metrics, &survey);
        assert_eq!(scores.trend_follower_score, 0.8);

        let label = build_persona_label(&metrics, &survey, &scores);
        assert_eq!(label, "high-risk trend-following momentum trader");
    }

    #[test]
    fn test_loss_reaction_classification() {
        let metrics = DerivedMetrics::default();
        let patterns =
            classify_response_patterns(&survey("", "I usually cut my losses quickly"), &metrics);
        assert_eq!(patterns.loss_response, "risk-averse");

        let patterns =
            classify_response_patterns(&survey("", "I double down and go bigger"), &metrics);
        assert_eq!(patterns.loss_response, "revenge trades");

        let patterns = classify_response_patterns(&survey("", "I analyze the chart"), &metrics);
        assert_eq!(patterns.loss_response, "analytical");
    }

    #[test]
    fn test_profit_response_and_influencer_dependency() {
        let metrics = DerivedMetrics {
            risk_appetite: RiskAppetite::High,
            news_sensitivity: 0.5,
            ..Default::default()
        };
        let patterns = classify_response_patterns(&survey("", ""), &metrics);
        assert_eq!(patterns.profit_response, "scaling up");
        assert_eq!(patterns.influencer_dependency, "Yes");

        let metrics = DerivedMetrics {
            risk_appetite: RiskAppetite::Low,
            news_sensitivity: 0.4,
            ..Default::default()
        };
        let patterns = classify_response_patterns(&survey("", ""), &metrics);
        assert_eq!(patterns.profit_response, "taking profits");
        assert_eq!(patterns.influencer_dependency, "No");
    }

    #[test]
    fn test_volatility_preference() {
        let metrics = DerivedMetrics {
            risk_appetite: RiskAppetite::High,
            avg_holding_time: 1.5,
            ..Default::default()
        };
        assert_eq!(volatility_preference(&metrics), "volatile");

        let metrics = DerivedMetrics {
            risk_appetite: RiskAppetite::High,
            avg_holding_time: 2.0,
            ..Default::default()
        };
        assert_eq!(volatility_preference(&metrics), "stable");
    }

    #[test]
    fn test_analyze_behavior_merges_profile() {
        let metrics = DerivedMetrics {
            win_rate: 0.6,
            risk_appetite: RiskAppetite::Medium,
            holding_period: HoldingPeriod::Swing,
            preferred_tokens: vec!["BTC".into(), "ETH".into()],
            common_strategies: vec!["breakout".into()],
            technical_indicator_usage: 0.8,
            ..Default::default()
        };
        let profile = analyze_behavior(&metrics, &survey("Technical", "I stop out fast"));

        assert_eq!(profile.profile_features.style, TradingStyle::Technical);
        assert_eq!(profile.profile_features.response_to_loss, "risk-averse");
        assert_eq!(profile.profile_features.capital_allocation_pattern, "Conservative");
        assert_eq!(profile.profile_features.journal_or_notes_presence, "No");
        assert!(profile
            .derived_features
            .persona_label
            .ends_with("technical trader"));
        assert_eq!(
            profile.derived_features.trend_follower_score
                + profile.derived_features.contrarian_score,
            1.0
        );
    }
}
