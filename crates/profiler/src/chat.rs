//! Chat context builder — pure templating over the persisted profile
//!
//! No further derivation happens here: the context, prompt, and rule-based
//! fallback read profile fields verbatim and format them for either the LLM
//! or a canned first-person answer.

use serde::Serialize;

use crate::types::{BehavioralProfile, ProfileFeatures, SurveyResponses, TradeAction, TradeRecord};

/// How many recent trades are quoted back into the prompt
const RECENT_TRADES: usize = 5;

/// Trader information assembled for one chat turn
#[derive(Debug, Clone, Serialize)]
pub struct TraderContext {
    pub persona: String,
    pub trading_style: String,
    pub risk_appetite: String,
    pub win_rate: f64,
    pub preferred_tokens: Vec<String>,
    pub common_strategies: Vec<String>,
    pub loss_reaction: String,
    pub recent_trades: Vec<TradeRecord>,
    pub total_trades: usize,
    pub holding_period: String,
    pub volatility_preference: String,
}

/// Build the chat context from the persisted profile and raw history.
pub fn build_trader_context(
    profile: &BehavioralProfile,
    trade_history: &[TradeRecord],
    survey: &SurveyResponses,
) -> TraderContext {
    let features = &profile.profile_features;
    let recent_start = trade_history.len().saturating_sub(RECENT_TRADES);

    TraderContext {
        persona: profile.derived_features.persona_label.clone(),
        trading_style: features.style.label().to_string(),
        risk_appetite: features.risk_appetite.label().to_string(),
        win_rate: features.win_rate,
        preferred_tokens: features.preferred_tokens.clone(),
        common_strategies: features.common_strategies.clone(),
        loss_reaction: survey.loss_reaction.clone(),
        recent_trades: trade_history[recent_start..].to_vec(),
        total_trades: trade_history.len(),
        holding_period: features.holding_period.label().to_string(),
        volatility_preference: features.volatility_preference.clone(),
    }
}

/// Render the first-person roleplay prompt for the LLM.
pub fn create_prompt(user_message: &str, context: &TraderContext) -> String {
    format!(
        "\
You are a cryptocurrency trader with a distinct personality.
Respond to questions as if you are this trader talking about your own trading experience and decisions.

Your Profile:
- You are a {persona}
- Your primary trading style is {style}
- Your risk appetite is {risk}
- You prefer {holding} trading
- Your win rate is {win_rate:.1}%
- You have made {total} trades total
- Your preferred tokens are: {tokens}
- Your common strategies include: {strategies}

Your Trading Philosophy:
- When you face losses: {loss_reaction}
- You prefer {volatility} market conditions

Some of your recent trades:
{recent}

User Question: {message}

Respond as the trader in first person, being conversational and specific about your trading decisions and philosophy.
Reference your actual trades when relevant. Keep the response under 150 words and maintain your trader personality.
",
        persona = context.persona,
        style = context.trading_style,
        risk = context.risk_appetite,
        holding = context.holding_period.to_lowercase(),
        win_rate = context.win_rate * 100.0,
        total = context.total_trades,
        tokens = context.preferred_tokens.join(", "),
        strategies = context.common_strategies.join(", "),
        loss_reaction = context.loss_reaction,
        volatility = context.volatility_preference,
        recent = format_recent_trades(&context.recent_trades),
        message = user_message,
    )
}

/// One line per trade for the prompt body
pub fn format_recent_trades(trades: &[TradeRecord]) -> String {
    if trades.is_empty() {
        return "No recent trades to reference.".to_string();
    }

    trades
        .iter()
        .map(|t| {
            format!(
                "- {} {} at ${:.2} - {}",
                t.action.map(action_label).unwrap_or("Unknown"),
                t.asset.as_deref().unwrap_or("Unknown"),
                t.price.unwrap_or(0.0),
                t.outcome.as_deref().unwrap_or("Unknown"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn action_label(action: TradeAction) -> &'static str {
    match action {
        TradeAction::Buy => "Buy",
        TradeAction::Sell => "Sell",
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Rule-based response for when the LLM is unreachable: keyword-route the
/// question and answer from the profile in the trader's voice.
pub fn fallback_response(
    user_message: &str,
    features: &ProfileFeatures,
    trade_history: &[TradeRecord],
) -> String {
    let message = user_message.to_lowercase();
    let last_ten_start = trade_history.len().saturating_sub(10);
    let recent = &trade_history[last_ten_start..];

    if contains_any(&message, &["strategy", "approach", "method"]) {
        let strategies: Vec<&str> = features
            .common_strategies
            .iter()
            .take(2)
            .map(String::as_str)
            .collect();
        format!(
            "My primary trading style is {}. I typically use {} as my main strategies. \
             I've found this approach works well with my {} risk tolerance.",
            features.style.label(),
            strategies.join(", "),
            features.risk_appetite.label().to_lowercase(),
        )
    } else if contains_any(&message, &["loss", "losses", "losing"]) {
        format!(
            "When I face losses, I tend to be {}. It's part of trading - I've learned that \
             managing losses is just as important as capturing gains. My current win rate is {:.1}%.",
            features.response_to_loss,
            features.win_rate * 100.0,
        )
    } else if contains_any(&message, &["token", "coin", "crypto", "prefer"]) {
        let preferred: Vec<&str> = features
            .preferred_tokens
            .iter()
            .take(3)
            .map(String::as_str)
            .collect();
        format!(
            "I tend to focus on {} based on my trading history. These tokens align well with \
             my {} approach and {} market preference.",
            preferred.join(", "),
            features.style.label().to_lowercase(),
            features.volatility_preference,
        )
    } else if contains_any(&message, &["buy", "bought", "purchase"]) {
        match recent.iter().rev().find(|t| t.action == Some(TradeAction::Buy)) {
            Some(trade) => format!(
                "One of my recent buys was {} at ${:.2}. I entered because of {} - it turned \
                 out to be a {}.",
                trade.asset.as_deref().unwrap_or("Unknown"),
                trade.price.unwrap_or(0.0),
                trade.tags.first().map(String::as_str).unwrap_or("market conditions"),
                trade
                    .outcome
                    .as_deref()
                    .unwrap_or("learning experience")
                    .to_lowercase(),
            ),
            None => "I look for good entry points based on my technical analysis and market \
                     sentiment alignment."
                .to_string(),
        }
    } else if contains_any(&message, &["sell", "sold", "exit"]) {
        match recent.iter().rev().find(|t| t.action == Some(TradeAction::Sell)) {
            Some(trade) => format!(
                "Recently sold {} at ${:.2}. My exit was driven by {} - ended up being a {}.",
                trade.asset.as_deref().unwrap_or("Unknown"),
                trade.price.unwrap_or(0.0),
                trade.tags.first().map(String::as_str).unwrap_or("profit taking"),
                trade.outcome.as_deref().unwrap_or("neutral").to_lowercase(),
            ),
            None => "I typically exit positions based on my predetermined targets or when \
                     market conditions change."
                .to_string(),
        }
    } else if contains_any(&message, &["risk", "risky", "safe"]) {
        format!(
            "I'd describe myself as having a {} risk appetite. I use {} diversification and \
             typically hold positions for {} periods.",
            features.risk_appetite.label().to_lowercase(),
            features.portfolio_diversification.label().to_lowercase(),
            features.holding_period.label().to_lowercase(),
        )
    } else {
        format!(
            "As a systematic trader, I focus on consistent execution of my strategy. I've made {} trades \
             with a {:.1}% success rate. What specific aspect of my trading would you like to \
             know more about?",
            trade_history.len(),
            features.win_rate * 100.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::analyze_behavior;
    use crate::types::{DerivedMetrics, RiskAppetite};

    fn sample_profile() -> BehavioralProfile {
        let metrics = DerivedMetrics {
            win_rate: 0.7,
            risk_appetite: RiskAppetite::High,
            preferred_tokens: vec!["BTC".into(), "ETH".into()],
            common_strategies: vec!["breakout".into(), "news pop".into()],
            trade_frequency: 10,
            ..Default::default()
        };
        let survey = SurveyResponses {
            primary_strategy: "Momentum".into(),
            loss_reaction: "I cut fast".into(),
            risk_tolerance: "High".into(),
        };
        analyze_behavior(&metrics, &survey)
    }

    fn buy_trade(asset: &str, price: f64, tag: &str, outcome: &str) -> TradeRecord {
        TradeRecord {
            asset: Some(asset.into()),
            action: Some(TradeAction::Buy),
            price: Some(price),
            tags: vec![tag.into()],
            outcome: Some(outcome.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_context_takes_last_five_trades() {
        let profile = sample_profile();
        let history: Vec<TradeRecord> = (0..8)
            .map(|i| buy_trade(&format!("T{i}"), 1.0, "tag", "Profit"))
            .collect();
        let survey = SurveyResponses::default();

        let ctx = build_trader_context(&profile, &history, &survey);
        assert_eq!(ctx.recent_trades.len(), 5);
        assert_eq!(ctx.recent_trades[0].asset.as_deref(), Some("T3"));
        assert_eq!(ctx.total_trades, 8);
    }

    #[test]
    fn test_prompt_mentions_profile_fields() {
        let profile = sample_profile();
        let ctx = build_trader_context(&profile, &[], &SurveyResponses::default());
        let prompt = create_prompt("What do you trade?", &ctx);

        assert!(prompt.contains(&profile.derived_features.persona_label));
        assert!(prompt.contains("Your win rate is 70.0%"));
        assert!(prompt.contains("No recent trades to reference."));
        assert!(prompt.contains("User Question: What do you trade?"));
    }

    #[test]
    fn test_fallback_strategy_question() {
        let profile = sample_profile();
        let answer = fallback_response("What's your approach?", &profile.profile_features, &[]);
        assert!(answer.contains("breakout, news pop"));
    }

    #[test]
    fn test_fallback_buy_question_uses_most_recent_buy() {
        let profile = sample_profile();
        let history = vec![
            buy_trade("BTC", 40000.0, "breakout", "Profit"),
            buy_trade("ETH", 2200.0, "dip buy", "Loss"),
        ];
        let answer = fallback_response("what did you buy?", &profile.profile_features, &history);
        assert!(answer.contains("ETH"));
        assert!(answer.contains("dip buy"));
        assert!(answer.contains("loss"));
    }

    #[test]
    fn test_fallback_generic_question() {
        let profile = sample_profile();
        let answer = fallback_response("hello there", &profile.profile_features, &[]);
        assert!(answer.contains("0 trades"));
        assert!(answer.contains("70.0%"));
    }

    #[test]
    fn test_fallback_loss_question() {
        let profile = sample_profile();
        let answer = fallback_response(
            "how do you handle losing trades?",
            &profile.profile_features,
            &[],
        );
        assert!(answer.contains("risk-averse"));
    }
}
