//! Trade Agent — conversational trader profiling server
//!
//! Usage:
//!   trade-agent serve --port 8000          — Launch web server with UI
//!   trade-agent profile --csv trades.csv   — Profile a trade history from CLI

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{Html, Json},
    routing::{get, post},
    Form, Router,
};
use clap::{Parser, Subcommand};
use futures_util::{Stream, StreamExt};
use persistence::repository::TraderRepository;
use profiler::{
    analyze_behavior, build_trader_context, compute_metrics, create_prompt, fallback_response,
    parse_trades_csv, BehavioralProfile, DerivedMetrics, OllamaClient, SurveyResponses,
    TradeRecord,
};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

mod pages;

const APP_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH"));

#[derive(Parser)]
#[command(name = "trade-agent")]
#[command(about = "Conversational trade agent with behavioral profiling", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the trade agent web server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value_t = 8000)]
        port: u16,
    },
    /// Profile a trade history CSV from the CLI (no web server, no database)
    Profile {
        /// Path to the trade history CSV
        #[arg(long)]
        csv: String,
        /// Self-reported primary strategy
        #[arg(long, default_value = "Technical")]
        strategy: String,
        /// Free-text answer to "how do you react to losses?"
        #[arg(long, default_value = "")]
        loss_reaction: String,
        /// Self-reported risk tolerance
        #[arg(long, default_value = "Medium")]
        risk_tolerance: String,
    },
}

#[derive(Clone)]
struct AppState {
    db: Arc<persistence::Database>,
    ollama: Arc<OllamaClient>,
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug,profiler=debug,trade_agent=debug")
    } else {
        EnvFilter::new("info,profiler=info,trade_agent=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Serve { host, port } => {
            cmd_serve(&host, port).await?;
        }
        Commands::Profile {
            csv,
            strategy,
            loss_reaction,
            risk_tolerance,
        } => {
            cmd_profile(&csv, strategy, loss_reaction, risk_tolerance)?;
        }
    }

    Ok(())
}

// ============================================================================
// Serve command — Axum web server
// ============================================================================

async fn cmd_serve(host: &str, port: u16) -> anyhow::Result<()> {
    info!("Trade Agent v{} starting...", APP_VERSION);

    let db_path =
        std::env::var("TRADE_AGENT_DB_PATH").unwrap_or_else(|_| "data/trade_agent.db".to_string());
    let db = persistence::Database::new(&db_path).await.map_err(|e| {
        error!("Failed to initialize database: {}", e);
        anyhow::anyhow!("Database initialization failed: {}", e)
    })?;
    info!("Database initialized: {}", db_path);

    let state = AppState {
        db: Arc::new(db),
        ollama: Arc::new(OllamaClient::from_env()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(page_home))
        .route("/new_user", get(page_new_user))
        .route("/login", get(page_login))
        .route("/register", post(handle_register))
        .route("/authenticate", post(handle_authenticate))
        .route("/chat/:trader_id", get(page_chat))
        .route("/chat/:trader_id/message", post(handle_chat_message))
        .route("/api/health", get(api_health))
        .with_state(state)
        .layer(cors);

    let addr: std::net::SocketAddr = format!("{}:{}", host, port).parse()?;
    println!("\n=== Trade Agent v{} ===", APP_VERSION);
    println!("Conversational Trade Agent Server");
    println!("Listening on http://{}", addr);
    println!("\nEndpoints:");
    println!("  GET  /                        - Landing page");
    println!("  GET  /new_user                - Registration form");
    println!("  GET  /login                   - Login form");
    println!("  POST /register                - Register (CSV upload + survey)");
    println!("  POST /authenticate            - Login");
    println!("  GET  /chat/:trader_id         - Chat UI");
    println!("  POST /chat/:trader_id/message - Streaming chat (SSE)");
    println!("  GET  /api/health              - Health check");
    println!("\n  Database: {}", db_path);
    println!("\nPress Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Page handlers
// ============================================================================

async fn page_home() -> Html<&'static str> {
    Html(pages::HOME)
}

async fn page_new_user() -> Html<&'static str> {
    Html(pages::NEW_USER)
}

async fn page_login() -> Html<&'static str> {
    Html(pages::LOGIN)
}

async fn page_chat(Path(trader_id): Path<String>) -> Html<String> {
    Html(pages::chat(&trader_id))
}

// ============================================================================
// Registration and login
// ============================================================================

/// POST /register — multipart form: credentials, CSV upload, survey answers.
/// Runs the full profiling pipeline and persists every stage.
async fn handle_register(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Html<String>, (StatusCode, String)> {
    let mut username = String::new();
    let mut password = String::new();
    let mut csv_data = String::new();
    let mut survey = SurveyResponses {
        primary_strategy: "Technical".to_string(),
        loss_reaction: String::new(),
        risk_tolerance: "Medium".to_string(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Malformed form data: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let value = field
            .text()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("Malformed form field: {}", e)))?;
        match name.as_str() {
            "username" => username = value,
            "password" => password = value,
            "trade_file" => csv_data = value,
            "primary_strategy" => survey.primary_strategy = value,
            "loss_reaction" => survey.loss_reaction = value,
            "risk_tolerance" => survey.risk_tolerance = value,
            _ => {}
        }
    }

    if username.is_empty() || password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Username and password are required".to_string(),
        ));
    }

    let trades = parse_trades_csv(&csv_data)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid CSV upload: {}", e)))?;

    let history_json = serde_json::to_string(&trades).map_err(internal)?;
    let survey_json = serde_json::to_string(&survey).map_err(internal)?;

    let repo = TraderRepository::new(state.db.pool());
    let trader_id = repo
        .create_trader(&username, &password, &history_json, &survey_json)
        .await
        .map_err(|e| {
            warn!(username = %username, error = %e, "Registration rejected");
            (
                StatusCode::CONFLICT,
                format!("Registration failed: {}", e),
            )
        })?;

    // Metrics extraction, then behavioral scoring on top
    let metrics = compute_metrics(&trades);
    let metrics_json = match &metrics {
        Some(m) => Some(serde_json::to_string(m).map_err(internal)?),
        None => None,
    };
    repo.save_metrics(&trader_id, metrics_json.as_deref())
        .await
        .map_err(internal)?;

    let profile = analyze_behavior(&metrics.unwrap_or_default(), &survey);
    let profile_json = serde_json::to_string(&profile).map_err(internal)?;
    repo.save_profile(&trader_id, &profile_json)
        .await
        .map_err(internal)?;

    info!(
        trader_id = %trader_id,
        trades = trades.len(),
        persona = %profile.derived_features.persona_label,
        "Trader profiled and registered"
    );

    Ok(Html(pages::register_success(trades.len(), &trader_id)))
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

/// POST /authenticate — form login
async fn handle_authenticate(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Html<String>, (StatusCode, String)> {
    let repo = TraderRepository::new(state.db.pool());
    match repo
        .authenticate(&form.username, &form.password)
        .await
        .map_err(internal)?
    {
        Some(user) => {
            info!(username = %user.username, "Login successful");
            Ok(Html(pages::welcome_back(&user.username, &user.trader_id)))
        }
        None => Err((
            StatusCode::UNAUTHORIZED,
            "Invalid username or password".to_string(),
        )),
    }
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

// ============================================================================
// Chat — SSE streaming
// ============================================================================

#[derive(Deserialize)]
struct ChatMessage {
    message: String,
}

/// POST /chat/:trader_id/message — streams the reply as `data:` events.
/// Each event is `{"token": ...}`, terminated by `{"done": true}`.
async fn handle_chat_message(
    State(state): State<AppState>,
    Path(trader_id): Path<String>,
    Json(body): Json<ChatMessage>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Event>(32);
    tokio::spawn(async move {
        stream_reply(state, trader_id, body.message, tx).await;
    });
    Sse::new(ReceiverStream::new(rx).map(Ok::<_, Infallible>)).keep_alive(KeepAlive::default())
}

async fn stream_reply(
    state: AppState,
    trader_id: String,
    message: String,
    tx: mpsc::Sender<Event>,
) {
    let repo = TraderRepository::new(state.db.pool());
    let record = match repo.get_trader(&trader_id).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            send_token(&tx, "Sorry, I could not find your trader profile.").await;
            send_done(&tx).await;
            return;
        }
        Err(e) => {
            error!(trader_id = %trader_id, error = %e, "Failed to load trader");
            send_token(&tx, "Sorry, something went wrong loading your profile.").await;
            send_done(&tx).await;
            return;
        }
    };

    let trades: Vec<TradeRecord> =
        serde_json::from_str(&record.trade_history).unwrap_or_default();
    let survey: SurveyResponses =
        serde_json::from_str(&record.survey_responses).unwrap_or_default();

    // A trader registered before profiling completed gets the default profile
    let profile: BehavioralProfile = record
        .behavioral_profile
        .as_deref()
        .and_then(|json| serde_json::from_str(json).ok())
        .unwrap_or_else(|| analyze_behavior(&DerivedMetrics::default(), &survey));

    let context = build_trader_context(&profile, &trades, &survey);
    let prompt = create_prompt(&message, &context);

    match state.ollama.generate_stream(&prompt).await {
        Ok(mut tokens) => {
            let mut interrupted = false;
            while let Some(item) = tokens.recv().await {
                match item {
                    Ok(token) => {
                        if !send_token(&tx, &token).await {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "LLM stream interrupted, using fallback");
                        interrupted = true;
                        break;
                    }
                }
            }
            if interrupted {
                stream_fallback(&tx, &message, &profile, &trades).await;
            }
        }
        Err(e) => {
            warn!(error = %e, "LLM unavailable, using rule-based fallback");
            stream_fallback(&tx, &message, &profile, &trades).await;
        }
    }

    send_done(&tx).await;
}

/// Word-by-word streaming of the rule-based reply
async fn stream_fallback(
    tx: &mpsc::Sender<Event>,
    message: &str,
    profile: &BehavioralProfile,
    trades: &[TradeRecord],
) {
    let reply = fallback_response(message, &profile.profile_features, trades);
    for word in reply.split_whitespace() {
        if !send_token(tx, &format!("{} ", word)).await {
            return;
        }
    }
}

async fn send_token(tx: &mpsc::Sender<Event>, token: &str) -> bool {
    let event = Event::default().data(serde_json::json!({ "token": token }).to_string());
    tx.send(event).await.is_ok()
}

async fn send_done(tx: &mpsc::Sender<Event>) {
    let event = Event::default().data(serde_json::json!({ "done": true }).to_string());
    let _ = tx.send(event).await;
}

// ============================================================================
// Health check
// ============================================================================

/// GET /api/health
async fn api_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "trade-agent",
        "version": APP_VERSION,
    }))
}

// ============================================================================
// Profile command — CLI mode (no web server)
// ============================================================================

fn cmd_profile(
    csv_path: &str,
    strategy: String,
    loss_reaction: String,
    risk_tolerance: String,
) -> anyhow::Result<()> {
    println!("\n=== Trade Agent v{} ===", APP_VERSION);

    let data = std::fs::read_to_string(csv_path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", csv_path, e))?;
    let trades = parse_trades_csv(&data)?;
    println!("Parsed {} trades from {}", trades.len(), csv_path);

    let survey = SurveyResponses {
        primary_strategy: strategy,
        loss_reaction,
        risk_tolerance,
    };

    let Some(metrics) = compute_metrics(&trades) else {
        println!("No trades found, nothing to profile.");
        return Ok(());
    };
    let profile = analyze_behavior(&metrics, &survey);

    println!("\nPersona: {}", profile.derived_features.persona_label);
    println!(
        "Win rate: {:.1}% over {} trades",
        metrics.win_rate * 100.0,
        metrics.trade_frequency
    );
    println!(
        "Preferred tokens: {}",
        profile.profile_features.preferred_tokens.join(", ")
    );
    println!(
        "Common strategies: {}",
        profile.profile_features.common_strategies.join(", ")
    );

    let report = serde_json::json!({
        "derived_metrics": metrics,
        "behavioral_profile": profile,
    });
    println!("\n{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
