//! 명령줄 인터페이스
//!
//! 시장가/지정가/TWAP 주문 명령과 대화형 콘솔, 대시보드 서버 구동을 제공

use std::io::Write as IoWrite;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::api::routes;
use crate::config::Config;
use crate::data::feeds::{self, FearGreedSnapshot, HistoricalSummary};
use crate::error::TradingError;
use crate::models::order::{OrderResult, OrderSide, OrderType, TimeInForce};
use crate::models::report::{SliceStatus, TwapReport};
use crate::order_core::manager::OrderManager;
use crate::signals::advisor::{SentimentAdvisor, SentimentSignal};
use crate::strategies::twap::TwapPlan;

#[derive(Debug, Parser)]
#[command(
    name = "xorderbot",
    about = "CLI wrapper for Binance Futures order placement on the testnet",
    version
)]
pub struct Cli {
    /// Print raw JSON responses instead of the human-friendly summary
    #[arg(long, global = true)]
    pub raw_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Place a market order
    Market {
        /// Trading symbol, e.g. BTCUSDT
        symbol: String,
        /// Order side BUY or SELL
        side: String,
        /// Order quantity (base asset amount)
        quantity: f64,
    },
    /// Place a limit order
    Limit {
        /// Trading symbol, e.g. BTCUSDT
        symbol: String,
        /// Order side BUY or SELL
        side: String,
        /// Order quantity (base asset amount)
        quantity: f64,
        /// Limit price
        price: f64,
        /// Time in force (GTC, IOC, FOK)
        #[arg(long, default_value = "GTC")]
        time_in_force: String,
    },
    /// Execute a TWAP strategy
    Twap {
        /// Trading symbol, e.g. BTCUSDT
        symbol: String,
        /// Order side BUY or SELL
        side: String,
        /// Total quantity to trade across slices
        total_quantity: f64,
        /// Number of slices to break the order into
        slices: usize,
        /// Seconds to wait between slices
        #[arg(long, default_value_t = 10.0)]
        interval: f64,
        /// Use market or limit orders for each slice
        #[arg(long, default_value = "MARKET")]
        order_type: String,
        /// Limit price when --order-type is LIMIT
        #[arg(long)]
        price: Option<f64>,
        /// Time in force for limit slices
        #[arg(long, default_value = "GTC")]
        time_in_force: String,
    },
    /// Launch an interactive guided console with data insights
    Interactive {
        /// Path to fear_greed_index.csv
        #[arg(long)]
        fear_greed_csv: Option<String>,
        /// Path to historical_data.csv
        #[arg(long)]
        historical_csv: Option<String>,
    },
    /// Serve the web dashboard API
    Serve {
        /// Bind host (default from config)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (default from config)
        #[arg(long)]
        port: Option<u16>,
    },
}

/// 명령 실행 - 성공 시 0, 검증/실행 실패 시 1 반환
pub async fn run(cli: Cli, config: Config) -> i32 {
    match dispatch(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("Command failed: {}", e);
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn dispatch(cli: Cli, config: Config) -> Result<i32, TradingError> {
    let raw_json = cli.raw_json;
    match cli.command {
        Command::Market { symbol, side, quantity } => {
            let manager = OrderManager::connect(&config).await?;
            let side = side.parse::<OrderSide>()?;
            let result = manager.place_market_order(&symbol, side, quantity).await?;
            print_order_result(&result, raw_json)?;
            Ok(if result.is_success() { 0 } else { 1 })
        }
        Command::Limit { symbol, side, quantity, price, time_in_force } => {
            let manager = OrderManager::connect(&config).await?;
            let side = side.parse::<OrderSide>()?;
            let time_in_force = time_in_force.parse::<TimeInForce>()?;
            let result = manager
                .place_limit_order(&symbol, side, quantity, price, time_in_force)
                .await?;
            print_order_result(&result, raw_json)?;
            Ok(if result.is_success() { 0 } else { 1 })
        }
        Command::Twap {
            symbol, side, total_quantity, slices, interval, order_type, price, time_in_force,
        } => {
            let manager = OrderManager::connect(&config).await?;
            let plan = TwapPlan {
                symbol,
                side: side.parse::<OrderSide>()?,
                total_quantity,
                slice_count: slices,
                interval_seconds: interval,
                order_type: order_type.parse::<OrderType>()?,
                price,
                time_in_force: time_in_force.parse::<TimeInForce>()?,
            };
            let report = manager.run_twap(plan).await?;
            print_twap_report(&report, raw_json)?;
            Ok(if report.is_success() { 0 } else { 1 })
        }
        Command::Interactive { fear_greed_csv, historical_csv } => {
            let manager = OrderManager::connect(&config).await?;
            run_interactive(&manager, &config, fear_greed_csv, historical_csv).await
        }
        Command::Serve { host, port } => {
            let manager = Arc::new(OrderManager::connect(&config).await?);
            let bind_host = host.unwrap_or_else(|| config.server.host.clone());
            let bind_port = port.unwrap_or(config.server.port);
            let ip: IpAddr = bind_host.parse().map_err(|_| {
                TradingError::ConfigError(format!("Invalid bind host: {}", bind_host))
            })?;

            let api = routes::create_routes(manager, config.data.clone());
            log::info!("서버 시작: http://{}:{}/", bind_host, bind_port);
            warp::serve(api).run((ip, bind_port)).await;
            Ok(0)
        }
    }
}

fn print_order_result(result: &OrderResult, raw_json: bool) -> Result<(), TradingError> {
    if raw_json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    println!("Order Summary:");
    println!("  - symbol: {}", result.intent.symbol);
    println!("  - side: {}", result.intent.side);
    println!("  - type: {}", result.intent.order_type);
    println!("  - quantity: {}", result.intent.quantity);
    if let Some(price) = result.intent.price {
        println!("  - price: {}", price);
        println!("  - time_in_force: {}", result.intent.time_in_force);
    }
    println!("  - success: {}", result.is_success());
    if let Some(ack) = &result.ack {
        println!("  - order_id: {}", ack.order_id);
        println!("  - status: {}", ack.status);
    }
    if let Some(error) = &result.error {
        println!("  - error: {}", error);
    }
    Ok(())
}

fn print_twap_report(report: &TwapReport, raw_json: bool) -> Result<(), TradingError> {
    if raw_json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    println!("TWAP Summary:");
    println!("  - symbol: {}", report.symbol);
    println!("  - side: {}", report.side);
    println!("  - requested_quantity: {}", report.summary.requested_quantity);
    println!("  - filled_quantity: {}", report.summary.filled_quantity);
    println!(
        "  - slices: {} filled / {} failed / {} skipped",
        report.summary.filled_count, report.summary.failed_count, report.summary.skipped_count
    );
    for slice in &report.slices {
        let status = match slice.status {
            SliceStatus::Filled => format!(
                "FILLED (id {})",
                slice.order_id.as_deref().unwrap_or("?")
            ),
            SliceStatus::Failed => format!(
                "FAILED: {}",
                slice.error.as_deref().unwrap_or("unknown error")
            ),
            SliceStatus::Skipped => "SKIPPED".to_string(),
        };
        println!(
            "  Slice {}: qty={} -> {}",
            slice.index + 1,
            slice.intent.quantity,
            status
        );
    }
    Ok(())
}

// ---- 대화형 콘솔 ----

async fn run_interactive(
    manager: &OrderManager,
    config: &Config,
    fear_greed_csv: Option<String>,
    historical_csv: Option<String>,
) -> Result<i32, TradingError> {
    log::info!("Launching interactive mode");

    let fear_path = fear_greed_csv.or_else(|| config.data.fear_greed_csv.clone());
    let hist_path = historical_csv.or_else(|| config.data.historical_csv.clone());

    let fear = match feeds::latest_fear_greed(fear_path.as_deref().map(Path::new)) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            log::warn!("Failed to load fear & greed index: {}", e);
            None
        }
    };
    let history = match feeds::summarize_historical_trades(hist_path.as_deref().map(Path::new), 5) {
        Ok(summary) => Some(summary),
        Err(e) => {
            log::warn!("Failed to load historical data: {}", e);
            None
        }
    };

    let sentiment = if fear.is_some() || history.is_some() {
        Some(SentimentAdvisor::new("BTCUSDT", fear.clone(), history.clone()).build_signal())
    } else {
        None
    };

    print_banner(&fear, &history, &sentiment);

    loop {
        let choice = match prompt("\nChoose an action [market/limit/twap/help/quit]: ") {
            Ok(choice) => choice.to_lowercase(),
            Err(_) => {
                println!();
                return Ok(0);
            }
        };
        match choice.as_str() {
            "quit" | "exit" | "q" => {
                println!("Exiting interactive mode.");
                return Ok(0);
            }
            "help" => print_help(),
            "market" => {
                if let Err(e) = interactive_market(manager, &sentiment).await {
                    log::error!("Validation error: {}", e);
                    println!("Validation error: {}", e);
                }
            }
            "limit" => {
                if let Err(e) = interactive_limit(manager, &sentiment).await {
                    log::error!("Validation error: {}", e);
                    println!("Validation error: {}", e);
                }
            }
            "twap" => {
                if let Err(e) = interactive_twap(manager, &sentiment).await {
                    log::error!("Validation error: {}", e);
                    println!("Validation error: {}", e);
                }
            }
            "" => {}
            _ => println!("Unknown choice. Type 'help' to list options."),
        }
    }
}

fn prompt(text: &str) -> Result<String, TradingError> {
    print!("{}", text);
    std::io::stdout().flush()?;
    let mut line = String::new();
    let bytes = std::io::stdin().read_line(&mut line)?;
    if bytes == 0 {
        // stdin 닫힘 (EOF)
        return Err(TradingError::IoError(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "stdin closed",
        )));
    }
    Ok(line.trim().to_string())
}

fn prompt_or_default(text: &str, default: &str) -> Result<String, TradingError> {
    let input = prompt(text)?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

fn parse_f64(input: &str, what: &str) -> Result<f64, TradingError> {
    input
        .trim()
        .parse::<f64>()
        .map_err(|_| TradingError::ParseError(format!("{} must be a number. Got '{}'", what, input)))
}

fn print_banner(
    fear: &Option<FearGreedSnapshot>,
    history: &Option<HistoricalSummary>,
    sentiment: &Option<SentimentSignal>,
) {
    println!("{}", "=".repeat(60));
    println!(" Binance Futures Bot - Interactive Console ");
    println!("{}", "=".repeat(60));
    match fear {
        Some(fear) => println!(" Latest Fear & Greed Index: {}", fear.label()),
        None => println!(" Fear & Greed data unavailable."),
    }
    match history {
        Some(history) => {
            println!(
                " Historical trades: {} events | Gross volume: ${:.2} | Net closed PnL: ${:.2}",
                history.total_trades, history.gross_volume_usd, history.net_closed_pnl
            );
            if !history.latest_trades.is_empty() {
                println!(" Recent activity:");
                for trade in &history.latest_trades {
                    println!(
                        "  - {} | {} | {} | ${:.4} | ${:.2} | PnL ${:.2}",
                        trade.timestamp,
                        trade.symbol,
                        trade.side,
                        trade.execution_price,
                        trade.size_usd,
                        trade.closed_pnl
                    );
                }
            }
        }
        None => println!(" Historical trade data unavailable."),
    }
    if let Some(sentiment) = sentiment {
        println!("{}", "-".repeat(60));
        println!(
            " Sentiment signal: {} (confidence {}%)",
            sentiment.bias,
            (sentiment.confidence * 100.0) as i64
        );
        println!(" Rationale: {}", sentiment.rationale);
        if let Some(price) = sentiment.reference_price {
            println!(" Reference price: ${:.2}", price);
        }
        if let Some(quantity) = sentiment.suggested_quantity {
            println!(" Suggested qty: {}", quantity);
        }
    }
    println!("{}", "=".repeat(60));
    println!("Type 'help' to list available actions.");
}

fn print_help() {
    println!(
        "Available actions:\n\
         \x20 market - Place a market order\n\
         \x20 limit  - Place a limit order\n\
         \x20 twap   - Execute a TWAP strategy\n\
         \x20 help   - Show this help menu\n\
         \x20 quit   - Exit interactive mode"
    );
}

fn suggested_side(sentiment: &Option<SentimentSignal>, fallback: &str) -> String {
    match sentiment {
        Some(signal) if signal.bias == "BUY" || signal.bias == "SELL" => signal.bias.clone(),
        _ => fallback.to_string(),
    }
}

fn prompt_symbol(sentiment: &Option<SentimentSignal>) -> Result<String, TradingError> {
    let default_symbol = sentiment
        .as_ref()
        .map(|s| s.symbol.clone())
        .unwrap_or_else(|| "BTCUSDT".to_string());
    prompt_or_default(&format!("Symbol (default {}): ", default_symbol), &default_symbol)
}

fn prompt_quantity(sentiment: &Option<SentimentSignal>, label: &str) -> Result<f64, TradingError> {
    let suggested = sentiment.as_ref().and_then(|s| s.suggested_quantity);
    let text = match suggested {
        Some(quantity) => format!("{} (suggested {}): ", label, quantity),
        None => format!("{}: ", label),
    };
    let input = prompt(&text)?;
    if input.is_empty() {
        match suggested {
            Some(quantity) => Ok(quantity),
            None => Err(TradingError::ParseError(format!("{} is required", label))),
        }
    } else {
        parse_f64(&input, label)
    }
}

async fn interactive_market(
    manager: &OrderManager,
    sentiment: &Option<SentimentSignal>,
) -> Result<(), TradingError> {
    let symbol = prompt_symbol(sentiment)?;
    let side_default = suggested_side(sentiment, "BUY");
    let side = prompt_or_default(
        &format!("Side [BUY/SELL] (suggested {}): ", side_default),
        &side_default,
    )?
    .parse::<OrderSide>()?;
    let quantity = prompt_quantity(sentiment, "Quantity (base asset)")?;

    let result = manager.place_market_order(&symbol, side, quantity).await?;
    print_order_result(&result, false)?;
    Ok(())
}

async fn interactive_limit(
    manager: &OrderManager,
    sentiment: &Option<SentimentSignal>,
) -> Result<(), TradingError> {
    let symbol = prompt_symbol(sentiment)?;
    let side_default = suggested_side(sentiment, "SELL");
    let side = prompt_or_default(
        &format!("Side [BUY/SELL] (suggested {}): ", side_default),
        &side_default,
    )?
    .parse::<OrderSide>()?;
    let quantity = prompt_quantity(sentiment, "Quantity (base asset)")?;

    let reference = sentiment.as_ref().and_then(|s| s.reference_price);
    let price_text = match reference {
        Some(price) => format!("Limit price (ref {:.2}): ", price),
        None => "Limit price: ".to_string(),
    };
    let price_input = prompt(&price_text)?;
    let price = if price_input.is_empty() {
        reference.ok_or_else(|| {
            TradingError::ParseError("Price is required for limit orders".to_string())
        })?
    } else {
        parse_f64(&price_input, "Price")?
    };

    let time_in_force = prompt_or_default("Time in force [GTC/IOC/FOK] (default GTC): ", "GTC")?
        .parse::<TimeInForce>()?;

    let result = manager
        .place_limit_order(&symbol, side, quantity, price, time_in_force)
        .await?;
    print_order_result(&result, false)?;
    Ok(())
}

async fn interactive_twap(
    manager: &OrderManager,
    sentiment: &Option<SentimentSignal>,
) -> Result<(), TradingError> {
    let symbol = prompt_symbol(sentiment)?;
    let side_default = suggested_side(sentiment, "BUY");
    let side = prompt_or_default(
        &format!("Side [BUY/SELL] (suggested {}): ", side_default),
        &side_default,
    )?
    .parse::<OrderSide>()?;
    let total_quantity = prompt_quantity(sentiment, "Total quantity")?;

    let slices_input = prompt("Number of slices: ")?;
    let slices = slices_input.trim().parse::<usize>().map_err(|_| {
        TradingError::ParseError(format!("Slices must be a positive integer. Got '{}'", slices_input))
    })?;

    let interval = parse_f64(
        &prompt_or_default("Interval seconds between slices (default 10): ", "10")?,
        "Interval",
    )?;

    let order_type = prompt_or_default("Order type [MARKET/LIMIT] (default MARKET): ", "MARKET")?
        .parse::<OrderType>()?;

    let mut price = None;
    let mut time_in_force = TimeInForce::Gtc;
    if order_type == OrderType::Limit {
        price = Some(parse_f64(&prompt("Limit price for slices: ")?, "Price")?);
        time_in_force = prompt_or_default("Time in force [GTC/IOC/FOK] (default GTC): ", "GTC")?
            .parse::<TimeInForce>()?;
    }

    let plan = TwapPlan {
        symbol,
        side,
        total_quantity,
        slice_count: slices,
        interval_seconds: interval,
        order_type,
        price,
        time_in_force,
    };
    let report = manager.run_twap(plan).await?;

    println!(
        "Executed TWAP: {} units across {} slices.",
        report.summary.filled_quantity,
        report.slices.len()
    );
    if !report.is_success() {
        print_twap_report(&report, false)?;
    }
    Ok(())
}
