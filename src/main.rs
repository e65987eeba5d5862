/**
* filename : main
* author : HAMA
* date: 2025. 5. 8.
* description:
**/

use clap::Parser;

use xOrderBot::cli::{self, Cli};
use xOrderBot::config::Config;
use xOrderBot::utils::logging;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Cli::parse();

    // 로깅 초기화
    logging::init()?;
    log::info!("Binance Futures 주문 봇 시작...");

    // 설정 로드
    let config = Config::load()?;
    log::info!("설정 로드 완료");

    let code = cli::run(args, config).await;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
