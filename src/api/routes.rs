use std::sync::Arc;
use warp::Filter;

use crate::api::handlers;
use crate::config::DataConfig;
use crate::order_core::manager::OrderManager;

/// 주문 봇의 대시보드 API 라우트 생성
pub fn create_routes(
    manager: Arc<OrderManager>,
    data_config: DataConfig,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    // 헬스체크 라우트
    let health = warp::path("health")
        .and(warp::get())
        .and_then(handlers::health_handler);

    // 상태 필터 생성
    let manager_filter = warp::any().map(move || manager.clone());
    let data_filter = warp::any().map(move || data_config.clone());

    // 주문 라우트 (시장가/지정가)
    let orders = warp::path("orders")
        .and(warp::post())
        .and(warp::path::end())
        .and(warp::body::json())
        .and(manager_filter.clone())
        .and_then(handlers::create_order);

    // TWAP 실행 라우트
    let twap = warp::path("twap")
        .and(warp::post())
        .and(warp::path::end())
        .and(warp::body::json())
        .and(manager_filter.clone())
        .and_then(handlers::run_twap);

    // 심리 신호 라우트
    let sentiment = warp::path("sentiment")
        .and(warp::get())
        .and(warp::query::<handlers::SentimentQuery>())
        .and(data_filter)
        .and_then(handlers::get_sentiment);

    health.or(orders).or(twap).or(sentiment)
}
