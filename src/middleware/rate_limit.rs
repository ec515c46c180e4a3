use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use redis::AsyncCommands;

use crate::{
    config::Config,
    utils::{client_ip, error_codes, error_to_api_response},
};

/// 基于 Redis 的按 IP 固定窗口限流
#[derive(Clone)]
pub struct RateLimiter {
    redis: Arc<redis::Client>,
    window_secs: u64,
    max_requests: u64,
}

impl RateLimiter {
    pub fn new(redis: redis::Client, config: &Config) -> Self {
        Self {
            redis: Arc::new(redis),
            window_secs: config.rate_limit_window().as_secs().max(1),
            max_requests: u64::from(config.rate_limit_requests),
        }
    }

    pub fn key(ip: &str) -> String {
        format!("rate_limit:{}", ip)
    }

    /// 计数并返回当前窗口内的请求数
    async fn hit(&self, ip: &str) -> redis::RedisResult<u64> {
        let key = Self::key(ip);
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let count: u64 = conn.incr(&key, 1).await?;
        if count == 1 {
            // 窗口从第一次请求开始计时
            let _: () = conn.expire(&key, self.window_secs as i64).await?;
        }
        Ok(count)
    }

    fn exceeded(&self, count: u64) -> bool {
        count > self.max_requests
    }

    fn too_many_requests(&self) -> Response {
        (
            StatusCode::TOO_MANY_REQUESTS,
            error_to_api_response::<()>(
                error_codes::RATE_LIMIT,
                format!(
                    "Too many requests, retry in {} seconds",
                    self.window_secs
                ),
            ),
        )
            .into_response()
    }
}

fn request_ip(req: &Request<Body>) -> String {
    client_ip(req.headers())
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = request_ip(&req);

    match limiter.hit(&ip).await {
        Ok(count) if limiter.exceeded(count) => {
            tracing::warn!("Rate limit exceeded for {} ({} requests)", ip, count);
            limiter.too_many_requests()
        }
        Ok(_) => next.run(req).await,
        Err(e) => {
            tracing::warn!("Rate limiter unavailable, letting request through: {}", e);
            next.run(req).await
        }
    }
}
