//! order-cloud 配置

use std::time::Duration;

use crate::orders::RetryPolicy;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// order-cloud 配置
#[derive(Debug, Clone)]
pub struct Config {
    /// 运行环境：development | staging | production
    pub environment: String,
    /// PostgreSQL 连接 URL（`None` 表示内存存储，仅限开发环境）
    pub database_url: Option<String>,
    /// PostgreSQL 连接池大小
    pub db_max_connections: u32,
    /// HTTP 端口
    pub http_port: u16,
    /// 租户认证用的 JWT secret
    pub jwt_secret: String,
    /// 每日流水号冲突的重试上限与退避
    pub retry: RetryPolicy,
    /// 每个租户通知 channel 的缓冲大小
    pub notify_channel_capacity: usize,
    /// 输出 JSON 日志而非人类可读格式
    pub log_json: bool,
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, BoxError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意 key 查找函数加载配置
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BoxError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let environment = get("ENVIRONMENT").unwrap_or_else(|| "development".into());
        let is_dev = environment == "development";

        let database_url = get("DATABASE_URL");
        if database_url.is_none() && !is_dev {
            return Err(format!("DATABASE_URL must be set in {environment} environment").into());
        }

        let jwt_secret = match get("JWT_SECRET") {
            Some(v) => v,
            None if is_dev => "dev-JWT_SECRET-not-for-production".to_string(),
            None => {
                return Err(format!("JWT_SECRET must be set in {environment} environment").into());
            }
        };

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: parse_or(&get, "ORDER_RETRY_MAX_ATTEMPTS", defaults.max_attempts)?
                .max(1),
            base_delay: Duration::from_millis(parse_or(
                &get,
                "ORDER_RETRY_BASE_DELAY_MS",
                defaults.base_delay.as_millis() as u64,
            )?),
            max_delay: Duration::from_millis(parse_or(
                &get,
                "ORDER_RETRY_MAX_DELAY_MS",
                defaults.max_delay.as_millis() as u64,
            )?),
            jitter: defaults.jitter,
        };

        Ok(Self {
            database_url,
            db_max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 10)?,
            http_port: parse_or(&get, "HTTP_PORT", 8080)?,
            jwt_secret,
            retry,
            notify_channel_capacity: parse_or(&get, "NOTIFY_CHANNEL_CAPACITY", 256)?.max(1),
            log_json: get("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, BoxError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| format!("{key}: invalid value {raw:?} ({e})").into()),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn development_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert!(config.is_development());
        assert!(config.database_url.is_none());
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.notify_channel_capacity, 256);
        assert!(!config.jwt_secret.is_empty());
        assert!(!config.log_json);
    }

    #[test]
    fn production_requires_database_and_secret() {
        let err = Config::from_lookup(lookup(&[("ENVIRONMENT", "production")])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        let err = Config::from_lookup(lookup(&[
            ("ENVIRONMENT", "production"),
            ("DATABASE_URL", "postgres://localhost/orders"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));

        let config = Config::from_lookup(lookup(&[
            ("ENVIRONMENT", "production"),
            ("DATABASE_URL", "postgres://localhost/orders"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap();
        assert_eq!(config.jwt_secret, "s3cret");
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("HTTP_PORT", "9090"),
            ("ORDER_RETRY_MAX_ATTEMPTS", "3"),
            ("ORDER_RETRY_BASE_DELAY_MS", "5"),
            ("NOTIFY_CHANNEL_CAPACITY", "16"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(config.http_port, 9090);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay, Duration::from_millis(5));
        assert_eq!(config.notify_channel_capacity, 16);
        assert!(config.log_json);
    }

    #[test]
    fn invalid_number_is_reported() {
        let err = Config::from_lookup(lookup(&[("HTTP_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("HTTP_PORT"));
    }
}
