use std::net::IpAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub host: IpAddr,
    pub port: u16,
    pub public_url: String,
    pub tokens: TokenConfig,
    pub cors_origins: Vec<String>,
    pub forgot_password_redirect_url: String,
    pub max_body_size: usize,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub access_ttl: Duration,
    pub refresh_secret: String,
    pub refresh_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());

        let host: IpAddr = env_or("VOTEGATE_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid VOTEGATE_HOST: {e}"))?;

        let port: u16 = env_or("VOTEGATE_PORT", "8000")
            .parse()
            .map_err(|e| format!("Invalid VOTEGATE_PORT: {e}"))?;

        let public_url = env_or("PUBLIC_URL", &format!("http://{host}:{port}"))
            .trim_end_matches('/')
            .to_string();

        let access_secret = env_required("ACCESS_TOKEN_SECRET")?;
        let refresh_secret = env_required("REFRESH_TOKEN_SECRET")?;
        if access_secret == refresh_secret {
            return Err(
                "ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must be different".to_string(),
            );
        }

        let access_ttl = parse_duration(&env_or("ACCESS_TOKEN_EXPIRY", "15m"))
            .map_err(|e| format!("Invalid ACCESS_TOKEN_EXPIRY: {e}"))?;
        let refresh_ttl = parse_duration(&env_or("REFRESH_TOKEN_EXPIRY", "10d"))
            .map_err(|e| format!("Invalid REFRESH_TOKEN_EXPIRY: {e}"))?;

        let cors_origins: Vec<String> = env_or("CORS_ORIGIN", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let forgot_password_redirect_url = env_or(
            "FORGOT_PASSWORD_REDIRECT_URL",
            &format!("{public_url}/reset-password"),
        )
        .trim_end_matches('/')
        .to_string();

        let max_body_size: usize = env_or("VOTEGATE_MAX_BODY_SIZE", "16384")
            .parse()
            .map_err(|e| format!("Invalid VOTEGATE_MAX_BODY_SIZE: {e}"))?;

        let log_level = env_or("VOTEGATE_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("SMTP_HOST").ok(),
            std::env::var("SMTP_PORT").ok(),
            std::env::var("SMTP_USER").ok(),
            std::env::var("SMTP_PASSWORD").ok(),
            std::env::var("SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            host,
            port,
            public_url,
            tokens: TokenConfig {
                access_secret,
                access_ttl,
                refresh_secret,
                refresh_ttl,
            },
            cors_origins,
            forgot_password_redirect_url,
            max_body_size,
            log_level,
            smtp,
        })
    }
}

/// Parse a token lifetime such as `900`, `30s`, `15m`, `12h` or `10d`.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);

    let amount: u64 = digits
        .parse()
        .map_err(|_| format!("'{value}' does not start with a number"))?;

    let multiplier = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        other => return Err(format!("unknown unit '{other}'")),
    };

    if amount == 0 {
        return Err("lifetime must be greater than zero".to_string());
    }

    let secs = amount
        .checked_mul(multiplier)
        .ok_or_else(|| format!("'{value}' is too large"))?;

    // Tokens stamp `now + lifetime` as their expiry, so that sum must fit.
    let fits = i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .and_then(|ttl| chrono::Utc::now().checked_add_signed(ttl))
        .is_some();
    if !fits {
        return Err(format!("'{value}' is too large"));
    }

    Ok(Duration::from_secs(secs))
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
