use std::env;

use crate::db::SeedConfig;

/// Config holds all application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub db_max_connections: u32,
    pub listen_addr: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
    /// Allowed CORS origins; the first one builds password reset links
    pub frontend_origins: Vec<String>,
    pub uploads_dir: String,
    pub max_upload_bytes: usize,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_phone_number: String,
    pub sms_country_code: String,
    pub superadmin_email: String,
    pub superadmin_password: String,
    pub superadmin_phone: String,
    pub default_hostel_name: String,
    pub default_hostel_address: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        Self {
            db_path: get_env("DB_PATH", "/data/hostel.db"),
            db_max_connections: get_env("DB_MAX_CONNECTIONS", "5")
                .parse()
                .unwrap_or(5),
            listen_addr: get_env("LISTEN_ADDR", "0.0.0.0:5000"),
            jwt_secret: get_env("JWT_SECRET", ""),
            token_ttl_hours: get_env("TOKEN_TTL_HOURS", "168").parse().unwrap_or(168),
            bcrypt_cost: get_env("BCRYPT_COST", "10").parse().unwrap_or(10),
            frontend_origins: parse_origins(&get_env(
                "FRONTEND_URL",
                "http://localhost:8080,http://localhost:5173",
            )),
            uploads_dir: get_env("UPLOADS_DIR", "./uploads"),
            max_upload_bytes: get_env("MAX_UPLOAD_BYTES", "5242880")
                .parse()
                .unwrap_or(5 * 1024 * 1024),
            twilio_account_sid: get_env("TWILIO_ACCOUNT_SID", ""),
            twilio_auth_token: get_env("TWILIO_AUTH_TOKEN", ""),
            twilio_phone_number: get_env("TWILIO_PHONE_NUMBER", ""),
            sms_country_code: get_env("SMS_COUNTRY_CODE", "+91"),
            superadmin_email: get_env("SUPERADMIN_EMAIL", "superadmin@hostelhub.local"),
            superadmin_password: get_env("SUPERADMIN_PASSWORD", "SuperAdmin@123"),
            superadmin_phone: get_env("SUPERADMIN_PHONE", "9999999999"),
            default_hostel_name: get_env("DEFAULT_HOSTEL_NAME", "Main Hostel"),
            default_hostel_address: get_env("DEFAULT_HOSTEL_ADDRESS", "Chennai, Tamil Nadu, India"),
        }
    }

    /// Origin the SPA is served from
    pub fn frontend_url(&self) -> &str {
        self.frontend_origins
            .first()
            .map(String::as_str)
            .unwrap_or("http://localhost:8080")
    }

    /// SMS is sent only when all gateway credentials are present
    pub fn sms_enabled(&self) -> bool {
        !self.twilio_account_sid.is_empty()
            && !self.twilio_auth_token.is_empty()
            && !self.twilio_phone_number.is_empty()
    }

    pub fn seed_config(&self) -> SeedConfig {
        SeedConfig {
            superadmin_email: self.superadmin_email.clone(),
            superadmin_password: self.superadmin_password.clone(),
            superadmin_phone: self.superadmin_phone.clone(),
            default_hostel_name: self.default_hostel_name.clone(),
            default_hostel_address: self.default_hostel_address.clone(),
            bcrypt_cost: self.bcrypt_cost,
        }
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
