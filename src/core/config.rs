use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
    pub llm: LlmConfig,
    pub transcription: TranscriptionConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Session token settings
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub jwt_leeway: Duration,
    pub cookie_name: String,
    /// Adds the `Secure` attribute to the session cookie
    pub cookie_secure: bool,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// OpenAI-compatible chat completions endpoint used for report generation
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout: Duration,
}

/// OpenAI-compatible speech-to-text endpoint
#[derive(Debug, Clone)]
pub struct TranscriptionConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// Default language hint (ISO-639-1), overridable per request
    pub language: Option<String>,
    /// Upper bound for uploaded audio, in bytes
    pub max_audio_bytes: usize,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            llm: LlmConfig::from_env()?,
            transcription: TranscriptionConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 2 * 1024 * 1024; // 2MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Comma-separated; browser extension origins (chrome-extension://...) go here too
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_REQUEST_BODY_SIZE must be a valid number".to_string())?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl AuthConfig {
    const DEFAULT_TOKEN_TTL_SECS: u64 = 7 * 24 * 3600; // 7 days
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60;
    const MIN_SECRET_LEN: usize = 32;

    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET environment variable is required".to_string())?;

        if jwt_secret.len() < Self::MIN_SECRET_LEN {
            return Err(format!(
                "JWT_SECRET must be at least {} characters",
                Self::MIN_SECRET_LEN
            ));
        }

        let token_ttl_secs = env::var("SESSION_TTL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TOKEN_TTL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "SESSION_TTL_SECS must be a valid number".to_string())?;

        let jwt_leeway_secs = env::var("JWT_LEEWAY")
            .unwrap_or_else(|_| Self::DEFAULT_JWT_LEEWAY_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "JWT_LEEWAY must be a valid number".to_string())?;

        let cookie_name =
            env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "medreport_session".to_string());

        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            jwt_secret,
            token_ttl: Duration::from_secs(token_ttl_secs),
            jwt_leeway: Duration::from_secs(jwt_leeway_secs),
            cookie_name,
            cookie_secure,
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "MedReport API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "API documentation for MedReport".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl LlmConfig {
    const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    const DEFAULT_MODEL: &'static str = "gpt-4o";
    const DEFAULT_TEMPERATURE: f32 = 0.3;
    const DEFAULT_MAX_TOKENS: u32 = 4096;
    const DEFAULT_TIMEOUT_SECS: u64 = 120;

    pub fn from_env() -> Result<Self, String> {
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| "OPENAI_API_KEY environment variable is required".to_string())?;

        let base_url = env::var("LLM_BASE_URL")
            .unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let model = env::var("LLM_MODEL").unwrap_or_else(|_| Self::DEFAULT_MODEL.to_string());

        let temperature = env::var("LLM_TEMPERATURE")
            .unwrap_or_else(|_| Self::DEFAULT_TEMPERATURE.to_string())
            .parse::<f32>()
            .map_err(|_| "LLM_TEMPERATURE must be a valid number".to_string())?;

        let max_tokens = env::var("LLM_MAX_TOKENS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_TOKENS.to_string())
            .parse::<u32>()
            .map_err(|_| "LLM_MAX_TOKENS must be a valid number".to_string())?;

        let timeout_secs = env::var("LLM_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "LLM_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            api_key,
            base_url,
            model,
            temperature,
            max_tokens,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl TranscriptionConfig {
    const DEFAULT_MODEL: &'static str = "whisper-1";
    const DEFAULT_MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024; // provider limit
    const DEFAULT_TIMEOUT_SECS: u64 = 120;

    pub fn from_env() -> Result<Self, String> {
        // Falls back to the chat completions credentials and host
        let api_key = env::var("TRANSCRIPTION_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .map_err(|_| {
                "TRANSCRIPTION_API_KEY or OPENAI_API_KEY environment variable is required"
                    .to_string()
            })?;

        let base_url = env::var("TRANSCRIPTION_BASE_URL")
            .or_else(|_| env::var("LLM_BASE_URL"))
            .unwrap_or_else(|_| LlmConfig::DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let model =
            env::var("TRANSCRIPTION_MODEL").unwrap_or_else(|_| Self::DEFAULT_MODEL.to_string());

        let language = env::var("TRANSCRIPTION_LANGUAGE")
            .ok()
            .filter(|s| !s.is_empty());

        let max_audio_bytes = env::var("TRANSCRIPTION_MAX_AUDIO_BYTES")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_AUDIO_BYTES.to_string())
            .parse::<usize>()
            .map_err(|_| "TRANSCRIPTION_MAX_AUDIO_BYTES must be a valid number".to_string())?;

        let timeout_secs = env::var("TRANSCRIPTION_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "TRANSCRIPTION_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            api_key,
            base_url,
            model,
            language,
            max_audio_bytes,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
