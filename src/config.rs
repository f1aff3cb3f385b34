use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthProviderConfig {
    pub base_url: String,
    pub anon_key: String,
    pub service_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    pub secret: String,
    /// Signed timestamps older than this are treated as replays.
    pub tolerance_secs: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub base_url: String,
    pub api_key: String,
    pub from_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    /// Shared secret for the scheduled-job trigger endpoint. Unset means
    /// the trigger is open (local development only).
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub auth: AuthProviderConfig,
    pub webhook: WebhookConfig,
    pub storage: StorageConfig,
    pub email: EmailConfig,
    pub jobs: JobsConfig,
    /// Emails that always resolve to the admin role, lowercased.
    /// Configuration-driven on purpose: an allow-list baked into source
    /// is not auditable. Empty disables the override entirely.
    pub admin_emails: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let auth = AuthProviderConfig {
            base_url: std::env::var("AUTH_BASE_URL")?,
            anon_key: std::env::var("AUTH_ANON_KEY")?,
            service_key: std::env::var("AUTH_SERVICE_KEY")?,
        };
        let webhook = WebhookConfig {
            secret: std::env::var("WEBHOOK_SECRET")?,
            tolerance_secs: std::env::var("WEBHOOK_TOLERANCE_SECS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(300),
        };
        let storage = StorageConfig {
            endpoint: std::env::var("S3_ENDPOINT")?,
            bucket: std::env::var("S3_BUCKET")?,
            access_key: std::env::var("S3_ACCESS_KEY")?,
            secret_key: std::env::var("S3_SECRET_KEY")?,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
        };
        let email = EmailConfig {
            base_url: std::env::var("EMAIL_BASE_URL")?,
            api_key: std::env::var("EMAIL_API_KEY")?,
            from_address: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "studio@focal.local".into()),
        };
        let jobs = JobsConfig {
            secret: std::env::var("JOBS_SECRET").ok(),
        };
        let admin_emails = std::env::var("ADMIN_EMAILS")
            .map(|v| {
                v.split(',')
                    .map(|e| e.trim().to_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url,
            auth,
            webhook,
            storage,
            email,
            jobs,
            admin_emails,
        })
    }
}
