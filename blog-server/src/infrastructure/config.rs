const DEFAULT_UPLOAD_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub upload_limit_bytes: usize,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// S3-compatible endpoint override, e.g. a local MinIO.
    pub endpoint: Option<String>,
    pub public_domain: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT: {}", e))?;
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let database_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid DATABASE_MAX_CONNECTIONS: {}", e))?;
        let upload_limit_bytes = match std::env::var("UPLOAD_LIMIT_BYTES") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid UPLOAD_LIMIT_BYTES: {}", e))?,
            Err(_) => DEFAULT_UPLOAD_LIMIT,
        };

        let storage = StorageConfig {
            bucket: std::env::var("S3_BUCKET_NAME")
                .map_err(|_| anyhow::anyhow!("S3_BUCKET_NAME must be set"))?,
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".into()),
            access_key: non_empty_var("AWS_ACCESS_KEY"),
            secret_key: non_empty_var("AWS_SECRET_KEY"),
            endpoint: non_empty_var("S3_ENDPOINT"),
            public_domain: std::env::var("S3_PUBLIC_DOMAIN")
                .unwrap_or_else(|_| "s3.amazonaws.com".into()),
        };

        Ok(Self {
            host,
            port,
            database_url,
            database_max_connections,
            upload_limit_bytes,
            storage,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
