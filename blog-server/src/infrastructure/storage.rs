//! Object storage for cover images.

use std::error::Error as StdError;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::error::CredentialsError;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::infrastructure::config::StorageConfig;

/// Length of `<uuid>_` in front of every sanitized filename.
const KEY_PREFIX_LEN: usize = 37;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage credentials not found")]
    CredentialsMissing,
    #[error("{0}")]
    Upload(String),
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores `body` under `key`. One attempt, no retry.
    async fn put(&self, key: &str, content_type: &str, body: Bytes) -> Result<(), StorageError>;

    /// Publicly addressable URL of an object stored under `key`.
    fn public_url(&self, key: &str) -> String;
}

pub struct S3ImageStore {
    client: Client,
    bucket: String,
    public_domain: String,
}

impl S3ImageStore {
    /// Uses `AWS_ACCESS_KEY`/`AWS_SECRET_KEY` when both are configured, otherwise the
    /// default AWS credential chain (environment, profile, instance role).
    pub async fn new(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        let explicit_credentials = match (&config.access_key, &config.secret_key) {
            (Some(access_key), Some(secret_key)) => {
                loader = loader.credentials_provider(Credentials::new(
                    access_key,
                    secret_key,
                    None,
                    None,
                    "blog-server",
                ));
                true
            }
            _ => false,
        };

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if config.endpoint.is_some() {
            builder = builder.force_path_style(true);
        }

        info!(
            bucket = %config.bucket,
            region = %config.region,
            explicit_credentials,
            "S3 image store configured"
        );

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            public_domain: config.public_domain.clone(),
        }
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn put(&self, key: &str, content_type: &str, body: Bytes) -> Result<(), StorageError> {
        debug!("PUT {} ({} bytes, {})", key, body.len(), content_type);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                let err = upload_error(e);
                error!(key, "upload failed: {}", err);
                err
            })?;

        info!(key, bucket = %self.bucket, "image uploaded");
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://{}.{}/{}", self.bucket, self.public_domain, key)
    }
}

/// Credentials that could not be resolved become `CredentialsMissing`; anything else keeps the
/// full cause chain as its message.
fn upload_error<E>(err: E) -> StorageError
where
    E: StdError + 'static,
{
    let mut cause: Option<&(dyn StdError + 'static)> = Some(&err);
    while let Some(current) = cause {
        if matches!(
            current.downcast_ref::<CredentialsError>(),
            Some(CredentialsError::CredentialsNotLoaded(_))
        ) {
            return StorageError::CredentialsMissing;
        }
        cause = current.source();
    }
    StorageError::Upload(DisplayErrorContext(&err).to_string())
}

/// Unique object key for an uploaded file: a fresh UUID joined to the sanitized name, at most
/// `max_len` bytes long.
pub fn storage_key(file_name: &str, max_len: usize) -> String {
    let name_budget = max_len.saturating_sub(KEY_PREFIX_LEN).max(1);
    let name = truncate_keeping_extension(&secure_filename(file_name), name_budget);
    format!("{}_{}", Uuid::new_v4(), name)
}

/// Shortens an ASCII filename to `max_len` bytes, cutting the stem before the extension.
fn truncate_keeping_extension(name: &str, max_len: usize) -> String {
    if name.len() <= max_len {
        return name.to_string();
    }

    let (stem, ext) = match name.rfind('.') {
        Some(dot) if dot > 0 && name.len() - dot < max_len => name.split_at(dot),
        _ => (name, ""),
    };
    let stem = stem[..max_len - ext.len()].trim_end_matches(['.', '_']);
    if stem.is_empty() {
        return name[..max_len].to_string();
    }
    format!("{}{}", stem, ext)
}

/// Reduces a client-supplied filename to `[A-Za-z0-9_.-]` with no path components.
pub fn secure_filename(file_name: &str) -> String {
    let ascii: String = file_name
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::error::SdkError;

    #[test]
    fn secure_filename_replaces_spaces() {
        assert_eq!(secure_filename("a b.png"), "a_b.png");
    }

    #[test]
    fn secure_filename_strips_path_components() {
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("C:\\photos\\cat.jpg"), "C_photos_cat.jpg");
    }

    #[test]
    fn secure_filename_drops_unsafe_and_non_ascii() {
        assert_eq!(secure_filename("héllo wörld!.jpg"), "hllo_wrld.jpg");
        assert_eq!(secure_filename("..."), "upload");
    }

    #[test]
    fn storage_key_is_unique_and_prefixed() {
        let a = storage_key("a b.png", 200);
        let b = storage_key("a b.png", 200);
        assert_ne!(a, b);
        assert!(a.ends_with("_a_b.png"));
        let prefix = a.trim_end_matches("_a_b.png");
        assert!(Uuid::parse_str(prefix).is_ok());
    }

    #[test]
    fn storage_key_of_long_name_fits_and_keeps_extension() {
        let long_name = format!("{}.png", "x".repeat(176));
        let key = storage_key(&long_name, 100);
        assert_eq!(key.len(), 100);
        assert!(key.ends_with(".png"));
        assert!(Uuid::parse_str(&key[..36]).is_ok());
    }

    #[test]
    fn truncation_without_extension_cuts_the_name() {
        assert_eq!(truncate_keeping_extension("abcdefgh", 5), "abcde");
        assert_eq!(truncate_keeping_extension("ab_cd.jpeg", 8), "ab.jpeg");
        assert_eq!(truncate_keeping_extension("short.png", 20), "short.png");
    }

    #[test]
    fn unresolved_credentials_are_reported_as_missing() {
        let err = SdkError::<std::io::Error, ()>::construction_failure(
            CredentialsError::not_loaded("no providers in chain provided credentials"),
        );
        assert!(matches!(upload_error(err), StorageError::CredentialsMissing));
    }

    #[test]
    fn upload_error_keeps_the_underlying_cause() {
        let err = SdkError::<std::io::Error, ()>::construction_failure(std::io::Error::other(
            "NoSuchBucket: The specified bucket does not exist",
        ));
        match upload_error(err) {
            StorageError::Upload(message) => {
                assert!(message.contains("NoSuchBucket: The specified bucket does not exist"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[actix_web::test]
    async fn unreachable_endpoint_reports_connection_detail() {
        let store = S3ImageStore::new(&StorageConfig {
            bucket: "covers".into(),
            region: "us-east-1".into(),
            access_key: Some("access".into()),
            secret_key: Some("secret".into()),
            endpoint: Some("http://127.0.0.1:1".into()),
            public_domain: "s3.amazonaws.com".into(),
        })
        .await;

        let result = store
            .put("k.png", "image/png", Bytes::from_static(b"png"))
            .await;
        match result {
            Err(StorageError::Upload(message)) => {
                assert!(message.len() > "dispatch failure".len(), "{message}");
                assert!(message.to_lowercase().contains("connect"), "{message}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(
            store.public_url("k.png"),
            "https://covers.s3.amazonaws.com/k.png"
        );
    }
}
