use std::path::Path;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use thiserror::Error;

/// Model artifacts the service needs, relative to the model directory.
pub const REQUIRED_ARTIFACTS: [&str; 8] = [
    "diabetes/scaler.json",
    "diabetes/diabetes_model.pb",
    "exercise/scaler.json",
    "exercise/regressor_model.pb",
    "exercise/classifier_model.pb",
    "exercise/label_encoder.json",
    "food_classification/model.pb",
    "food_classification/class_list.txt",
];

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("missing model artifacts and ARTIFACT_BASE_URL is not set: {0:?}")]
    Missing(Vec<String>),
    #[error("failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("ARTIFACT_TOKEN is not a valid header value")]
    InvalidToken,
}

async fn download_file(client: &Client, url: &str, path: &Path) -> Result<(), ArtifactError> {
    tracing::info!(%url, path = %path.display(), "downloading artifact");

    let mut header_map = HeaderMap::new();
    if let Ok(token) = std::env::var("ARTIFACT_TOKEN") {
        let auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ArtifactError::InvalidToken)?;
        header_map.insert(AUTHORIZATION, auth_value);
    }
    header_map.insert(ACCEPT, HeaderValue::from_static("application/octet-stream"));

    let download_error = |source| ArtifactError::Download {
        url: url.to_string(),
        source,
    };
    let bytes = client
        .get(url)
        .headers(header_map)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(download_error)?
        .bytes()
        .await
        .map_err(download_error)?;

    let write_error = |source| ArtifactError::Write {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
    }
    tokio::fs::write(path, bytes).await.map_err(write_error)
}

/// Checks that every model artifact exists, downloading missing ones from
/// `base_url` when one is configured.
pub async fn ensure_artifacts(
    client: &Client,
    model_dir: &Path,
    base_url: Option<&str>,
) -> Result<(), ArtifactError> {
    tracing::info!(dir = %model_dir.display(), "checking model artifacts");

    let missing: Vec<&str> = REQUIRED_ARTIFACTS
        .iter()
        .copied()
        .filter(|artifact| !model_dir.join(artifact).exists())
        .collect();
    if missing.is_empty() {
        return Ok(());
    }

    let Some(base_url) = base_url else {
        return Err(ArtifactError::Missing(
            missing.iter().map(|s| s.to_string()).collect(),
        ));
    };

    for artifact in missing {
        let url = format!("{}/{}", base_url.trim_end_matches('/'), artifact);
        download_file(client, &url, &model_dir.join(artifact)).await?;
    }
    Ok(())
}
