//! Image endpoints: upload with duplicate detection, listings, file access
//! and admin deletion.

use std::path::Path;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::ApiClient;
use crate::error::{ClientError, Result};
use crate::request::{ApiRequest, UploadFile};

pub const UPLOAD_PATH: &str = "/api/images/upload/";
pub const MY_IMAGES_PATH: &str = "/api/images/my-images/";
pub const ADMIN_IMAGES_PATH: &str = "/api/images/admin/images/";
pub const VERIFIED_IMAGES_PATH: &str = "/api/images/admin/images/verified/";

pub fn file_path(id: i64) -> String {
    format!("/api/images/{id}/file/")
}

pub fn admin_image_path(id: i64) -> String {
    format!("/api/images/admin/images/{id}/")
}

/// An uploaded image as reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: i64,
    #[serde(default)]
    pub sha256_hash: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub blockchain_tx: Option<String>,
    /// `Real` or `Fake`.
    #[serde(default)]
    pub deepfake_label: Option<String>,
    #[serde(default)]
    pub deepfake_confidence: Option<f64>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub uploader: Option<i64>,
    #[serde(default)]
    pub uploader_username: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Which detector flagged an upload as a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionStage {
    Sha256,
    Orb,
    Sift,
    #[serde(other)]
    Unknown,
}

impl DetectionStage {
    /// Byte-identical match rather than a perceptual one.
    pub fn is_exact(self) -> bool {
        self == DetectionStage::Sha256
    }
}

impl std::fmt::Display for DetectionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionStage::Sha256 => write!(f, "sha256"),
            DetectionStage::Orb => write!(f, "orb"),
            DetectionStage::Sift => write!(f, "sift"),
            DetectionStage::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateType {
    Exact,
    Similar,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for DuplicateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicateType::Exact => write!(f, "exact"),
            DuplicateType::Similar => write!(f, "similar"),
            DuplicateType::Unknown => write!(f, "unknown"),
        }
    }
}

/// The server's 400 payload when an upload matches an existing image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateReport {
    #[serde(default)]
    pub error: Option<String>,
    /// Matching image; absent for exact hash matches.
    #[serde(default)]
    pub image_id: Option<i64>,
    pub stage: DetectionStage,
    pub duplicate_type: DuplicateType,
    #[serde(default)]
    pub similarity: f64,
    #[serde(default)]
    pub message: Option<String>,
}

impl DuplicateReport {
    /// Extract a duplicate report from a failed upload, if it is one.
    pub fn from_error(err: &ClientError) -> Option<Self> {
        if err.status() != Some(400) {
            return None;
        }
        let body = err.body()?;
        body.get("stage")?;
        serde_json::from_value(body.clone()).ok()
    }

    /// Human readable summary, preferring the server's wording.
    pub fn summary(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| format!("Duplicate image ({})", self.duplicate_type))
    }
}

/// Result of an upload that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Stored(ImageRecord),
    /// Rejected as a duplicate. Not an error and never retried.
    Duplicate(DuplicateReport),
}

/// Query for the admin listing. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminImageFilter {
    pub uploaded_by: Option<String>,
    pub deepfake_label: Option<String>,
    pub is_verified: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl AdminImageFilter {
    fn apply(&self, mut request: ApiRequest) -> ApiRequest {
        if let Some(user) = &self.uploaded_by {
            request = request.query("uploaded_by", user);
        }
        if let Some(label) = &self.deepfake_label {
            request = request.query("deepfake_label", label);
        }
        if let Some(verified) = self.is_verified {
            request = request.query("is_verified", verified);
        }
        if let Some(page) = self.page {
            request = request.query("page", page);
        }
        if let Some(limit) = self.limit {
            request = request.query("limit", limit);
        }
        request
    }
}

/// One page of the admin listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdminImagePage {
    #[serde(default)]
    pub total: Option<u64>,
    pub images: Vec<ImageRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImageListing {
    List(Vec<ImageRecord>),
    Page(AdminImagePage),
}

impl ImageListing {
    fn into_images(self) -> Vec<ImageRecord> {
        match self {
            ImageListing::List(images) => images,
            ImageListing::Page(page) => page.images,
        }
    }
}

/// Raw image bytes served by the file endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

#[derive(Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}

/// Upload an image. A duplicate is reported as [`UploadOutcome::Duplicate`].
pub async fn upload_image(client: &ApiClient, file: UploadFile) -> Result<UploadOutcome> {
    debug!(file = %file.file_name, size = file.bytes.len(), "Uploading image");
    match client
        .send_json::<ImageRecord>(ApiRequest::post(UPLOAD_PATH).multipart(file))
        .await
    {
        Ok(image) => {
            info!(id = image.id, label = ?image.deepfake_label, "Image stored");
            Ok(UploadOutcome::Stored(image))
        }
        Err(err) => match DuplicateReport::from_error(&err) {
            Some(report) => {
                info!(stage = %report.stage, similarity = report.similarity, "Upload rejected as duplicate");
                Ok(UploadOutcome::Duplicate(report))
            }
            None => Err(err),
        },
    }
}

/// Read a file from disk and upload it.
pub async fn upload_image_from_path(client: &ApiClient, path: &Path) -> Result<UploadOutcome> {
    let file = UploadFile::from_path(path).await?;
    upload_image(client, file).await
}

/// Images uploaded by the signed-in user.
pub async fn my_images(client: &ApiClient) -> Result<Vec<ImageRecord>> {
    let listing: ImageListing = client.send_json(ApiRequest::get(MY_IMAGES_PATH)).await?;
    Ok(listing.into_images())
}

/// All images, filtered (admin only).
pub async fn admin_images(client: &ApiClient, filter: &AdminImageFilter) -> Result<AdminImagePage> {
    let request = filter.apply(ApiRequest::get(ADMIN_IMAGES_PATH));
    client.send_json(request).await
}

/// Verified images. Accepts a bare list or a paginated object.
pub async fn verified_images(client: &ApiClient) -> Result<Vec<ImageRecord>> {
    let listing: ImageListing = client
        .send_json(ApiRequest::get(VERIFIED_IMAGES_PATH))
        .await?;
    Ok(listing.into_images())
}

/// Delete an image (admin only). Returns the server's confirmation.
pub async fn delete_image(client: &ApiClient, id: i64) -> Result<String> {
    let response: MessageResponse = client
        .send_json(ApiRequest::delete(admin_image_path(id)))
        .await?;
    info!(id, "Image deleted");
    Ok(response
        .message
        .unwrap_or_else(|| format!("Image {id} deleted")))
}

/// Download an image through the authenticated pipeline.
///
/// A cache-busting timestamp is appended under the first configured
/// cache-busting parameter name; it is dropped again if the request has to
/// be retried after a refresh.
pub async fn fetch_image(client: &ApiClient, id: i64) -> Result<ImageFile> {
    let mut request = ApiRequest::get(file_path(id));
    if let Some(name) = client.config().cache_busting_params.first() {
        request = request.query(name.as_str(), Utc::now().timestamp_millis());
    }
    let (bytes, content_type) = client.send_bytes(request).await?;
    Ok(ImageFile {
        bytes,
        content_type,
    })
}

/// URL of an image file. The access token is never embedded in it.
pub fn image_url(client: &ApiClient, id: i64) -> String {
    client.endpoint(&file_path(id))
}
