//! services/api/src/web/documents.rs
//!
//! Contains the Axum handlers for the document endpoints: upload (the
//! ingestion path), listing/search and soft deletion.

use axum::{
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use docvault_core::domain::{self, Document};
use docvault_core::ports::PortError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::enrichment;
use crate::web::state::{AppState, AuthedUser};

/// The multipart field name uploads must arrive under.
const UPLOAD_FIELD: &str = "document";

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
}

/// A document as returned to clients. The raw content bytes never leave the
/// store over this API.
#[derive(Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub fieldname: String,
    pub originalname: String,
    pub encoding: String,
    pub mimetype: String,
    pub date: DateTime<Utc>,
    pub hash: String,
    pub keywords: Vec<String>,
    pub trashed: bool,
    #[serde(rename = "trashedAt")]
    pub trashed_at: Option<DateTime<Utc>>,
}

impl From<Document> for DocumentResponse {
    fn from(doc: Document) -> Self {
        DocumentResponse {
            id: doc.id,
            user_id: doc.user_id,
            fieldname: doc.fieldname,
            originalname: doc.originalname,
            encoding: doc.encoding,
            mimetype: doc.mimetype,
            date: doc.date,
            hash: doc.hash,
            keywords: doc.keywords,
            trashed: doc.trashed,
            trashed_at: doc.trashed_at,
        }
    }
}

//=========================================================================================
// Upload (Ingestion Path)
//=========================================================================================

struct UploadedFile {
    originalname: String,
    encoding: String,
    mimetype: String,
    content: Vec<u8>,
}

/// Pulls the single expected file out of the multipart body and validates it
/// before any bytes are persisted.
async fn read_upload(multipart: &mut Multipart, max_bytes: usize) -> Result<UploadedFile, ApiError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| PortError::Validation(format!("Malformed multipart body: {}", e)))?
        .ok_or_else(|| PortError::Validation("Multipart form must include a file".to_string()))?;

    if field.name() != Some(UPLOAD_FIELD) {
        return Err(PortError::Validation("Unexpected field".to_string()).into());
    }

    let originalname = field
        .file_name()
        .map(str::to_string)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| PortError::Validation("Missing filename".to_string()))?;

    let mimetype = field
        .content_type()
        .map(str::to_string)
        .ok_or_else(|| PortError::Validation("Missing content-type".to_string()))?;

    // Declared MIME type gates the upload before anything else runs. It is
    // not verified against magic bytes; see the hardening notes.
    if !domain::mime_allowed(&mimetype) {
        return Err(PortError::Validation("Invalid content-type".to_string()).into());
    }

    let encoding = field
        .headers()
        .get("content-transfer-encoding")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("7bit")
        .to_string();

    let content = field
        .bytes()
        .await
        .map_err(|e| PortError::Validation(format!("Failed to read file bytes: {}", e)))?
        .to_vec();

    if content.len() > max_bytes {
        return Err(PortError::Validation("File too large".to_string()).into());
    }

    Ok(UploadedFile {
        originalname,
        encoding,
        mimetype,
        content,
    })
}

/// POST /uploadDocument - Persist an uploaded file and enrich it in the background.
///
/// The success response is sent as soon as the document row exists; keyword
/// extraction runs afterwards as an independent task, so keyword presence is
/// eventually consistent.
pub async fn upload_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthedUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let file = read_upload(&mut multipart, state.config.max_upload_bytes).await?;

    let document = Document::new(
        user.user_id,
        UPLOAD_FIELD.to_string(),
        file.originalname,
        file.encoding,
        file.mimetype,
        file.content,
    );
    let document = state.documents.create_document(document).await?;
    info!(
        "Stored document {} ({}) for user {}",
        document.id, document.hash, document.user_id
    );

    // Fire-and-forget from the caller's point of view; the task itself logs
    // its outcome. Identical bytes uploaded twice spawn two independent runs.
    tokio::spawn(enrichment::enrich_document(
        state.clone(),
        document.id,
        document.content.clone(),
        document.mimetype.clone(),
    ));

    Ok(Json(json!({"message": "File uploaded successfully"})))
}

//=========================================================================================
// Listing, Search and Deletion
//=========================================================================================

/// GET /getDocuments?search= - List or search the caller's documents.
pub async fn get_documents_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthedUser>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let docs = state
        .documents
        .list_by_owner(user.user_id, params.search.as_deref())
        .await?;
    let docs: Vec<DocumentResponse> = docs.into_iter().map(Into::into).collect();
    Ok(Json(json!({"docs": docs, "success": true})))
}

/// DELETE /deleteDocument/{hash} - Soft-delete a document by content hash.
pub async fn delete_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthedUser>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let doc = state
        .documents
        .soft_delete(user.user_id, &hash, Utc::now())
        .await?;
    let doc = DocumentResponse::from(doc);
    Ok(Json(json!({"doc": doc, "success": true})))
}

/// GET /searchDocument/{search} - Deprecated path-parameter search.
/// Superseded by `GET /getDocuments?search=`.
pub async fn search_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthedUser>,
    Path(search): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let docs = state
        .documents
        .list_by_owner(user.user_id, Some(&search))
        .await?;
    if docs.is_empty() {
        return Err(PortError::NotFound("Document not found".to_string()).into());
    }
    let docs: Vec<DocumentResponse> = docs.into_iter().map(Into::into).collect();
    Ok(Json(json!({"docs": docs, "success": true})))
}
