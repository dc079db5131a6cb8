use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::question::{Question, QuestionIssue};
use crate::services::ai_service::{Attachment, AttachmentMode};
use crate::services::document_service::{DocumentKind, UploadWorkspace};
use crate::services::extractor;
use crate::AppState;

/// Multipart field names accepted for the document.
const FILE_FIELDS: [&str; 3] = ["pdf", "docx", "file"];

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub questions: Vec<Question>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<QuestionIssue>,
}

struct UploadedFile {
    file_name: String,
    kind: DocumentKind,
    data: bytes::Bytes,
}

async fn read_upload(multipart: &mut Multipart, limit: usize) -> Result<UploadedFile> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to get next field: {}", e);
        Error::from(e)
    })? {
        let field_name = field.name().unwrap_or_default().to_string();
        if !FILE_FIELDS.contains(&field_name.as_str()) {
            continue;
        }

        // An empty file input still posts a part, with `filename=""` and no body.
        let file_name = match field.file_name() {
            Some("") => return Err(Error::NoFileAttached),
            Some(name) => name.to_string(),
            None => "document".to_string(),
        };
        let content_type = field.content_type().map(|ct| ct.to_string());
        let data = field.bytes().await?;

        if data.is_empty() {
            return Err(Error::NoFileAttached);
        }
        let kind = DocumentKind::detect(content_type.as_deref(), Some(&file_name))?;
        if data.len() > limit {
            return Err(Error::PayloadTooLarge { limit });
        }
        kind.check_signature(&data)?;

        return Ok(UploadedFile {
            file_name,
            kind,
            data,
        });
    }

    Err(Error::NoFileAttached)
}

pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let request_id = uuid::Uuid::new_v4();

    let upload = read_upload(&mut multipart, state.upload.max_upload_bytes)
        .await
        .map_err(|e| {
            tracing::warn!(%request_id, error = %e, "Rejected upload");
            e
        })?;

    tracing::info!(
        %request_id,
        file = %upload.file_name,
        kind = ?upload.kind,
        bytes = upload.data.len(),
        "Processing uploaded document"
    );

    let workspace = UploadWorkspace::create(
        upload.kind,
        &upload.data,
        state.upload.temp_root.as_deref(),
    )
    .await?;
    let outcome = process(&state, &workspace, &upload).await;
    workspace.close();

    let batch = outcome.map_err(|e| {
        tracing::error!(%request_id, error = %e, "Upload failed");
        e
    })?;

    tracing::info!(
        %request_id,
        accepted = batch.questions.len(),
        rejected = batch.rejected.len(),
        "Extracted questions"
    );

    Ok(Json(UploadResponse {
        questions: batch.questions,
        rejected: batch.rejected,
    }))
}

async fn process(
    state: &AppState,
    workspace: &UploadWorkspace,
    upload: &UploadedFile,
) -> Result<extractor::ValidatedBatch> {
    let attachment = match state.upload.attachment_mode {
        AttachmentMode::Images => Attachment::PageImages(
            workspace
                .render_pages(state.upload.render_dpi, state.upload.max_pages)
                .await?,
        ),
        AttachmentMode::File => Attachment::File {
            file_name: upload.file_name.clone(),
            mime: upload.kind.mime().to_string(),
            bytes: workspace.document_bytes().await?,
        },
    };

    let raw = state.ai_service.extract_questions(&attachment).await?;
    extractor::parse_questions(&raw)
}
