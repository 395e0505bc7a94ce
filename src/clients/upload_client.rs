// src/clients/upload_client.rs

use async_trait::async_trait;
use reqwest::{Client, multipart};
use serde::Deserialize;

use crate::common::error::AppError;

/// Um arquivo recebido do usuário, ainda em memória.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Serviço de upload: recebe o arquivo e devolve uma URL pública.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn upload(&self, record_id: &str, attachment: &Attachment) -> Result<String, AppError>;
}

#[derive(Deserialize)]
struct UploadResponse {
    url: Option<String>,
    error: Option<String>,
}

#[derive(Clone)]
pub struct UploadClient {
    client: Client,
    url: String,
}

impl UploadClient {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl FileStore for UploadClient {
    async fn upload(&self, record_id: &str, attachment: &Attachment) -> Result<String, AppError> {
        let part = multipart::Part::bytes(attachment.bytes.clone())
            .file_name(attachment.file_name.clone())
            .mime_str(&attachment.content_type)
            .map_err(|e| AppError::UploadFailed(format!("tipo de arquivo inválido: {}", e)))?;

        let form = multipart::Form::new()
            .part("file", part)
            .text("recordId", record_id.to_string());

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Falha ao enviar anexo de {}: {}", record_id, e);
                AppError::UploadFailed(e.to_string())
            })?;

        let status = response.status();
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::UploadFailed(format!("resposta ilegível ({}): {}", status, e)))?;

        match (status.is_success(), body.url) {
            (true, Some(url)) if !url.is_empty() => {
                tracing::info!(record_id, %url, "Anexo enviado");
                Ok(url)
            }
            _ => Err(AppError::UploadFailed(
                body.error.unwrap_or_else(|| format!("serviço respondeu {}", status)),
            )),
        }
    }
}
