// src/clients/script_client.rs

use reqwest::{Client, StatusCode, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};

use crate::common::error::AppError;

const VERSION_CONFLICT: &str = "VERSION_CONFLICT";

// Envelope padrão devolvido pelos scripts remotos
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    message: Option<String>,
    code: Option<String>,
    data: Option<T>,
}

/// Decodifica a resposta de um script. `success: false` vira erro com a
/// mensagem do colaborador, sem alteração.
pub(crate) fn decode_envelope<T: DeserializeOwned>(text: &str) -> Result<Option<T>, AppError> {
    let envelope: Envelope<T> = serde_json::from_str(text)?;

    if envelope.success {
        return Ok(envelope.data);
    }
    if envelope.code.as_deref() == Some(VERSION_CONFLICT) {
        return Err(AppError::Conflict);
    }
    Err(AppError::Remote(
        envelope
            .message
            .unwrap_or_else(|| "O colaborador recusou a ação sem mensagem.".to_string()),
    ))
}

/// Corpo `{action, data}` usado pelos colaboradores de requisições e estoque.
pub(crate) fn action_body<D: Serialize>(action: &str, data: &D) -> Result<Value, AppError> {
    Ok(json!({ "action": action, "data": serde_json::to_value(data)? }))
}

/// Corpo `{type, ...campos}` usado pelo colaborador de faturas.
pub(crate) fn typed_body<D: Serialize>(kind: &str, fields: &D) -> Result<Value, AppError> {
    let mut value = serde_json::to_value(fields)?;
    match value.as_object_mut() {
        Some(map) => {
            map.insert("type".to_string(), Value::String(kind.to_string()));
            Ok(value)
        }
        None => Err(anyhow::anyhow!("payload de '{}' precisa ser um objeto", kind).into()),
    }
}

/// Cliente genérico de um endpoint de script (leitura via GET, escrita via POST).
#[derive(Clone)]
pub struct ScriptClient {
    client: Client,
    base_url: String,
    name: &'static str,
}

impl ScriptClient {
    pub fn new(client: Client, base_url: String, name: &'static str) -> Self {
        Self {
            client,
            base_url,
            name,
        }
    }

    pub async fn read<T: DeserializeOwned>(
        &self,
        action: &str,
        filters: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let mut query: Vec<(&str, &str)> = vec![("action", action)];
        query.extend_from_slice(filters);

        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Falha ao ler '{}' de {}: {}", action, self.name, e);
                e
            })?;

        let text = self.checked_text(response).await?;
        decode_envelope::<T>(&text)?
            .ok_or_else(|| AppError::Remote(format!("{} não devolveu dados para '{}'", self.name, action)))
    }

    /// Envia uma ação de escrita. O corpo vai como texto JSON.
    pub async fn write<T: DeserializeOwned>(&self, body: &Value) -> Result<Option<T>, AppError> {
        let response = self
            .client
            .post(&self.base_url)
            .header(CONTENT_TYPE, "text/plain;charset=utf-8")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Falha ao enviar ação para {}: {}", self.name, e);
                e
            })?;

        let text = self.checked_text(response).await?;
        decode_envelope::<T>(&text)
    }

    pub async fn write_expecting<T: DeserializeOwned>(&self, body: &Value) -> Result<T, AppError> {
        self.write::<T>(body)
            .await?
            .ok_or_else(|| AppError::Remote(format!("{} não devolveu o registro gravado", self.name)))
    }

    async fn checked_text(&self, response: reqwest::Response) -> Result<String, AppError> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::warn!("{} respondeu {}: {}", self.name, status, text);
            return Err(failure_from_reply(self.name, status, &text));
        }
        Ok(text)
    }
}

/// Erro para uma resposta não-2xx. Se o corpo for um envelope de falha,
/// a mensagem (ou o código de conflito) do colaborador prevalece.
fn failure_from_reply(name: &str, status: StatusCode, text: &str) -> AppError {
    match decode_envelope::<Value>(text) {
        Err(err @ (AppError::Remote(_) | AppError::Conflict)) => err,
        _ => AppError::Remote(format!("{} respondeu {}", name, status)),
    }
}
