use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::DesignImage;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini content container used in both requests and responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

/// Untagged union of text and inline media parts. Variant order matters
/// for `#[serde(untagged)]` decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }
}

/// Base64 inline payload used for image parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
    #[serde(default)]
    safety_ratings: Vec<SafetyRating>,
}

#[derive(Debug, Deserialize)]
struct SafetyRating {
    category: String,
    probability: String,
}

impl GenerateContentResponse {
    fn first_inline_image(&self) -> Option<&InlineData> {
        let content = self.candidates.first()?.content.as_ref()?;
        content.parts.iter().find_map(|part| match part {
            Part::InlineData { inline_data } => Some(inline_data),
            Part::Text { .. } => None,
        })
    }

    fn first_text(&self) -> Option<&str> {
        let content = self.candidates.first()?.content.as_ref()?;
        content.parts.iter().find_map(|part| match part {
            Part::Text { text } => Some(text.as_str()),
            Part::InlineData { .. } => None,
        })
    }
}

/// Failures of a single generation round-trip. Every variant is terminal:
/// the client never retries.
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Tu solicitud fue bloqueada por razones de \"{reason}\".\nDetalles de seguridad: {details}.\nPor favor, ajusta tu texto o imagen.")]
    Blocked { reason: String, details: String },

    #[error("La IA respondió con texto en lugar de una imagen: \"{0}\". Esto puede ocurrir si la solicitud no fue clara o por restricciones de seguridad.")]
    TextInsteadOfImage(String),

    #[error("La IA no devolvió una imagen válida. Intenta reformular tu solicitud o usar una imagen diferente. La solicitud pudo haber sido bloqueada por políticas de seguridad no especificadas.")]
    NoImage,

    #[error("La API de Gemini devolvió un error {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Error de red al contactar la API de Gemini: {0}")]
    Http(#[from] reqwest::Error),
}

fn translate_block_reason(reason: &str) -> &str {
    match reason {
        "SAFETY" => "Seguridad",
        "OTHER" => "Otro",
        other => other,
    }
}

fn translate_category(category: &str) -> &str {
    match category.trim_start_matches("HARM_CATEGORY_") {
        "HARASSMENT" => "Acoso",
        "HATE_SPEECH" => "Discurso de odio",
        "SEXUALLY_EXPLICIT" => "Sexualmente explícito",
        "DANGEROUS_CONTENT" => "Contenido peligroso",
        other => other,
    }
}

fn translate_probability(probability: &str) -> &str {
    match probability {
        "NEGLIGIBLE" => "Insignificante",
        "LOW" => "Baja",
        "MEDIUM" => "Media",
        "HIGH" => "Alta",
        other => other,
    }
}

/// Pull the generated image out of a response, classifying the failure when
/// no inline image came back: provider-reported content block first, then a
/// text-only answer, then the unspecified fallback.
fn extract_image(response: &GenerateContentResponse) -> Result<DesignImage, GeminiError> {
    if let Some(inline) = response.first_inline_image() {
        return Ok(DesignImage {
            data: inline.data.clone(),
            mime_type: inline.mime_type.clone(),
        });
    }

    if let Some(feedback) = &response.prompt_feedback {
        if let Some(reason) = &feedback.block_reason {
            let details = feedback
                .safety_ratings
                .iter()
                .map(|rating| {
                    format!(
                        "{}: {}",
                        translate_category(&rating.category),
                        translate_probability(&rating.probability)
                    )
                })
                .collect::<Vec<_>>()
                .join(", ");
            return Err(GeminiError::Blocked {
                reason: translate_block_reason(reason).to_string(),
                details,
            });
        }
    }

    if let Some(text) = response.first_text() {
        return Err(GeminiError::TextInsteadOfImage(text.to_string()));
    }

    Err(GeminiError::NoImage)
}

/// Stateless wrapper around the hosted Gemini `generateContent` endpoint.
/// One model is configured for image-modality output, one for text.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    image_model: String,
    text_model: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, image_model: &str, text_model: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            image_model: image_model.to_string(),
            text_model: text_model.to_string(),
        }
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = format!("{}/{}:generateContent?key={}", API_BASE, model, self.api_key);

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api { status, body });
        }

        Ok(response.json().await?)
    }

    /// Request an image from the image-capable model. `image_parts` come
    /// first, followed by the instruction text, mirroring the order the
    /// model was tuned for.
    pub async fn synthesize_image(
        &self,
        image_parts: Vec<Part>,
        prompt: &str,
    ) -> Result<DesignImage, GeminiError> {
        let mut parts = image_parts;
        parts.push(Part::text(prompt));

        let request = GenerateContentRequest {
            contents: vec![Content { role: None, parts }],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
            }),
        };

        let response = self.generate_content(&self.image_model, &request).await?;
        extract_image(&response)
    }

    /// Request a conversational description of the change between the
    /// source images and the generated one. Returns the trimmed text
    /// verbatim; an empty answer yields an empty string.
    pub async fn synthesize_description(&self, parts: Vec<Part>) -> Result<String, GeminiError> {
        let request = GenerateContentRequest {
            contents: vec![Content { role: None, parts }],
            generation_config: None,
        };

        let response = self.generate_content(&self.text_model, &request).await?;
        Ok(response
            .first_text()
            .map(|text| text.trim().to_string())
            .unwrap_or_default())
    }
}
