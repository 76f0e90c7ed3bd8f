use anyhow::Result;

use crate::gemini::{GeminiClient, Part};
use crate::media;
use crate::message::{DesignImage, SourceImage};

/// One completed generation round-trip: the new image plus the narrated
/// description of the change. Immutable once produced.
#[derive(Debug, Clone)]
pub struct Design {
    pub image: DesignImage,
    pub description: String,
}

fn initial_prompt(prompt: &str) -> String {
    format!(
        "Genera un rediseño fotorrealista y profesional del espacio en la(s) \
         imagen(es) proporcionada(s), siguiendo esta instrucción del usuario: \"{prompt}\"."
    )
}

fn edit_prompt(prompt: &str) -> String {
    format!(
        "Imagina que eres un diseñador profesional (de interiores o exteriores) viendo \
         la imagen proporcionada. Tu cliente ha pedido el siguiente cambio: \"{prompt}\". \
         Visualiza cómo se vería ese cambio y genera una nueva imagen fotorrealista que \
         muestre el resultado final. La nueva imagen debe ser una continuación natural \
         del estilo y la atmósfera de la original."
    )
}

fn description_prompt(prompt: &str) -> String {
    format!(
        "Analiza el cambio entre la(s) imagen(es) de referencia y la imagen generada. \
         La solicitud del usuario fue: \"{prompt}\". Describe de forma conversacional y \
         amigable los cambios que realizaste para crear el nuevo diseño."
    )
}

/// Two sequential calls against the hosted model: synthesize the image,
/// then narrate the change using the source parts plus the fresh result.
async fn run_round(
    client: &GeminiClient,
    source_parts: Vec<Part>,
    image_prompt: String,
    user_prompt: &str,
) -> Result<Design> {
    let image = client
        .synthesize_image(source_parts.clone(), &image_prompt)
        .await?;

    let mut description_parts = source_parts;
    description_parts.push(media::design_to_part(&image));
    description_parts.push(Part::text(description_prompt(user_prompt)));

    let description = client.synthesize_description(description_parts).await?;

    Ok(Design { image, description })
}

/// Start a design from the user's own photos plus an instruction.
pub async fn generate_initial_design(
    client: &GeminiClient,
    images: &[SourceImage],
    prompt: &str,
) -> Result<Design> {
    let mut parts = Vec::with_capacity(images.len());
    for image in images {
        parts.push(media::load_inline_part(image).await?);
    }
    run_round(client, parts, initial_prompt(prompt), prompt).await
}

/// Edit an existing design, using the prior image as the sole visual input.
pub async fn edit_design(
    client: &GeminiClient,
    base: &DesignImage,
    prompt: &str,
) -> Result<Design> {
    let parts = vec![media::design_to_part(base)];
    run_round(client, parts, edit_prompt(prompt), prompt).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_templates_embed_instruction() {
        let initial = initial_prompt("hazlo minimalista");
        assert!(initial.contains("\"hazlo minimalista\""));
        assert!(initial.contains("fotorrealista"));

        let edit = edit_prompt("añade plantas");
        assert!(edit.contains("\"añade plantas\""));
        assert!(edit.contains("diseñador profesional"));

        let description = description_prompt("hazlo minimalista");
        assert!(description.contains("\"hazlo minimalista\""));
        assert!(description.contains("conversacional"));
    }
}
