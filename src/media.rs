use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Local;

use crate::gemini::Part;
use crate::message::{DesignImage, SourceImage};

/// Image mime type from the file extension, for the formats the API accepts.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Validate a user-supplied path into a stageable source image.
pub fn stage_source_image(path: &Path) -> Result<SourceImage> {
    if !path.is_file() {
        return Err(anyhow!("No se encontró el archivo: {}", path.display()));
    }
    let mime_type = mime_for_path(path)
        .ok_or_else(|| anyhow!("Tipo de imagen no soportado: {}", path.display()))?;
    Ok(SourceImage {
        path: path.to_path_buf(),
        mime_type: mime_type.to_string(),
    })
}

/// Read a staged file and encode it as an inline generative part.
pub async fn load_inline_part(image: &SourceImage) -> Result<Part> {
    let bytes = tokio::fs::read(&image.path)
        .await
        .with_context(|| format!("No se pudo leer la imagen {}", image.path.display()))?;
    Ok(Part::inline(image.mime_type.as_str(), BASE64.encode(bytes)))
}

pub fn design_to_part(image: &DesignImage) -> Part {
    Part::inline(image.mime_type.as_str(), image.data.as_str())
}

/// Decode a delivered design and write it to disk as a timestamped PNG.
/// Purely local, no network involved.
pub fn save_design(image: &DesignImage, dir: &Path) -> Result<PathBuf> {
    let bytes = BASE64
        .decode(&image.data)
        .context("La imagen generada no se pudo decodificar")?;
    let name = format!(
        "diseno-visioneer-{}.png",
        Local::now().format("%Y%m%d-%H%M%S")
    );
    let path = dir.join(name);
    std::fs::write(&path, bytes)
        .with_context(|| format!("No se pudo guardar la imagen en {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_known_extensions() {
        assert_eq!(mime_for_path(Path::new("sala.jpg")), Some("image/jpeg"));
        assert_eq!(mime_for_path(Path::new("sala.JPEG")), Some("image/jpeg"));
        assert_eq!(mime_for_path(Path::new("jardin.png")), Some("image/png"));
        assert_eq!(mime_for_path(Path::new("patio.webp")), Some("image/webp"));
    }

    #[test]
    fn test_mime_rejects_unknown_extensions() {
        assert_eq!(mime_for_path(Path::new("notas.txt")), None);
        assert_eq!(mime_for_path(Path::new("sin_extension")), None);
    }

    #[test]
    fn test_stage_rejects_missing_file() {
        let err = stage_source_image(Path::new("/no/existe/sala.png")).unwrap_err();
        assert!(err.to_string().contains("No se encontró"));
    }

    #[test]
    fn test_stage_rejects_unsupported_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notas.txt");
        std::fs::write(&path, b"hola").unwrap();

        let err = stage_source_image(&path).unwrap_err();
        assert!(err.to_string().contains("no soportado"));
    }

    #[test]
    fn test_stage_accepts_supported_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sala.png");
        std::fs::write(&path, b"png-bytes").unwrap();

        let image = stage_source_image(&path).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.path, path);
    }

    #[test]
    fn test_save_design_writes_decoded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let image = DesignImage {
            data: BASE64.encode(b"fake-image-bytes"),
            mime_type: "image/png".to_string(),
        };

        let path = save_design(&image, dir.path()).unwrap();
        assert!(path.file_name().unwrap().to_str().unwrap().ends_with(".png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"fake-image-bytes");
    }

    #[test]
    fn test_save_design_rejects_bad_base64() {
        let dir = tempfile::tempdir().unwrap();
        let image = DesignImage {
            data: "%%no-es-base64%%".to_string(),
            mime_type: "image/png".to_string(),
        };
        assert!(save_design(&image, dir.path()).is_err());
    }
}
