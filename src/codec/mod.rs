pub mod resources;

use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::{
    error::{Result, StudioError},
    gemini::GenerationClient,
    models::MediaAttachment,
};

pub use resources::{ResourceGuard, ResourceRegistry};

const IMAGE_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
    ("heic", "image/heic"),
    ("heif", "image/heif"),
    ("bmp", "image/bmp"),
];

/// MIME type declared by a file's extension.
pub fn content_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    IMAGE_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}

/// Extension for saving an artifact of this type. Unknown types save as PNG.
pub fn file_extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "video/mp4" => "mp4",
        _ => "png",
    }
}

pub fn encode_bytes(bytes: &[u8], content_type: impl Into<String>) -> MediaAttachment {
    MediaAttachment::new(BASE64.encode(bytes), content_type)
}

/// Reads an image file fully and encodes it for upload.
pub async fn encode_file(path: impl AsRef<Path>) -> Result<MediaAttachment> {
    let path = path.as_ref();
    let content_type = content_type_for_path(path).ok_or_else(|| {
        StudioError::Decode(format!("{} is not a supported image file", path.display()))
    })?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| StudioError::Decode(format!("failed to read {}: {}", path.display(), e)))?;
    log::debug!(
        "Encoded {} ({} bytes, {})",
        path.display(),
        bytes.len(),
        content_type
    );
    Ok(encode_bytes(&bytes, content_type))
}

pub fn to_data_uri(attachment: &MediaAttachment) -> String {
    format!("data:{};base64,{}", attachment.content_type, attachment.data)
}

/// Parses a `data:<mime>;base64,<payload>` URI back into raw bytes.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| StudioError::Decode("not a data URI".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| StudioError::Decode("data URI has no payload".into()))?;
    let content_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| StudioError::Decode("data URI is not base64-encoded".into()))?;
    let bytes = BASE64
        .decode(payload.as_bytes())
        .map_err(|e| StudioError::Decode(e.to_string()))?;
    Ok((content_type.to_string(), bytes))
}

pub fn decode_attachment(attachment: &MediaAttachment) -> Result<Vec<u8>> {
    BASE64
        .decode(attachment.data.as_bytes())
        .map_err(|e| StudioError::Decode(e.to_string()))
}

/// Writes a returned image to disk.
pub async fn save_attachment(attachment: &MediaAttachment, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let bytes = decode_attachment(attachment)?;
    tokio::fs::write(path, &bytes)
        .await
        .map_err(|e| StudioError::Storage(format!("failed to write {}: {}", path.display(), e)))?;
    log::info!("Saved {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Downloads a remote artifact once and registers it locally.
pub async fn fetch_resource(
    client: &dyn GenerationClient,
    uri: &str,
    content_type: &str,
    registry: &ResourceRegistry,
) -> Result<ResourceGuard> {
    let bytes = client.download(uri).await?;
    if bytes.is_empty() {
        return Err(StudioError::Decode("downloaded artifact is empty".into()));
    }
    Ok(registry.acquire(bytes, content_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_uri_round_trip() {
        let original: Vec<u8> = (0u8..=255).collect();
        let attachment = encode_bytes(&original, "image/png");
        let (content_type, bytes) = decode_data_uri(&to_data_uri(&attachment)).unwrap();
        assert_eq!(content_type, "image/png");
        assert_eq!(bytes, original);
    }

    #[test]
    fn test_round_trip_empty_payload() {
        let attachment = encode_bytes(&[], "image/gif");
        let (content_type, bytes) = decode_data_uri(&to_data_uri(&attachment)).unwrap();
        assert_eq!(content_type, "image/gif");
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_malformed_data_uris() {
        assert!(decode_data_uri("http://x").is_err());
        assert!(decode_data_uri("data:image/png;base64").is_err());
        assert!(decode_data_uri("data:image/png,abc").is_err());
        assert!(decode_data_uri("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(content_type_for_path(Path::new("a/b.JPG")), Some("image/jpeg"));
        assert_eq!(content_type_for_path(Path::new("face.webp")), Some("image/webp"));
        assert_eq!(content_type_for_path(Path::new("notes.txt")), None);
        assert_eq!(content_type_for_path(Path::new("noext")), None);
    }

    #[test]
    fn test_extension_for_content_type() {
        assert_eq!(file_extension_for("image/jpeg"), "jpg");
        assert_eq!(file_extension_for("video/mp4"), "mp4");
        assert_eq!(file_extension_for("image/png"), "png");
        assert_eq!(file_extension_for("application/octet-stream"), "png");

        let saved_as = format!("edited.{}", file_extension_for("image/webp"));
        assert_eq!(content_type_for_path(Path::new(&saved_as)), Some("image/webp"));
    }

    #[tokio::test]
    async fn test_encode_file_reads_and_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subject.png");
        std::fs::write(&path, b"\x89PNG fake").unwrap();

        let attachment = encode_file(&path).await.unwrap();
        assert_eq!(attachment.content_type, "image/png");
        assert_eq!(decode_attachment(&attachment).unwrap(), b"\x89PNG fake");
    }

    #[tokio::test]
    async fn test_encode_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        assert!(matches!(
            encode_file(&missing).await,
            Err(StudioError::Decode(_))
        ));

        let text = dir.path().join("notes.txt");
        std::fs::write(&text, b"hi").unwrap();
        assert!(matches!(encode_file(&text).await, Err(StudioError::Decode(_))));
    }
}
