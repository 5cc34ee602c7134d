//! Acceptance checks run on a file before any decoding happens.

use crate::decode;
use crate::types::{NormalizeConfig, NormalizeError};

/// File extensions accepted when the caller has no MIME type.
const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp", "gif"];

/// Check whether a filename has an allowed image extension.
#[must_use]
pub fn has_allowed_extension(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        ALLOWED_EXTENSIONS
            .iter()
            .any(|a| a.eq_ignore_ascii_case(ext))
    })
}

/// Validate an upload against the size limit and type rules.
///
/// A non-empty `media_type` must be an `image/*` type. Without one the
/// magic bytes decide, then the file name's extension.
///
/// # Errors
///
/// Returns [`NormalizeError::EmptyInput`] for an empty file,
/// [`NormalizeError::UploadTooLarge`] past `config.max_upload_bytes`,
/// and [`NormalizeError::UnsupportedType`] for anything not an image.
pub fn check_upload(
    bytes: &[u8],
    name: &str,
    media_type: Option<&str>,
    config: &NormalizeConfig,
) -> Result<(), NormalizeError> {
    if bytes.is_empty() {
        return Err(NormalizeError::EmptyInput);
    }
    if bytes.len() > config.max_upload_bytes {
        return Err(NormalizeError::UploadTooLarge {
            size: bytes.len(),
            limit: config.max_upload_bytes,
        });
    }
    match media_type.filter(|t| !t.is_empty()) {
        Some(t) if t.starts_with("image/") => Ok(()),
        Some(t) => Err(NormalizeError::UnsupportedType(t.to_owned())),
        None if decode::sniff_media_type(bytes).is_some() || has_allowed_extension(name) => {
            Ok(())
        }
        None => Err(NormalizeError::UnsupportedType(name.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(has_allowed_extension("beach.JPG"));
        assert!(has_allowed_extension("a.b.webp"));
        assert!(!has_allowed_extension("notes.txt"));
        assert!(!has_allowed_extension("png"));
    }

    #[test]
    fn accepts_image_media_type() {
        let config = NormalizeConfig::default();
        assert_eq!(check_upload(&[1, 2, 3], "x", Some("image/heic"), &config), Ok(()));
    }

    #[test]
    fn rejects_non_image_media_type() {
        let config = NormalizeConfig::default();
        assert_eq!(
            check_upload(&[1], "doc.png", Some("application/pdf"), &config),
            Err(NormalizeError::UnsupportedType("application/pdf".into()))
        );
    }

    #[test]
    fn falls_back_to_extension() {
        let config = NormalizeConfig::default();
        assert_eq!(check_upload(&[1], "room.jpeg", None, &config), Ok(()));
        assert_eq!(check_upload(&[1], "room.jpeg", Some(""), &config), Ok(()));
        assert!(matches!(
            check_upload(&[1], "room.tiff", None, &config),
            Err(NormalizeError::UnsupportedType(_))
        ));
    }

    #[test]
    fn magic_bytes_stand_in_for_missing_type() {
        let config = NormalizeConfig::default();
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        assert_eq!(check_upload(png, "clipboard", None, &config), Ok(()));
        assert_eq!(
            check_upload(b"plain text", "clipboard", None, &config),
            Err(NormalizeError::UnsupportedType("clipboard".into()))
        );
    }

    #[test]
    fn rejects_empty() {
        let config = NormalizeConfig::default();
        assert_eq!(
            check_upload(&[], "a.png", Some("image/png"), &config),
            Err(NormalizeError::EmptyInput)
        );
    }

    #[test]
    fn size_limit_is_inclusive() {
        let config = NormalizeConfig {
            max_upload_bytes: 4,
            ..NormalizeConfig::default()
        };
        assert_eq!(check_upload(&[0; 4], "a.png", None, &config), Ok(()));
        assert_eq!(
            check_upload(&[0; 5], "a.png", None, &config),
            Err(NormalizeError::UploadTooLarge { size: 5, limit: 4 })
        );
    }
}
