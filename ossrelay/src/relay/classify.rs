//! Content sniffing for relayed files.
//!
//! Classification looks only at the leading bytes, never at the filename, so a mislabeled or
//! extensionless file is still linked correctly.

/// Magic of a binary glTF container: ASCII "glTF" followed by a little-endian u32 version.
const GLB_MAGIC: &[u8; 4] = b"glTF";
/// Container versions 1 and 2, little-endian.
const GLB_VERSIONS: [[u8; 4]; 2] = [[1, 0, 0, 0], [2, 0, 0, 0]];

/// Coarse content category, deciding which public URL (if any) a stored object gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// PNG or JPEG image
    Image,
    /// Binary glTF (`.glb`) scene
    ModelBinary,
    Unknown,
}

impl ContentKind {
    /// MIME type recorded on the stored object
    pub fn content_type(self, bytes: &[u8]) -> &'static str {
        match self {
            ContentKind::Image => infer::get(bytes).map(|kind| kind.mime_type()).unwrap_or("image/png"),
            ContentKind::ModelBinary => "model/gltf-binary",
            ContentKind::Unknown => "application/octet-stream",
        }
    }
}

/// Classify `bytes` by their signature.
pub fn classify(bytes: &[u8]) -> ContentKind {
    if is_binary_gltf(bytes) {
        return ContentKind::ModelBinary;
    }

    match infer::get(bytes).map(|kind| kind.mime_type()) {
        Some("image/png" | "image/jpeg") => ContentKind::Image,
        _ => ContentKind::Unknown,
    }
}

fn is_binary_gltf(bytes: &[u8]) -> bool {
    match bytes.get(..8) {
        Some(header) => header.starts_with(GLB_MAGIC) && GLB_VERSIONS.iter().any(|v| header[4..] == v[..]),
        None => false,
    }
}
