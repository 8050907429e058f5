//! Image and video assets carried by shots.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

/// Default MIME type for generated stills.
pub const DEFAULT_IMAGE_MIME: &str = "image/png";
/// Default MIME type for generated clips.
pub const DEFAULT_VIDEO_MIME: &str = "video/mp4";

/// A still image held inline.
///
/// Serialized with the pixel payload as base64, which is also the encoding the
/// generation APIs accept for inline data.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImageAsset {
    /// Encoded image bytes (PNG, JPEG, WebP, ...)
    #[serde(serialize_with = "serialize_base64", deserialize_with = "deserialize_base64")]
    #[schemars(with = "String")]
    pub data: Vec<u8>,
    /// MIME type of `data`
    pub mime_type: String,
}

impl ImageAsset {
    /// Create an image asset from raw bytes.
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    /// Decode an image asset from a base64 payload.
    pub fn from_base64(
        encoded: &str,
        mime_type: impl Into<String>,
    ) -> Result<Self, base64::DecodeError> {
        Ok(Self::new(BASE64.decode(encoded.trim())?, mime_type))
    }

    /// Parse a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (mime, payload) = rest.split_once(";base64,")?;
        Self::from_base64(payload, mime).ok()
    }

    /// Base64 encoding of the payload.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.data)
    }

    /// Render as a `data:` URL.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

// Payloads are large; keep debug output readable.
impl fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAsset")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// A finished, playable video clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VideoAsset {
    /// Local file path or http(s) URL readable by FFmpeg
    pub uri: String,
    /// MIME type of the clip
    pub mime_type: String,
}

impl VideoAsset {
    /// Create a video asset reference.
    pub fn new(uri: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Reference a local MP4 file.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(path.into().to_string_lossy().to_string(), DEFAULT_VIDEO_MIME)
    }

    /// Whether the clip lives behind an http(s) URL.
    pub fn is_remote(&self) -> bool {
        url::Url::parse(&self.uri)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false)
    }

    /// Local path of the clip, if it is not remote.
    pub fn local_path(&self) -> Option<PathBuf> {
        if self.is_remote() {
            None
        } else {
            Some(PathBuf::from(self.uri.trim_start_matches("file://")))
        }
    }
}

fn serialize_base64<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&BASE64.encode(data))
}

fn deserialize_base64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    BASE64.decode(encoded.trim()).map_err(serde::de::Error::custom)
}
