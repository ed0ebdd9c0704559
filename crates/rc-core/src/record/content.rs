use serde::{Deserialize, Serialize};

/// Tag describing the payload variant of a clipboard entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Text,
    Url,
    Image,
    File,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Url => "url",
            ContentType::Image => "image",
            ContentType::File => "file",
        }
    }
}

impl From<&str> for ContentType {
    /// Unknown tags fall back to `Text`.
    fn from(s: &str) -> Self {
        match s {
            "url" => ContentType::Url,
            "image" => ContentType::Image,
            "file" => ContentType::File,
            _ => ContentType::Text,
        }
    }
}

/// Opaque clipboard payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClipboardContent {
    Text { text: String },
    Url { url: String },
    Image { mime: String, bytes: Vec<u8> },
    File { name: String, bytes: Vec<u8> },
}

impl ClipboardContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self::Url { url: url.into() }
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            Self::Text { .. } => ContentType::Text,
            Self::Url { .. } => ContentType::Url,
            Self::Image { .. } => ContentType::Image,
            Self::File { .. } => ContentType::File,
        }
    }

    /// Raw payload bytes. For files the name is part of the identity.
    pub fn payload_bytes(&self) -> Vec<u8> {
        match self {
            Self::Text { text } => text.as_bytes().to_vec(),
            Self::Url { url } => url.as_bytes().to_vec(),
            Self::Image { mime, bytes } => {
                let mut out = Vec::with_capacity(mime.len() + 1 + bytes.len());
                out.extend_from_slice(mime.as_bytes());
                out.push(0);
                out.extend_from_slice(bytes);
                out
            }
            Self::File { name, bytes } => {
                let mut out = Vec::with_capacity(name.len() + 1 + bytes.len());
                out.extend_from_slice(name.as_bytes());
                out.push(0);
                out.extend_from_slice(bytes);
                out
            }
        }
    }

    /// Bytes fed into the fingerprint hash: type tag, separator, payload.
    pub fn fingerprint_input(&self) -> Vec<u8> {
        let tag = self.content_type().as_str().as_bytes();
        let payload = self.payload_bytes();
        let mut out = Vec::with_capacity(tag.len() + 1 + payload.len());
        out.extend_from_slice(tag);
        out.push(0);
        out.extend_from_slice(&payload);
        out
    }

    /// Textual view used by the similarity fallback; binary payloads have none.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Url { url } => Some(url),
            _ => None,
        }
    }

    /// Size used by the completeness tiebreak.
    pub fn len(&self) -> usize {
        match self {
            Self::Text { text } => text.chars().count(),
            Self::Url { url } => url.chars().count(),
            Self::Image { bytes, .. } | Self::File { bytes, .. } => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
