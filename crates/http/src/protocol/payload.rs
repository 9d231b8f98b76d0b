use bytes::Bytes;
use mime::Mime;

/// A complete, already materialized message body together with its media type.
///
/// Encoders derive `Content-Type` and `Content-Length` from it; the byte length
/// is always the exact length of `bytes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    content_type: Mime,
    bytes: Bytes,
}

impl Payload {
    pub fn new<B: Into<Bytes>>(content_type: Mime, bytes: B) -> Self {
        Self { content_type, bytes: bytes.into() }
    }

    /// UTF-8 plain text payload.
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self::new(mime::TEXT_PLAIN_UTF_8, text.into())
    }

    pub fn content_type(&self) -> &Mime {
        &self.content_type
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}
