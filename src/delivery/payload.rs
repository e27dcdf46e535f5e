/// Single-file `multipart/form-data` body
///
/// Framing is fixed: one `file` part carrying `audio/wav`, no other fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPayload {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartPayload {
    /// Wrap `file_bytes` as the `file` field named `filename`.
    pub fn wrap(boundary: &str, filename: &str, file_bytes: &[u8]) -> Self {
        let head = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: audio/wav\r\n\r\n"
        );
        let tail = format!("\r\n--{boundary}--\r\n");

        let mut body = Vec::with_capacity(head.len() + file_bytes.len() + tail.len());
        body.extend_from_slice(head.as_bytes());
        body.extend_from_slice(file_bytes);
        body.extend_from_slice(tail.as_bytes());

        Self {
            boundary: boundary.to_string(),
            body,
        }
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

/// Statuses the webhook uses to acknowledge an upload
pub fn is_accepted_status(status: u16) -> bool {
    matches!(status, 200 | 204)
}
