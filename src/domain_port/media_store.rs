#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("upload rejected: {0}")]
    Rejected(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Remote media host the avatar/cover uploads land on. The service only
/// ever needs the public URL back; storage layout is the host's business.
#[async_trait::async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload_image(&self, bytes: Vec<u8>, content_type: &str)
    -> Result<String, MediaError>;
}
