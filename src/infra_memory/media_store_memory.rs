use crate::domain_port::{MediaError, MediaStore};
use sha2::{Digest, Sha256};

/// Content-addressed stand-in for the remote media host.
pub struct MemoryMediaStore;

#[async_trait::async_trait]
impl MediaStore for MemoryMediaStore {
    async fn upload_image(
        &self,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, MediaError> {
        if bytes.is_empty() {
            return Err(MediaError::Rejected("empty upload".to_string()));
        }
        let digest = hex::encode(Sha256::digest(&bytes));
        Ok(format!("memory://media/{}", &digest[..16]))
    }
}
