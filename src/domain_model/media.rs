use serde::{Deserialize, Serialize};

/// Which image slot on the user record an upload targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    Avatar,
    CoverImage,
}

impl ImageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKind::Avatar => "avatar",
            ImageKind::CoverImage => "cover_image",
        }
    }
}
