mod media_store_cloudinary;

pub use media_store_cloudinary::*;
