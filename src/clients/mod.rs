pub mod cloudinary;
pub mod local_photos;
pub mod photo_store;

pub use cloudinary::CloudinaryStore;
pub use local_photos::LocalPhotoStore;
pub use photo_store::{PhotoStore, PhotoStoreError, StoredPhoto};
