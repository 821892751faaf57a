mod client;
mod mock;
mod types;
mod wardrobe;

#[cfg(test)]
mod tests;

pub use client::{HttpStorageClient, StorageService};
pub use mock::MockStorageService;
pub use types::{Garment, UploadRequest, UploadResponse, DEFAULT_CATEGORY, DEFAULT_SEASON};
pub use wardrobe::Wardrobe;
