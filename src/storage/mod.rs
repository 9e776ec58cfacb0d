//! Content-addressed storage backends

mod memory;
mod pinata;

pub use memory::MemoryContentStore;
pub use pinata::{PinataStore, FALLBACK_MIME_TYPE};
