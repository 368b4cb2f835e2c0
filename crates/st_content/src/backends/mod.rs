pub mod memory;
pub mod prismic;

pub use memory::MemoryContentClient;
pub use prismic::{PrismicClient, PrismicConfig};
