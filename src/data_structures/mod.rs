mod any_buffer;
mod signature;
mod sparse_pages;

pub use any_buffer::*;
pub use signature::*;
pub use sparse_pages::*;
