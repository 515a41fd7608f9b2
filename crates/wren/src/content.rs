mod filter;
mod index;
mod post;
mod sorting;
mod taxonomy;

pub use filter::*;
pub use index::*;
pub use post::*;
pub use sorting::*;
pub use taxonomy::*;
