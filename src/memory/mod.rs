//! The memory spaces of the block machine: global views shared by every lane,
//! block-local arrays, and scoped temporary storage.

mod shared;
mod temporary;
mod unsafe_slice;

pub use shared::SharedArray;
pub use temporary::TemporaryBuffer;
pub use unsafe_slice::UnsafeSlice;
