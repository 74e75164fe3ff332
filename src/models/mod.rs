pub mod common;
pub mod history;
pub mod image;
pub mod wire;

pub use common::*;
pub use history::*;
pub use image::*;
pub use wire::RemoteImageResponse;
