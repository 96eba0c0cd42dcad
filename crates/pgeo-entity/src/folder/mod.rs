//! Folder domain entities.

pub mod classification;
pub mod model;
pub mod view;

pub use classification::{Classification, classify};
pub use model::{Folder, FolderType};
pub use view::FolderView;
