//! SQL for each table. Every function runs on a borrowed connection so
//! callers decide the transaction boundary.

pub mod folder;
pub mod folder_type;
pub mod layer;
pub mod reference;

pub use folder::FolderRepository;
pub use folder_type::FolderTypeRepository;
pub use layer::LayerRepository;
pub use reference::ReferenceRepository;
