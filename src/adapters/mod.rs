// Adapters layer: concrete implementations for external systems (NetBox HTTP, files, renderers).

pub mod archive;
pub mod cabling;
pub mod dcim;
pub mod dom;
pub mod html;
pub mod pdf;
pub mod storage;
