pub mod aggregate;
pub mod engine;
pub mod pipeline;

pub use crate::domain::model::{RackReport, RackSnapshot};
pub use crate::domain::ports::{ConfigProvider, InventorySource, Pipeline, Storage};
pub use crate::utils::error::Result;
