pub mod backups;
pub mod dataset;

pub use dataset::{DatasetStore, SaveReport, StoreError};
