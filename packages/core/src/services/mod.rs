//! Service Layer
//!
//! - [`TransferService`] - import/export orchestration over a
//!   [`GraphStore`](crate::db::GraphStore)
//! - [`TransferError`] - unified error for every pipeline stage

mod error;
mod transfer_service;

pub use error::TransferError;
pub use transfer_service::{ExportReport, ImportReport, TransferService};
