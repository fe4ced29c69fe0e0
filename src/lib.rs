//! Reconciles a download directory against the items a torrent client still
//! tracks, and removes the leftovers.
//!
//! The pipeline is strictly sequential: [`scanner::scan`] lists the download
//! root, [`inventory::expected_names`] turns the client inventory into bare
//! names, [`reconcile::reconcile`] partitions the orphans by
//! [`category::ExclusionPolicy`], and [`cleaner::delete_selected`] removes an
//! explicit, already confirmed list.

pub mod category;
pub mod cleaner;
pub mod error;
pub mod inventory;
pub mod reconcile;
pub mod scanner;
pub mod selection;
pub mod size;
