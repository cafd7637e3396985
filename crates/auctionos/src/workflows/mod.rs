pub mod import;
pub mod listing;
pub mod regions;
