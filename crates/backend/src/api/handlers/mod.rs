// Catalog taxonomy
pub mod catalog;

// Aggregate handlers
pub mod a001_product;
pub mod a002_publication;

// Dashboard handlers
pub mod d100_admin_summary;
