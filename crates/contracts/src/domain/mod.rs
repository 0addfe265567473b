pub mod a001_product;
pub mod a002_publication;
pub mod common;
