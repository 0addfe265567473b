pub mod config;
pub mod data;
pub mod error;
pub mod media;
pub mod text;
pub mod whatsapp;
