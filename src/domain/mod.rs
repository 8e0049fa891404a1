pub mod encoder;
pub mod label;
pub mod models;
pub mod settings;
pub mod tspl;
