pub mod index;
pub mod status;
