pub mod csrf;
pub mod upload;
