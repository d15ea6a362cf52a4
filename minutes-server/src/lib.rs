pub mod backend;
pub mod http;
pub mod ui;
pub mod upload;
