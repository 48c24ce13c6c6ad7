pub mod predictions;
pub mod server;
