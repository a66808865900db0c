pub mod api;
pub mod assets;
pub mod server;
pub mod state;
pub mod stream;
