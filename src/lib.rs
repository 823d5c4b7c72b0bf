pub mod api;
pub mod config;
pub mod extract;
pub mod playground;
pub mod sandbox;
pub mod state;
pub mod templates;
pub mod types;
pub mod util;

#[cfg(test)]
mod test_support;
