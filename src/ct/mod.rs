pub mod client;
pub mod follower;
pub mod leaf;

pub use follower::{import_certificates, CtConfig};
