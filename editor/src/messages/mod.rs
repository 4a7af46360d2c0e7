//! The root-level messages forming the first layer of the message system architecture.

pub mod bake;
pub mod material;
pub mod message;
pub mod preferences;
pub mod prelude;
pub mod response;
