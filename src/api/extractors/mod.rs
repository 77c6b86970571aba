//! Custom request extractors.

mod client;
mod validated_json;

pub use client::{client_ip, Client};
pub use validated_json::ValidatedJson;
