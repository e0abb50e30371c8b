pub mod assets;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;

pub use assets::AssetClient;
pub use client::ContentGateway;
pub use config::GatewayConfig;
pub use credentials::Credentials;
pub use error::GatewayError;
