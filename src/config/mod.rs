//! Configuration management
//!
//! Node settings for proof-of-work difficulty, mining reward and the mining
//! interval, loaded from TOML and the environment.

pub mod settings;

pub use settings::NodeConfig;
