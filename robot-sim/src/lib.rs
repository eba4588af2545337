pub mod config;
pub mod machine;
pub mod motion;
pub mod peer;
