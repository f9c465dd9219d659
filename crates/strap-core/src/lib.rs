pub mod config;
pub mod logging;

pub mod archive;
pub mod checksum;
pub mod error;
pub mod path_env;
pub mod pipeline;
pub mod platform;
pub mod process;
pub mod release;
pub mod transport;
pub mod verify;
