pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Daemon, Files, Health, Init, Login, Redeem, Token, Upload, Version};
