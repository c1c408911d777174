pub mod adb;
pub mod app;
pub mod config;
pub mod container;
pub mod pull;
pub mod rootshell;

pub use adb::DeviceHandle;
