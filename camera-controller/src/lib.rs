pub mod camera;
pub mod config;
pub mod connection;
pub mod console;
pub mod packet_writer;
pub mod reported;
pub mod transport;

#[cfg(feature = "bluetooth")]
pub mod bluetooth;
