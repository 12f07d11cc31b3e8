//! Built-in listeners that are not part of the default surface.

mod log;

pub use log::LogWriter;
