pub mod aggregate;
pub mod config;
pub mod plot;
pub mod result;
pub mod style;
pub mod util;
