pub mod error;
pub mod report;
pub mod runner;
pub mod scenes;

pub use error::HeadlessError;
