pub mod tenant;
pub mod text;

mod error;

pub use error::{Error, Result};
