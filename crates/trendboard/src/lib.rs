#![doc = include_str!("../README.md")]

mod error;
mod generator;
mod id;
mod listing;
mod store;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::listing::*;
pub use crate::store::*;
pub use crate::time::*;
