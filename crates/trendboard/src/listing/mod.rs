mod engine;
mod request;
mod result;
mod strategy;
#[cfg(test)]
mod tests;

pub use engine::*;
pub use request::*;
pub use result::*;
pub use strategy::*;
