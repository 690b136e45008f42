pub mod branch;
pub mod client;
pub mod model;
pub mod resolver;
pub mod transition;

#[cfg(test)]
pub(crate) mod testing;
