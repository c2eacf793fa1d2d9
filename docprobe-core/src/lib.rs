pub mod classify;
pub mod error;
pub mod export;
pub mod generate;
pub mod model;
pub mod parse;
pub mod pipeline;

#[cfg(test)]
mod tests;
