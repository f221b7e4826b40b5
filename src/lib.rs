//! Trailguide library exports for testing

pub mod api;
pub mod core;
pub mod storage;

#[cfg(test)]
pub mod test_support;
