#![doc = include_str!("../README.md")]

pub mod network;
pub mod steps;
pub mod storage;
pub mod tracing;
pub mod world;

pub use network::{MockNetwork, TEST_ORIGIN};
pub use storage::MockStorage;
pub use world::StashboxWorld;
