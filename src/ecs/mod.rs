//! World state container

pub mod world;

pub use world::{RangeEntry, SimWorld};
