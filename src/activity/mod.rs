//! Shared activity state: the counter every monitor feeds and the control
//! loop drains.

pub mod counter;

pub use counter::SharedCounter;
