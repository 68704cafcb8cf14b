//! Domain layer for the Cercalia client
//!
//! Value objects shared by every service: coordinates and administrative
//! entities. No I/O lives here.

pub mod value_objects;

pub use value_objects::*;
