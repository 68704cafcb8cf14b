//! Value Objects - Immutable, identity-less domain primitives

mod admin_entity;
mod coordinate;

pub use admin_entity::AdminEntity;
pub use coordinate::{Coordinate, InvalidCoordinates};
