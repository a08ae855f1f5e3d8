//! Trash physics
//!
//! Everything here is plain data plus pure step functions:
//! - Fixed timestep only (cleaning progress is the one real-time exception)
//! - Randomness is always injected by the caller
//! - Stable iteration order (creation order of bodies)
//! - No rendering or platform dependencies

pub mod ambient;
pub mod body;
pub mod collision;
pub mod tick;

pub use ambient::AmbientMotion;
pub use body::{Body, BodyId, BodyStore};
pub use collision::{CollisionInfo, WallContact, check_collision, collision_info, resolve_collision, resolve_walls};
pub use tick::{Physics, PhysicsReport, step};
