//! Geometry, physics, and scene seeding for the Ubiquity simulation.
//!
//! This crate models the physical world the wavefronts travel through:
//! obstacle geometry, the per-mode physics profiles, and the default scene
//! the host starts from.
//!
//! # Modules
//!
//! - [`geometry`] -- Segment/rectangle intersection, wall crossings, mirror
//!   reflection, echo image points.
//! - [`physics`] -- Mode profiles, attenuation, distance falloff, and
//!   gravitational time dilation.
//! - [`scene`] -- Default orchestrator, agent clusters, mode-specific
//!   starting obstacles, and random obstacle placement.

pub mod geometry;
pub mod physics;
pub mod scene;

// Re-export primary types at crate root.
pub use physics::{PhysicsProfile, profile};
pub use scene::{ORCHESTRATOR_ID, Scene, initial_objects, random_object, seed_scene};
