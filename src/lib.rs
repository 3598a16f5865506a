//! Wildgrove - needs-driven agent simulation on procedural tile worlds

pub mod core;
pub mod entity;
pub mod persistence;
pub mod simulation;
pub mod spatial;
pub mod world;
