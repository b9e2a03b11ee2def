//! Littoral Assault - hex-grid amphibious assault rules engine

pub mod battle;
pub mod core;
