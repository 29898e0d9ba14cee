//! # Hand library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the hand crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Action server - queues trajectory goals and runs them on the executor thread
pub mod action_server;

/// Coordinate mapper - converts between planner and hand axis orderings
pub mod coord_map;

/// Control surface - tactile services and contact frame broadcast
pub mod ctrl_surface;

/// Hand context - state shared between the feed handlers and the executor
pub mod hand_ctx;

/// Interfaces to the hand driver and action clients
pub mod hand_if;

/// Executable parameters
pub mod params;

/// Simulated hand
pub mod sim_hand;

/// Shared state store - latest joint and tactile data
pub mod state_store;

/// Tactile fusion - turns taxel readings into DOF masks and contact frames
pub mod tactile;

/// Trajectory executor - drives the hand along trajectories
pub mod traj_exec;
