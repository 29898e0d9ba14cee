//! # Equipment Interface
//!
//! This module defines the interface structures which are exchanged with the hand equipment.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod hand;
pub mod tactile;
