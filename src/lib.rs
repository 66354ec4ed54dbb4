//! Matter color bridge library.
//!
//! Reconciles the separately reported color attributes of Matter color
//! lights into consistent channel states, and translates channel commands
//! back into cluster commands.

pub mod color;
pub mod config;
pub mod error;
pub mod input;
pub mod light;
pub mod matter;
