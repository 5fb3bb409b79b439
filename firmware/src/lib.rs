#![cfg_attr(not(feature = "std"), no_std)]

pub mod control;
pub mod resources;
pub mod tasks;

#[cfg(feature = "std")]
pub mod sim;
