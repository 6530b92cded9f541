//! Depth-camera steering for a head-mounted controller
//!
//! Turns depth frames into a steering axis, merges it with inertial sensor
//! fields into a gamepad report, and streams that report over a serial link.

pub mod attitude;
pub mod camera;
pub mod config;
pub mod pipeline;
pub mod report;
pub mod serial;
pub mod steering;
