//! Fleet monitoring for small watercraft: live boat state, distress alerts,
//! local weather and historical track playback.

pub mod config;
pub mod dashboard;
pub mod database;
pub mod distress;
pub mod errors;
pub mod models;
pub mod poller;
pub mod tracking;
pub mod weather;
