//! Fare estimation backend: resolves pickup/dropoff points, fetches a driving
//! route, encodes the ride the way the trained model expects and returns a
//! floored fare together with a map description.

pub mod artifacts;
pub mod config;
pub mod coords;
pub mod encoding;
pub mod error;
pub mod fare;
pub mod features;
pub mod map;
pub mod model;
pub mod route;
pub mod server;
pub mod service;
pub mod session;
pub mod types;
