//! Server runtime: bootstrap, the periodic sweeps that drive the standup
//! lifecycle, the submission recording service, and the health endpoint.

pub mod bootstrap;
pub mod health;
pub mod submissions;
pub mod sweeps;
