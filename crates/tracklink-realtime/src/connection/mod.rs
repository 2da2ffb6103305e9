//! Connection lifecycle: state, controller and keepalive.

pub mod controller;
pub mod keepalive;
pub mod state;

pub use controller::ConnectionController;
pub use state::ConnectionState;
