pub mod generator;
pub mod logging;
pub mod session;
pub mod state;
pub mod view;
