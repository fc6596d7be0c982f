//! Window stage bootstrap: framing and fixed-point window coefficients

pub mod coefficients;
pub mod config;
pub mod state;

pub use coefficients::{hann_coefficient, WINDOW_BITS, WINDOW_UNITY};
pub use config::WindowConfig;
pub use state::WindowState;
