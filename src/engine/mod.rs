//! Session driver.

pub mod session;

pub use session::{Session, SessionInputs};
