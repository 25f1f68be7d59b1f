//! Integration tests: full sessions from CSV files on disk.

mod fixture;
mod risk_limits;
mod session_flow;
