pub mod bridge;
pub mod stdio;
pub mod tooling;
