pub mod board;
pub mod health;
pub mod overlay;
pub mod sse;
pub mod validation;
