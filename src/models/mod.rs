pub mod indicators;
pub mod price;
pub mod signal;
