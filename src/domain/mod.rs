pub mod consumption;
pub mod models;
pub mod statistics;
pub mod units;
pub mod validation;
