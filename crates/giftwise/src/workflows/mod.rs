pub mod access;
pub mod assessment;
