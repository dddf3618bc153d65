pub mod constraints;
pub mod insertion;
pub mod recreate;
pub mod solution;
pub mod state;
