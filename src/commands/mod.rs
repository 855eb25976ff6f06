pub mod recombine;
pub mod status;
