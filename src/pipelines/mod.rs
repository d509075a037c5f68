pub mod sambam;

pub use sambam::SamTools;
