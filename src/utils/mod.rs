pub mod command;
pub mod flagstat;
pub mod paths;
pub mod streams;
pub mod validate;
