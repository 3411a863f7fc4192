pub mod convert;
pub mod cors;
pub mod extract;
pub mod homepage;
