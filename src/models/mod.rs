pub mod question;

pub use question::{ConvertRequest, ConvertResponse, ErrorResponse, Question};
