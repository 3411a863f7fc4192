pub mod latex_converter;
pub mod question_service;

pub use latex_converter::{Delimiter, LatexConverter};
pub use question_service::QuestionService;
