pub mod firestore_client;
pub mod firestore_value;
pub mod mathjax_client;

pub use firestore_client::{FirestoreClient, QuestionStore};
pub use mathjax_client::{InputFormat, MathJaxClient, MathRenderer};
