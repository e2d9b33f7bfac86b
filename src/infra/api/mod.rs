pub mod http;
pub mod openai;
