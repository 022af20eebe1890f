pub mod dictionary;
pub mod tokenizer;
