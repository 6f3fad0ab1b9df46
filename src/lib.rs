pub mod builtins;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod object;
pub mod parser;
pub mod scanner;
pub mod stmt;
pub mod token;
