pub mod accessor;
pub mod cli;
pub mod consts;
pub mod controller;
pub mod function;
pub mod server;
pub mod types;
