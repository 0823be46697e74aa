//! Property test modules

mod classify_tests;
mod parser_tests;
mod policy_tests;
