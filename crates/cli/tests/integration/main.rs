mod common;
mod fetch_tests;
