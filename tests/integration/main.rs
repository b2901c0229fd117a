//! Integration tests

mod config_test;
mod engine_props;
mod trader_test;
