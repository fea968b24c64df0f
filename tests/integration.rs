// tests/integration.rs

mod common;

mod integration {
    mod cli_config;
    mod error_handling;
    mod fs_abstraction;
    mod standard_tasks;
}
