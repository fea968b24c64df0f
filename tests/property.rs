// tests/property.rs

mod common;

mod property {
    mod scheduler;
    mod transforms;
}
