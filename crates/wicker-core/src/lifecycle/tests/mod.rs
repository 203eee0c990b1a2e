// Lifecycle stage engine test module
#[cfg(test)]
mod engine_tests;
