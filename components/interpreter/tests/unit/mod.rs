//! Unit tests for interpreter components

mod test_memory;
