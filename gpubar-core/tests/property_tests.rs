//! Property-based tests for `GpuBar` core library

mod properties;
