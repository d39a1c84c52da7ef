//! End-to-end recognition tests.

mod builtin;
mod files;
mod scenario;
