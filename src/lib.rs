//! lupa：锁使用模式的静态数据流分析。
//!
//! A program description is loaded into [`ir::Program`], every function is
//! analyzed once per lock it touches, and the acquire/release pairs found
//! are classified into usage patterns. Anomalies such as releasing a lock
//! that is not held are reported as diagnostics.

pub mod analysis;
pub mod concurrency;
pub mod config;
pub mod graph;
pub mod ir;
pub mod memory;
pub mod options;
pub mod report;
pub mod util;
