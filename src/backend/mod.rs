//! Adapters onto external vision libraries

pub mod opencv;
