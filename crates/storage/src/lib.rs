#![forbid(unsafe_code)]

pub mod repository;
pub mod samples;
pub mod sqlite;
