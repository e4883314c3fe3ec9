// src/models/mod.rs

pub mod submission;
pub mod verdict;
