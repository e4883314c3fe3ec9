// src/handlers/mod.rs

pub mod evaluate;
pub mod health;
pub mod practice;
