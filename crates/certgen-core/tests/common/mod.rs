//! Shared helpers for generation tests

#![allow(dead_code)]

pub mod font;
pub mod pdf;
