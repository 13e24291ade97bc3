//! Stave Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Stave spacing
//! engine and its front ends. It includes:
//!
//! - **Units**: logical and symbolic time units ([`units`] module)
//! - **Geometry**: basic geometric types ([`geometry`] module)
//! - **Indices**: typed arena indices ([`index`] module)
//! - **Symbols**: the ordered symbol table consumed by the engine ([`symbol`] module)
//! - **Shapes**: measured and positioned shapes plus the measurement
//!   service ([`shape`] module)

pub mod geometry;
pub mod index;
pub mod shape;
pub mod symbol;
pub mod units;
