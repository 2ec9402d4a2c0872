//! # u-calculus
//!
//! Numerical calculus primitives for the U-Engine ecosystem.
//!
//! Scalar root finding with algorithm fallback, arbitrary-order
//! differintegration, and the digamma family of special functions. Every
//! routine works on plain `f64` closures and knows nothing about the
//! domain it is called from.
//!
//! ## Modules
//!
//! - [`roots`] — Brent, bracket-safeguarded Newton and bisection behind
//!   fallback facades; closed-form quadratic and cubic roots
//! - [`differintegrate`] — Riemann–Liouville derivatives and integrals of
//!   real order
//! - [`integrate`] — double-exponential, Gauss–Legendre and adaptive
//!   Gauss–Kronrod quadrature
//! - [`differentiate`] — finite-difference derivatives of any order
//! - [`special`] — gamma, digamma and its inverse, harmonic numbers,
//!   logit/logistic
//! - [`error`] — the shared [`Error`] type
//!
//! ## Design Philosophy
//!
//! - **Fail loudly**: iterative routines either meet their tolerance or
//!   return [`Error::NonConvergence`]
//! - **Stateless**: no global mutable state; everything is safe to call
//!   from many threads at once
//! - **Property-based testing**: mathematical invariants verified via proptest

pub mod differentiate;
pub mod differintegrate;
pub mod error;
pub mod integrate;
pub mod roots;
pub mod special;

pub use error::{Error, Result};
