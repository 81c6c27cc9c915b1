//! Wires the `World` trait to real storage and exposes the dispatcher that
//! runs a verb end to end: resolve through the prototype chain, build a
//! root [`wov_core::context::Context`], hand it to the interpreter, and
//! translate whatever comes back (or escapes) into the caller-facing shape.

#![deny(unsafe_code)]

pub mod dispatcher;
pub mod world_impl;

pub use dispatcher::Dispatcher;
pub use world_impl::WorldImpl;
