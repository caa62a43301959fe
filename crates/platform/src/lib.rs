//! Boot-time Hardware Abstraction Layer for the PIC32MZ-DA memory bring-up
//!
//! This crate provides the trait seams the DDR2 bring-up core is written
//! against, so the whole sequence can be exercised on the host without a
//! board attached.
//!
//! # Architecture Layers
//!
//! ```text
//! Board layer (firmware crate: MMIO, core timer, memory PLL)
//!         ↓
//! Bring-up core (ddr2 crate)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//! ```
//!
//! # Abstractions
//!
//! - [`RegisterBus`] - 32-bit register read/write primitive
//! - [`Monotonic`] - monotonic elapsed-time source for poll deadlines
//! - [`poll_until`] - the single "poll until condition or deadline" helper
//!
//! # Features
//!
//! - `std`: host-side mocks in [`mocks`]
//! - `defmt`: `defmt::Format` derives on platform types
//!
//! # Example
//!
//! ```no_run
//! use platform::{poll_until, Monotonic, PollPolicy, RegisterBus};
//!
//! fn wait_ready<B: RegisterBus, C: Monotonic>(bus: &mut B, clock: &C) -> bool {
//!     poll_until(clock, PollPolicy::default(), || bus.read32(0x1F80_0100) & (1 << 31) != 0)
//!         .is_ready()
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // hex addresses and register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod mmio;
pub mod time;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

pub use mmio::{RegisterBlock, RegisterBus};
pub use time::{poll_until, Monotonic, PollOutcome, PollPolicy};
