//! DDR2 controller and PHY bring-up for the PIC32MZ DA
//!
//! Turns a DRAM part's datasheet timings, the board's address geometry and
//! the memory clock into the exact register image the on-chip DDR2
//! controller and PHY need, then writes it through a [`platform::RegisterBus`]
//! in the one order the hardware accepts.
//!
//! # Layers
//!
//! ```text
//! initialize_dram (orchestrator)
//!     ↓
//! ControllerImage / ArbiterImage / PhyImage / HostCommandScript
//!     ↓
//! regs (typed register layouts, range-checked packing)
//!     ↓
//! platform::RegisterBus + platform::Monotonic
//! ```
//!
//! Everything above `platform` is pure computation until the final write
//! pass, so the whole sequence runs on the host against
//! `platform::mocks::MockRegisterBus`.
//!
//! # Features
//!
//! - `defmt`: log through `defmt` and derive `defmt::Format`
//! - `tracing`: log through `tracing` (host builds)
//! - `serde`: (de)serialize board-level configuration
//!
//! # Example
//!
//! ```no_run
//! use ddr2::{initialize_dram, BootContext};
//! use platform::{Monotonic, RegisterBus};
//!
//! fn bring_up<B: RegisterBus, C: Monotonic>(bus: &mut B, clock: &C) -> Result<u64, ddr2::Ddr2Error> {
//!     let report = initialize_dram(bus, clock, &BootContext::pic32mzda_starter_kit())?;
//!     Ok(report.size_bytes)
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
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_code)] // register access lives behind RegisterBus
#![warn(clippy::print_stdout)]
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod log;

pub mod address;
pub mod arbiter;
pub mod convert;
pub mod error;
pub mod geometry;
pub mod host_cmd;
pub mod mode;
pub mod orchestrator;
pub mod phy;
pub mod regs;
pub mod timing;

pub use address::{ControllerImage, ControllerWords};
pub use arbiter::{AgentLimits, ArbiterImage, ArbiterParams, ArbiterParamsSource, DefaultArbiter};
pub use convert::{ClockDomain, ClockPeriod, MemoryClocks, Picoseconds, TimingParam};
pub use error::{Ddr2Error, FieldOverflow, WaitStage};
pub use geometry::{AddressGeometry, GeometryError};
pub use host_cmd::{HostCommand, HostCommandScript, HostCommandSequencer, HostOpcode, SequencerState};
pub use orchestrator::{
    initialize_dram, ungate_controller, BootContext, Ddr2Blocks, DramInitReport, TimeoutPolicy,
};
pub use phy::{CalibrationOutcome, PhyCalibrator, PhyConfig, PhyImage};
pub use timing::TimingSpec;
