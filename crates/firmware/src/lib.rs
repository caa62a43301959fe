//! PIC32MZ DA board support for DRAM boot
//!
//! Supplies the board-side collaborators of the DDR2 bring-up: the register
//! file, the core-timer clock, the memory PLL and per-board profiles, and ties
//! them together in [`boot::bring_up_dram`].
//!
//! # Architecture
//!
//! ```text
//! Boot sequence (boot)
//!         ↓
//! Board collaborators (mmio, core_timer, mpll, board)
//!         ↓
//! DDR2 bring-up core (ddr2)
//!         ↓
//! Platform HAL (platform)
//! ```
//!
//! # Features
//!
//! - `hardware` - Build for the MIPS target (KSEG1 register access, CP0 Count, defmt)
//! - `std` - Host builds: JSON board profiles (`serde`) and `tracing` output
//!
//! # Examples
//!
//! ## Hardware Target
//!
//! ```bash
//! cargo +nightly build -Zbuild-std=core --release --target mipsel-unknown-none -p firmware --features hardware
//! ```
//!
//! ## Host
//!
//! ```bash
//! cargo xtask image --profile boards/pic32mzda-starter-kit.json
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![cfg_attr(
    all(feature = "hardware", any(target_arch = "mips", target_arch = "mips32r6")),
    feature(asm_experimental_arch)
)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(unsafe_op_in_unsafe_fn)]
// unsafe fn body is not implicitly unsafe block
// Logging discipline
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
// Pedantic lints too noisy for firmware application code:
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]

pub mod board;
pub mod boot;
pub mod core_timer;
pub mod mmio;
pub mod mpll;

// Re-export key types
pub use board::BoardProfile;
pub use boot::{bring_up_dram, BootError, BootReport, BOOT_SEQUENCE_STEPS};
pub use core_timer::{CoreTimer, CountSource, CORE_TIMER_HZ};
pub use mmio::{kseg1, Kseg1Bus, KSEG1};
pub use mpll::{MemoryPll, MpllConfig, MpllError, POSC_HZ};
