// Copyright © 2025 Valve Corporation
// SPDX-License-Identifier: MIT

mod api;
mod builder;
mod cycle_info;
mod insert_delay_alu;
mod ir;
mod reg_tracker;
mod validate;

#[cfg(test)]
mod ir_tests;
#[cfg(test)]
mod test_util;

pub use api::{DebugFlag, DebugFlags, GetDebugFlags, UnknownDebugFlag, DEBUG};
pub use builder::Builder;
pub use cycle_info::ShaderModel11;
pub use insert_delay_alu::{AluDelayInfo, DelayAluState, DelayCtx, LoopTracker};
pub use ir::*;
pub use reg_tracker::SparseRegTracker;
pub use validate::ValidationError;
