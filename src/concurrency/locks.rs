//! Lock primitives and the call sites that acquire or release locks.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::LupaConfig;
use crate::ir::{Callee, InstKind, Operand, Program};
use crate::util::{FuncId, InstId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockOp {
    Acquire,
    Release,
}

/// Compiled acquire/release name patterns.
pub struct LockApi {
    acquire: Vec<Regex>,
    release: Vec<Regex>,
    lock_arg_index: usize,
}

impl LockApi {
    pub fn new(config: &LupaConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            acquire: compile(&config.acquire)?,
            release: compile(&config.release)?,
            lock_arg_index: config.lock_arg_index,
        })
    }

    pub fn classify(&self, name: &str) -> Option<LockOp> {
        if self.release.iter().any(|re| re.is_match(name)) {
            Some(LockOp::Release)
        } else if self.acquire.iter().any(|re| re.is_match(name)) {
            Some(LockOp::Acquire)
        } else {
            None
        }
    }

    /// The operation and lock operand of a call to a primitive.
    pub fn primitive_call(&self, program: &Program, kind: &InstKind) -> Option<(LockOp, Operand)> {
        let InstKind::Call {
            callee: callee @ Callee::Direct(_),
            args,
        } = kind
        else {
            return None;
        };
        let op = self.classify(program.callee_name(callee)?)?;
        let lock = args.get(self.lock_arg_index).copied()?;
        Some((op, lock))
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, regex::Error> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("^(?:{})$", p)))
        .collect()
}

/// A call that acquires or releases a lock of the calling function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockSite {
    pub inst: InstId,
    pub op: LockOp,
    /// Root of the lock operand, in the caller's scope.
    pub lock: Operand,
    pub callee: FuncId,
    /// Set when the callee is a lock or unlock wrapper rather than a primitive.
    pub via_wrapper: bool,
    /// Wrapper layers between this call and the primitive.
    pub depth: u32,
}
