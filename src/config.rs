use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::worklist::SelectionOrder;
use crate::memory::AliasKind;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LupaConfig {
    /// Patterns naming acquire primitives, matched against the whole callee name.
    #[serde(default = "default_acquire")]
    pub acquire: Vec<String>,
    #[serde(default = "default_release")]
    pub release: Vec<String>,
    /// Position of the lock operand in primitive calls.
    #[serde(default)]
    pub lock_arg_index: usize,
    /// Minimum alias answer identifying a primitive call's lock with the tracked lock.
    #[serde(default = "default_intra_alias")]
    pub intra_alias: AliasKind,
    /// Minimum alias answer for locks reached through wrapper functions.
    #[serde(default = "default_inter_alias")]
    pub inter_alias: AliasKind,
    /// Worklist steps allowed per (function, lock) run.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Drop branch facts whose path condition contradicts the branch.
    #[serde(default = "default_filter_infeasible")]
    pub filter_infeasible: bool,
    /// Treat calls to lock and unlock wrappers as acquire and release sites.
    #[serde(default = "default_interprocedural")]
    pub interprocedural: bool,
    #[serde(default)]
    pub worklist_order: SelectionOrder,
}

impl Default for LupaConfig {
    fn default() -> Self {
        Self {
            acquire: default_acquire(),
            release: default_release(),
            lock_arg_index: 0,
            intra_alias: default_intra_alias(),
            inter_alias: default_inter_alias(),
            max_steps: default_max_steps(),
            filter_infeasible: default_filter_infeasible(),
            interprocedural: default_interprocedural(),
            worklist_order: SelectionOrder::default(),
        }
    }
}

impl LupaConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: LupaConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }
}

fn default_acquire() -> Vec<String> {
    vec![
        r"pthread_mutex_lock".to_string(),
        r"pthread_mutex_try_?lock".to_string(),
        r"pthread_rwlock_(rd|wr)lock".to_string(),
        r"pthread_spin_lock".to_string(),
        r"rw_lock".to_string(),
    ]
}

fn default_release() -> Vec<String> {
    vec![
        r"pthread_mutex_unlock".to_string(),
        r"pthread_mutex_try_?unlock".to_string(),
        r"pthread_rwlock_unlock".to_string(),
        r"pthread_spin_unlock".to_string(),
        r"rw_unlock".to_string(),
    ]
}

fn default_intra_alias() -> AliasKind {
    AliasKind::Must
}

fn default_inter_alias() -> AliasKind {
    AliasKind::May
}

fn default_max_steps() -> usize {
    100_000
}

fn default_filter_infeasible() -> bool {
    true
}

fn default_interprocedural() -> bool {
    true
}
