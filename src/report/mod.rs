//! 锁使用统计报告：每个锁、每个函数以及整个程序。

pub mod diagnostics;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticLog};

use crate::analysis::pattern::LockPattern;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockType {
    Global,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockData {
    pub name: String,
    pub lock_type: LockType,
    pub direct_lock_number: u32,
    pub if_lock_number: u32,
    pub test_lock_number: u32,
    pub other_lock_number: u32,
    /// Classified acquire/release pairs.
    pub lock_usage: u32,
    pub acquire_number: u32,
    pub release_number: u32,
    /// 0 for direct primitive calls, one more per wrapper layer.
    pub call_depth: u32,
    pub lock_wrapper: bool,
    pub unlock_wrapper: bool,
}

impl LockData {
    pub fn new(name: impl Into<String>, lock_type: LockType) -> Self {
        Self {
            name: name.into(),
            lock_type,
            direct_lock_number: 0,
            if_lock_number: 0,
            test_lock_number: 0,
            other_lock_number: 0,
            lock_usage: 0,
            acquire_number: 0,
            release_number: 0,
            call_depth: 0,
            lock_wrapper: false,
            unlock_wrapper: false,
        }
    }

    pub fn record(&mut self, pattern: LockPattern) {
        match pattern {
            LockPattern::Direct => self.direct_lock_number += 1,
            LockPattern::IfGuarded => self.if_lock_number += 1,
            LockPattern::TestBeforeUse => self.test_lock_number += 1,
            LockPattern::Other => self.other_lock_number += 1,
        }
        self.lock_usage += 1;
    }

    pub fn is_lock_wrapper(&self) -> bool {
        self.lock_wrapper
    }

    pub fn is_unlock_wrapper(&self) -> bool {
        self.unlock_wrapper
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionStatistic {
    pub function_name: String,
    pub lock_number: usize,
    pub global_lock_number: usize,
    pub local_lock_number: usize,
    pub recursive: bool,
    /// False when some lock's fixpoint hit the step limit.
    pub converged: bool,
    pub locks: Vec<LockData>,
}

impl FunctionStatistic {
    pub fn new(function_name: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            converged: true,
            ..Default::default()
        }
    }

    pub fn push_lock(&mut self, lock: LockData) {
        match lock.lock_type {
            LockType::Global => self.global_lock_number += 1,
            LockType::Local => self.local_lock_number += 1,
        }
        self.lock_number += 1;
        self.locks.push(lock);
    }

    /// Every lock the function touches is only acquired.
    pub fn is_lock_wrapper(&self) -> bool {
        !self.locks.is_empty() && self.locks.iter().all(LockData::is_lock_wrapper)
    }

    /// Every lock the function touches is only released.
    pub fn is_unlock_wrapper(&self) -> bool {
        !self.locks.is_empty() && self.locks.iter().all(LockData::is_unlock_wrapper)
    }

    pub fn count(&self, pattern: LockPattern) -> u32 {
        self.locks
            .iter()
            .map(|l| match pattern {
                LockPattern::Direct => l.direct_lock_number,
                LockPattern::IfGuarded => l.if_lock_number,
                LockPattern::TestBeforeUse => l.test_lock_number,
                LockPattern::Other => l.other_lock_number,
            })
            .sum()
    }

    pub fn lock(&self, name: &str) -> Option<&LockData> {
        self.locks.iter().find(|l| l.name == name)
    }
}

impl fmt::Display for FunctionStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "function {}: {} locks ({} global, {} local){}",
            self.function_name,
            self.lock_number,
            self.global_lock_number,
            self.local_lock_number,
            if self.recursive { ", recursive" } else { "" }
        )?;
        for lock in &self.locks {
            write!(
                f,
                "  {} direct={} if={} test={} other={} depth={}",
                lock.name,
                lock.direct_lock_number,
                lock.if_lock_number,
                lock.test_lock_number,
                lock.other_lock_number,
                lock.call_depth
            )?;
            if lock.lock_wrapper {
                write!(f, " [lock wrapper]")?;
            }
            if lock.unlock_wrapper {
                write!(f, " [unlock wrapper]")?;
            }
            writeln!(f)?;
        }
        if !self.converged {
            writeln!(f, "  (step limit reached, results are partial)")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleStatistic {
    pub application_name: String,
    pub function_number: usize,
    pub lock_function_number: usize,
    pub functions: Vec<FunctionStatistic>,
    pub diagnostics: Vec<Diagnostic>,
    pub warnings: Vec<String>,
    pub analysis_time: Duration,
}

impl ModuleStatistic {
    pub fn new(application_name: impl Into<String>) -> Self {
        Self {
            application_name: application_name.into(),
            function_number: 0,
            lock_function_number: 0,
            functions: Vec::new(),
            diagnostics: Vec::new(),
            warnings: Vec::new(),
            analysis_time: Duration::default(),
        }
    }

    pub fn function(&self, name: &str) -> Option<&FunctionStatistic> {
        self.functions.iter().find(|f| f.function_name == name)
    }

    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    pub fn total(&self, pattern: LockPattern) -> u32 {
        self.functions.iter().map(|f| f.count(pattern)).sum()
    }

    pub fn save_to_file(&self, path: &str) -> std::io::Result<()> {
        use std::fs::File;
        use std::io::Write;

        let mut file = File::create(path)?;
        writeln!(file, "{}", self)?;

        let json_path = format!("{}.json", path);
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(json_path, json.as_bytes())?;

        Ok(())
    }
}

impl fmt::Display for ModuleStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lock usage report for {}", self.application_name)?;
        writeln!(f, "Analysis time: {:?}", self.analysis_time)?;
        writeln!(
            f,
            "Functions: {} ({} use locks)",
            self.function_number, self.lock_function_number
        )?;
        writeln!(
            f,
            "Patterns: direct={} if={} test={} other={}",
            self.total(LockPattern::Direct),
            self.total(LockPattern::IfGuarded),
            self.total(LockPattern::TestBeforeUse),
            self.total(LockPattern::Other)
        )?;
        for function in &self.functions {
            write!(f, "\n{}", function)?;
        }
        if !self.diagnostics.is_empty() {
            writeln!(f, "\nDiagnostics:")?;
            for diagnostic in &self.diagnostics {
                writeln!(f, "  {}", diagnostic)?;
            }
        }
        Ok(())
    }
}
