//! 过程间分析：自底向上为每个函数生成锁摘要。
//!
//! Callees are summarized before their callers. A summary records every
//! lock the function touches and whether the function only acquires or only
//! releases it. Calls to such lock and unlock wrappers then count as acquire
//! and release sites in the caller, with the wrapper's lock translated
//! through the call's arguments.

use std::time::Instant;

use indexmap::IndexMap;
use log::{debug, info};

use crate::analysis::controldep::ControlDependence;
use crate::analysis::defuse::DefUseChains;
use crate::analysis::executor::{Executor, FunctionContext, TrackedLock};
use crate::analysis::pattern::{classify, find_pairs};
use crate::analysis::postdom::PostDominators;
use crate::concurrency::locks::{LockApi, LockOp, LockSite};
use crate::config::LupaConfig;
use crate::graph::{BlockGraph, CallGraph};
use crate::ir::{Callee, Operand, Program};
use crate::memory::{AliasId, AliasOracle};
use crate::report::{
    Diagnostic, DiagnosticKind, DiagnosticLog, FunctionStatistic, LockData, LockType,
    ModuleStatistic,
};
use crate::util::{FuncId, InstId};

/// What callers need to know about an analyzed function.
#[derive(Debug, Clone)]
pub struct Summary {
    pub statistic: FunctionStatistic,
    /// Identity of each lock in `statistic.locks`, in the function's own scope.
    pub lock_ids: Vec<AliasId>,
}

/// Functions whose analysis is in progress, innermost last.
#[derive(Debug, Default)]
pub struct CallStack {
    frames: Vec<FuncId>,
}

impl CallStack {
    pub fn push(&mut self, func: FuncId) {
        self.frames.push(func);
    }

    pub fn pop(&mut self) -> Option<FuncId> {
        self.frames.pop()
    }

    pub fn contains(&self, func: FuncId) -> bool {
        self.frames.contains(&func)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// A callee is analyzed on demand unless it is already summarized or its
    /// analysis is in progress higher up, which would close a cycle.
    pub fn should_descend(&self, callee: FuncId, summarized: bool) -> bool {
        !summarized && !self.contains(callee)
    }
}

pub struct InterProcedural<'a> {
    program: &'a Program,
    oracle: &'a dyn AliasOracle,
    config: &'a LupaConfig,
    api: LockApi,
    callgraph: CallGraph,
    summaries: IndexMap<FuncId, Summary>,
    stack: CallStack,
    log: DiagnosticLog,
}

impl<'a> InterProcedural<'a> {
    pub fn new(
        program: &'a Program,
        oracle: &'a dyn AliasOracle,
        config: &'a LupaConfig,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            program,
            oracle,
            config,
            api: LockApi::new(config)?,
            callgraph: CallGraph::new(program),
            summaries: IndexMap::new(),
            stack: CallStack::default(),
            log: DiagnosticLog::new(),
        })
    }

    pub fn callgraph(&self) -> &CallGraph {
        &self.callgraph
    }

    pub fn summary(&self, func: FuncId) -> Option<&Summary> {
        self.summaries.get(&func)
    }

    pub fn run(mut self) -> ModuleStatistic {
        let start = Instant::now();
        let program = self.program;
        for (func, _) in program.defined_functions() {
            self.analyze(func);
        }

        let mut stat = ModuleStatistic::new(program.name.clone());
        for (func, _) in program.defined_functions() {
            let Some(summary) = self.summaries.shift_remove(&func) else {
                continue;
            };
            stat.function_number += 1;
            if summary.statistic.lock_number > 0 {
                stat.lock_function_number += 1;
            }
            stat.functions.push(summary.statistic);
        }
        let (diagnostics, warnings) = self.log.into_parts();
        stat.diagnostics = diagnostics;
        stat.warnings = warnings;
        stat.analysis_time = start.elapsed();
        info!(
            "analyzed {} functions of {}, {} use locks",
            stat.function_number, stat.application_name, stat.lock_function_number
        );
        stat
    }

    fn analyze(&mut self, func: FuncId) {
        if self.summaries.contains_key(&func) {
            return;
        }
        self.stack.push(func);
        for callee in self.callgraph.callees(func) {
            if self.program.function(callee).is_declaration() {
                continue;
            }
            let summarized = self.summaries.contains_key(&callee);
            if self.stack.should_descend(callee, summarized) {
                self.analyze(callee);
            } else if !summarized {
                debug!(
                    "`{}` -> `{}` closes a call cycle, treated as lock free",
                    self.program.function(func).name,
                    self.program.function(callee).name
                );
            }
        }
        let summary = self.summarize(func);
        self.stack.pop();
        self.summaries.insert(func, summary);
    }

    /// Acquire and release events of `func`: direct primitive calls, plus calls
    /// to already summarized wrappers.
    fn lock_sites(
        &mut self,
        func_id: FuncId,
        chains: &DefUseChains,
    ) -> IndexMap<InstId, Vec<LockSite>> {
        let program = self.program;
        let func = program.function(func_id);
        let mut sites: IndexMap<InstId, Vec<LockSite>> = IndexMap::new();
        for (inst, callee, args) in func.call_sites() {
            let target = match callee {
                Callee::Direct(target) => *target,
                Callee::Indirect(_) => {
                    self.log.warn(format!(
                        "`{}`: indirect call {} is not followed",
                        func.name, inst
                    ));
                    continue;
                }
            };
            if let Some((op, lock)) = self.api.primitive_call(program, &func.inst(inst).kind) {
                sites.entry(inst).or_default().push(LockSite {
                    inst,
                    op,
                    lock: chains.root(lock),
                    callee: target,
                    via_wrapper: false,
                    depth: 0,
                });
                continue;
            }
            if !self.config.interprocedural {
                continue;
            }
            let Some(summary) = self.summaries.get(&target) else {
                continue;
            };
            for (data, id) in summary.statistic.locks.iter().zip(&summary.lock_ids) {
                let op = if data.is_lock_wrapper() {
                    LockOp::Acquire
                } else if data.is_unlock_wrapper() {
                    LockOp::Release
                } else {
                    continue;
                };
                // Locks local to the callee have no counterpart here.
                let lock = match id.value {
                    Operand::Arg(index) => match args.get(index as usize) {
                        Some(arg) => chains.root(*arg),
                        None => continue,
                    },
                    Operand::Global(g) => Operand::Global(g),
                    Operand::Inst(_) | Operand::Const(_) => continue,
                };
                sites.entry(inst).or_default().push(LockSite {
                    inst,
                    op,
                    lock,
                    callee: target,
                    via_wrapper: true,
                    depth: data.call_depth + 1,
                });
            }
        }
        sites
    }

    /// Distinct locks among `sites`, in order of first use.
    fn distinct_locks(
        &self,
        func_id: FuncId,
        sites: &IndexMap<InstId, Vec<LockSite>>,
    ) -> Vec<TrackedLock> {
        let mut locks: Vec<TrackedLock> = Vec::new();
        for site in sites.values().flatten() {
            if site.lock.is_const() {
                continue;
            }
            let id = AliasId::new(func_id, site.lock);
            let known = locks.iter().any(|l| {
                self.oracle
                    .is_alias(self.program, l.id, id, self.config.intra_alias)
            });
            if !known {
                locks.push(TrackedLock {
                    name: self.program.value_name(func_id, site.lock),
                    id,
                    unlock_wrapper: false,
                });
            }
        }
        locks
    }

    fn summarize(&mut self, func_id: FuncId) -> Summary {
        let program = self.program;
        let func = program.function(func_id);
        let chains = DefUseChains::new(func);
        let sites = self.lock_sites(func_id, &chains);
        let locks = self.distinct_locks(func_id, &sites);

        let mut statistic = FunctionStatistic::new(func.name.clone());
        statistic.recursive = self.callgraph.is_recursive(func_id);
        let mut lock_ids = Vec::new();
        if locks.is_empty() {
            return Summary {
                statistic,
                lock_ids,
            };
        }

        let graph = BlockGraph::new(func);
        let pdom = PostDominators::compute(&graph);
        let cdg = ControlDependence::compute(&graph, &pdom);
        let ctx = FunctionContext {
            program,
            func_id,
            func,
            oracle: self.oracle,
            config: self.config,
            sites: &sites,
            chains: &chains,
        };

        for mut lock in locks {
            let lock_type = match lock.id.value {
                Operand::Global(_) => LockType::Global,
                _ => LockType::Local,
            };
            let mut data = LockData::new(lock.name.clone(), lock_type);
            for site in sites.values().flatten() {
                if !ctx.site_matches(site, lock.id) {
                    continue;
                }
                match site.op {
                    LockOp::Acquire => data.acquire_number += 1,
                    LockOp::Release => data.release_number += 1,
                }
                data.call_depth = data.call_depth.max(site.depth);
            }
            data.lock_wrapper = data.acquire_number > 0 && data.release_number == 0;
            data.unlock_wrapper = data.release_number > 0 && data.acquire_number == 0;

            lock.unlock_wrapper =
                data.unlock_wrapper && matches!(lock.id.value, Operand::Arg(_));
            let id = lock.id;
            let result = Executor::new(ctx, lock.clone(), &mut self.log).run();
            statistic.converged &= result.converged;
            if !data.lock_wrapper && result.holds_at_exit(&lock.name) {
                self.log.error(Diagnostic {
                    kind: DiagnosticKind::UnreleasedLock,
                    function: func.name.clone(),
                    lock: lock.name.clone(),
                    site: None,
                });
            }

            for pair in find_pairs(&ctx, id) {
                let pattern = classify(&ctx, &cdg, pair);
                debug!(
                    "`{}`: {} {} / {} is {}",
                    func.name, lock.name, pair.acquire, pair.release, pattern
                );
                data.record(pattern);
            }
            statistic.push_lock(data);
            lock_ids.push(id);
        }
        Summary {
            statistic,
            lock_ids,
        }
    }
}

/// Runs the whole analysis over `program`.
pub fn analyze_program(
    program: &Program,
    oracle: &dyn AliasOracle,
    config: &LupaConfig,
) -> Result<ModuleStatistic, regex::Error> {
    Ok(InterProcedural::new(program, oracle, config)?.run())
}
