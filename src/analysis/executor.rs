//! 过程内工作表求解器：对一个函数中的一把锁求不动点。
//!
//! Every edge of the function carries a [`StateSet`]. Work items are
//! instructions whose incoming facts changed; processing one applies the
//! merge, sequential and branch flow functions and pushes the results to
//! the outgoing edges. The run ends when no edge changes any more, or when
//! the configured step limit is reached. Usage anomalies are reported
//! afterwards, from the facts that reach each lock site at the fixpoint.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::debug;

use crate::analysis::defuse::DefUseChains;
use crate::analysis::edges::{Edge, EdgeModel, Node, Path};
use crate::analysis::grouping::group;
use crate::analysis::state::{AcquireOutcome, ReleaseOutcome, StateSet, SymbolicState};
use crate::analysis::worklist::{WorkItem, Worklist};
use crate::concurrency::locks::{LockOp, LockSite};
use crate::config::LupaConfig;
use crate::ir::{Function, InstKind, Operand, Predicate, Program};
use crate::memory::{AliasId, AliasOracle};
use crate::report::{Diagnostic, DiagnosticKind, DiagnosticLog};
use crate::util::{FuncId, InstId};

/// Read-only inputs shared by every run over one function.
#[derive(Clone, Copy)]
pub struct FunctionContext<'a> {
    pub program: &'a Program,
    pub func_id: FuncId,
    pub func: &'a Function,
    pub oracle: &'a dyn AliasOracle,
    pub config: &'a LupaConfig,
    /// Acquire and release events per call instruction.
    pub sites: &'a IndexMap<InstId, Vec<LockSite>>,
    pub chains: &'a DefUseChains,
}

impl<'a> FunctionContext<'a> {
    /// Whether `site` operates on `lock`, at the threshold matching how the
    /// site reaches the primitive.
    pub fn site_matches(&self, site: &LockSite, lock: AliasId) -> bool {
        let threshold = if site.via_wrapper {
            self.config.inter_alias
        } else {
            self.config.intra_alias
        };
        self.oracle.is_alias(
            self.program,
            AliasId::new(self.func_id, site.lock),
            lock,
            threshold,
        )
    }
}

/// The lock of interest of one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedLock {
    pub name: String,
    pub id: AliasId,
    /// The lock is a parameter the function only releases, on behalf of its
    /// callers. Unmatched releases are expected then.
    pub unlock_wrapper: bool,
}

#[derive(Debug)]
pub struct RunResult {
    /// Facts on the function's exit edge.
    pub exit: StateSet,
    /// Facts of every materialized edge at the end of the run.
    pub facts: IndexMap<Edge, StateSet>,
    pub steps: usize,
    pub converged: bool,
}

impl RunResult {
    /// Whether some exit fact still holds the lock.
    pub fn holds_at_exit(&self, name: &str) -> bool {
        self.exit.iter().any(|s| s.locks.holds(name))
    }
}

/// Boolean constraint a conditional branch places on its two paths.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Condition {
    /// `name` holds on the taken path, or on the other one when `negated`.
    Predicate { name: String, negated: bool },
    /// Branch on a constant: only the path matching `value` is feasible.
    Constant(bool),
    Unknown,
}

pub struct Executor<'a, 'l> {
    ctx: FunctionContext<'a>,
    lock: TrackedLock,
    edges: EdgeModel<'a>,
    infos: IndexMap<Edge, StateSet>,
    worklist: Worklist,
    matches: HashMap<InstId, Option<LockOp>>,
    conditions: HashMap<InstId, Condition>,
    log: &'l mut DiagnosticLog,
}

impl<'a, 'l> Executor<'a, 'l> {
    pub fn new(ctx: FunctionContext<'a>, lock: TrackedLock, log: &'l mut DiagnosticLog) -> Self {
        Self {
            ctx,
            lock,
            edges: EdgeModel::new(ctx.func),
            infos: IndexMap::new(),
            worklist: Worklist::with_order(ctx.config.worklist_order),
            matches: HashMap::new(),
            conditions: HashMap::new(),
            log,
        }
    }

    pub fn run(mut self) -> RunResult {
        let Some(entry) = self.edges.entry_edge() else {
            return RunResult {
                exit: StateSet::new(),
                facts: IndexMap::new(),
                steps: 0,
                converged: true,
            };
        };
        self.infos
            .insert(entry, StateSet::single(SymbolicState::initial()));
        self.worklist.push(WorkItem::Instruction(entry.dst));

        let mut steps = 0;
        let mut converged = true;
        while let Some(item) = self.worklist.pop() {
            if steps >= self.ctx.config.max_steps {
                self.log.warn(format!(
                    "`{}`: gave up on {} after {} steps",
                    self.ctx.func.name, self.lock.name, steps
                ));
                converged = false;
                break;
            }
            steps += 1;
            self.step(item);
        }
        debug!(
            "`{}`: {} reached a fixpoint after {} steps",
            self.ctx.func.name, self.lock.name, steps
        );
        self.report_anomalies();

        let exit = self
            .infos
            .get(&self.edges.exit_edge())
            .cloned()
            .unwrap_or_default();
        RunResult {
            exit,
            facts: self.infos,
            steps,
            converged,
        }
    }

    fn step(&mut self, item: WorkItem) {
        match item.node() {
            Node::Return => {
                let merged = self.flow_return();
                let exit = self.edges.exit_edge();
                self.propagate(exit, merged);
            }
            Node::Inst(inst) => {
                let Some(input) = self.input(inst) else {
                    self.log.warn(format!(
                        "`{}`: {} has no incoming facts",
                        self.ctx.func.name, inst
                    ));
                    return;
                };
                let states = self.flow_other(inst, input);
                if self.edges.is_conditional(inst) {
                    for path in [Path::Taken, Path::NotTaken] {
                        let out = self.flow_branch(inst, &states, path);
                        let edge = self.edges.out_edge(Node::Inst(inst), path);
                        self.propagate(edge, out);
                    }
                } else {
                    let edge = self.edges.out_edge(Node::Inst(inst), Path::Taken);
                    self.propagate(edge, states);
                }
            }
        }
    }

    /// Facts entering `inst`: merged at merge points, otherwise those of its
    /// only incoming edge. `None` until some incoming edge carries facts.
    fn input(&mut self, inst: InstId) -> Option<StateSet> {
        if self.edges.in_edges(inst).len() > 1 {
            self.flow_merge(inst)
        } else {
            self.edges
                .in_edge(inst, 0)
                .and_then(|edge| self.infos.get(&edge).cloned())
        }
    }

    /// Stores `states` on `edge` when they differ from what is there and
    /// schedules the edge's destination.
    fn propagate(&mut self, edge: Edge, states: StateSet) {
        let changed = match self.infos.get(&edge) {
            Some(old) => states.differs_from(old),
            None => true,
        };
        if !changed {
            return;
        }
        debug!("{:?} -> {:?}: {}", edge.src, edge.dst, states);
        self.infos.insert(edge, states);
        if edge != self.edges.exit_edge() {
            self.worklist.push(WorkItem::Instruction(edge.dst));
        }
    }

    /// Union of the facts on every incoming edge seen so far, regrouped.
    fn flow_merge(&mut self, inst: InstId) -> Option<StateSet> {
        let mut merged = StateSet::new();
        let mut reached = false;
        for edge in self.edges.in_edges(inst) {
            if let Some(states) = self.infos.get(&edge) {
                merged.extend_from(states);
                reached = true;
            }
        }
        reached.then(|| group(merged))
    }

    fn flow_return(&mut self) -> StateSet {
        let mut merged = StateSet::new();
        for edge in self.edges.return_edges() {
            if let Some(states) = self.infos.get(&edge) {
                merged.extend_from(states);
            }
        }
        group(merged)
    }

    /// Effect of `inst` on each fact: acquires and releases of the tracked lock.
    fn flow_other(&mut self, inst: InstId, states: StateSet) -> StateSet {
        let Some(op) = self.lock_op(inst) else {
            return states;
        };
        let mut out = StateSet::new();
        for mut state in states {
            self.apply(op, &mut state);
            out.insert(state);
        }
        group(out)
    }

    /// Applies `op` on the tracked lock to `state` and returns the anomaly
    /// it exposes, if any.
    fn apply(&self, op: LockOp, state: &mut SymbolicState) -> Option<DiagnosticKind> {
        let pre = state.execution.last_condition().to_string();
        match op {
            LockOp::Acquire => match state.locks.add(&self.lock.name, &pre) {
                AcquireOutcome::Reacquired => Some(DiagnosticKind::DoubleAcquire),
                AcquireOutcome::Acquired | AcquireOutcome::Matched => None,
            },
            LockOp::Release => match state.locks.delete(&self.lock.name, &pre) {
                ReleaseOutcome::Released => None,
                ReleaseOutcome::Unmatched if self.lock.unlock_wrapper => None,
                ReleaseOutcome::Unmatched => Some(DiagnosticKind::ReleaseWithoutAcquire),
                ReleaseOutcome::DoubleRelease => Some(DiagnosticKind::DoubleRelease),
            },
        }
    }

    /// Replays every lock site on the facts reaching it once the run is over.
    /// Intermediate facts of the iteration never produce diagnostics.
    fn report_anomalies(&mut self) {
        let sites: Vec<InstId> = self.ctx.sites.keys().copied().collect();
        for inst in sites {
            let Some(op) = self.lock_op(inst) else {
                continue;
            };
            let Some(input) = self.input(inst) else {
                continue;
            };
            for mut state in input {
                if let Some(kind) = self.apply(op, &mut state) {
                    self.log.error(Diagnostic {
                        kind,
                        function: self.ctx.func.name.clone(),
                        lock: self.lock.name.clone(),
                        site: Some(inst),
                    });
                }
            }
        }
    }

    /// Facts leaving `inst` along `path`, constrained by the branch condition.
    fn flow_branch(&mut self, inst: InstId, states: &StateSet, path: Path) -> StateSet {
        let condition = self.condition(inst);
        let filter = self.ctx.config.filter_infeasible;
        let mut out = StateSet::new();
        for state in states {
            let mut fork = state.fork();
            match &condition {
                Condition::Predicate { name, negated } => {
                    let value = path.is_taken() != *negated;
                    if fork.execution.update(name, value) {
                        out.insert(fork);
                    } else if !filter {
                        out.insert(state.fork());
                    } else {
                        debug!("`{}`: {} drops {} on {}", self.ctx.func.name, inst, state, name);
                    }
                }
                Condition::Constant(value) => {
                    if *value == path.is_taken() || !filter {
                        out.insert(fork);
                    }
                }
                Condition::Unknown => {
                    out.insert(fork);
                }
            }
        }
        group(out)
    }

    fn lock_op(&mut self, inst: InstId) -> Option<LockOp> {
        if let Some(op) = self.matches.get(&inst) {
            return *op;
        }
        let op = self.ctx.sites.get(&inst).and_then(|sites| {
            sites
                .iter()
                .find(|site| self.ctx.site_matches(site, self.lock.id))
                .map(|site| site.op)
        });
        self.matches.insert(inst, op);
        op
    }

    fn condition(&mut self, inst: InstId) -> Condition {
        if let Some(condition) = self.conditions.get(&inst) {
            return condition.clone();
        }
        let condition = match self.ctx.func.inst(inst).kind {
            InstKind::CondBr { cond, .. } => self.derive_condition(cond),
            _ => Condition::Unknown,
        };
        self.conditions.insert(inst, condition.clone());
        condition
    }

    fn derive_condition(&mut self, cond: Operand) -> Condition {
        let func = self.ctx.func;
        let (pred, lhs, rhs) = match cond {
            Operand::Const(c) => return Condition::Constant(!c.is_null_value()),
            Operand::Inst(id) => match func.inst(id).kind {
                InstKind::Cmp { pred, lhs, rhs } => (pred, lhs, rhs),
                _ => {
                    return Condition::Predicate {
                        name: self.predicate_name(cond),
                        negated: false,
                    };
                }
            },
            _ => {
                return Condition::Predicate {
                    name: self.predicate_name(cond),
                    negated: false,
                };
            }
        };

        let (subject, constant) = match (lhs.as_const(), rhs.as_const()) {
            (None, Some(c)) => (lhs, c),
            (Some(c), None) => (rhs, c),
            (Some(a), Some(b)) => {
                return match pred {
                    Predicate::Eq => Condition::Constant(a == b),
                    Predicate::Ne => Condition::Constant(a != b),
                    _ => {
                        self.log.warn(format!(
                            "`{}`: ordered comparison of two constants is not tracked",
                            func.name
                        ));
                        Condition::Unknown
                    }
                };
            }
            (None, None) => {
                let name = self.predicate_name(lhs);
                self.log.warn(format!(
                    "`{}`: comparison of two values, tracking {} only",
                    func.name, name
                ));
                return Condition::Predicate {
                    name,
                    negated: false,
                };
            }
        };

        let name = self.predicate_name(subject);
        match pred {
            Predicate::Eq if constant.is_null_value() => Condition::Predicate {
                name,
                negated: true,
            },
            Predicate::Ne if constant.is_null_value() => Condition::Predicate {
                name,
                negated: false,
            },
            Predicate::Eq => Condition::Predicate {
                name: format!("{}=={}", name, constant),
                negated: false,
            },
            Predicate::Ne => Condition::Predicate {
                name: format!("{}=={}", name, constant),
                negated: true,
            },
            _ => {
                self.log.warn(format!(
                    "`{}`: {:?} comparison of {} is not tracked",
                    func.name, pred, name
                ));
                Condition::Unknown
            }
        }
    }

    /// Predicates are named after the value the tested operand derives from,
    /// so tests of the same variable in different blocks share one name.
    fn predicate_name(&self, operand: Operand) -> String {
        let root = self.ctx.chains.root(operand);
        self.ctx.program.value_name(self.ctx.func_id, root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrency::locks::LockApi;
    use crate::ir::builder::ProgramBuilder;
    use crate::ir::{Callee, Constant};
    use crate::memory::NameAlias;

    fn primitive_sites(
        program: &Program,
        func: FuncId,
        config: &LupaConfig,
    ) -> IndexMap<InstId, Vec<LockSite>> {
        let api = LockApi::new(config).unwrap();
        let mut sites = IndexMap::new();
        for (inst, callee, _) in program.function(func).call_sites() {
            let kind = &program.function(func).inst(inst).kind;
            if let (Some((op, lock)), Callee::Direct(target)) = (api.primitive_call(program, kind), callee) {
                sites.insert(
                    inst,
                    vec![LockSite {
                        inst,
                        op,
                        lock,
                        callee: *target,
                        via_wrapper: false,
                        depth: 0,
                    }],
                );
            }
        }
        sites
    }

    fn run_on(
        program: &Program,
        func: FuncId,
        config: &LupaConfig,
        log: &mut DiagnosticLog,
    ) -> RunResult {
        let m = program.globals.indices().next().unwrap();
        let sites = primitive_sites(program, func, config);
        let chains = DefUseChains::new(program.function(func));
        let ctx = FunctionContext {
            program,
            func_id: func,
            func: program.function(func),
            oracle: &NameAlias,
            config,
            sites: &sites,
            chains: &chains,
        };
        let lock = TrackedLock {
            name: "@m".to_string(),
            id: AliasId::new(func, Operand::Global(m)),
            unlock_wrapper: false,
        };
        Executor::new(ctx, lock, log).run()
    }

    #[test]
    fn balanced_lock_leaves_nothing_held() {
        let mut pb = ProgramBuilder::new("p");
        let m = pb.global("m");
        let lock = pb.function("pthread_mutex_lock", &["m"]);
        let unlock = pb.function("pthread_mutex_unlock", &["m"]);
        let f = pb.function("f", &[]);
        {
            let mut b = pb.body(f);
            let entry = b.block("entry");
            b.call(entry, lock, &[Operand::Global(m)]);
            b.call(entry, unlock, &[Operand::Global(m)]);
            b.ret(entry);
        }
        let program = pb.build().unwrap();
        let mut log = DiagnosticLog::new();
        let result = run_on(&program, f, &LupaConfig::default(), &mut log);
        assert!(result.converged);
        assert_eq!(result.exit.len(), 1);
        assert!(result.exit.iter().all(|s| s.locks.is_init()));
        assert_eq!(log.diagnostics().count(), 0);
    }

    #[test]
    fn conditional_lock_splits_exit_facts() {
        let mut pb = ProgramBuilder::new("p");
        let m = pb.global("m");
        let lock = pb.function("pthread_mutex_lock", &["m"]);
        let f = pb.function("f", &["c"]);
        {
            let mut b = pb.body(f);
            let entry = b.block("entry");
            let then = b.block("then");
            let join = b.block("join");
            let c = b.cmp(entry, "t", Predicate::Ne, Operand::Arg(0), Operand::Const(Constant::Int(0)));
            b.cond_br(entry, Operand::Inst(c), then, join);
            b.call(then, lock, &[Operand::Global(m)]);
            b.br(then, join);
            b.ret(join);
        }
        let program = pb.build().unwrap();
        let mut log = DiagnosticLog::new();
        let result = run_on(&program, f, &LupaConfig::default(), &mut log);
        assert!(result.holds_at_exit("@m"));
        let held = result.exit.iter().find(|s| s.locks.holds("@m")).unwrap();
        assert_eq!(held.execution.get("%c"), Some(true));
        assert!(result.exit.iter().any(|s| s.locks.is_init()));
    }

    #[test]
    fn constant_branch_prunes_dead_side() {
        let mut pb = ProgramBuilder::new("p");
        let m = pb.global("m");
        let lock = pb.function("pthread_mutex_lock", &["m"]);
        let f = pb.function("f", &[]);
        {
            let mut b = pb.body(f);
            let entry = b.block("entry");
            let dead = b.block("dead");
            let live = b.block("live");
            b.cond_br(entry, Operand::Const(Constant::Int(0)), dead, live);
            b.call(dead, lock, &[Operand::Global(m)]);
            b.ret(dead);
            b.ret(live);
        }
        let program = pb.build().unwrap();
        let mut log = DiagnosticLog::new();
        let result = run_on(&program, f, &LupaConfig::default(), &mut log);
        assert!(!result.holds_at_exit("@m"));

        let mut log = DiagnosticLog::new();
        let config = LupaConfig {
            filter_infeasible: false,
            ..LupaConfig::default()
        };
        let result = run_on(&program, f, &config, &mut log);
        assert!(result.holds_at_exit("@m"));
    }

    /// Locks when `x == 3`, later releases when `x != 3` does not hold.
    fn equality_guarded() -> (Program, FuncId) {
        let mut pb = ProgramBuilder::new("p");
        let m = pb.global("m");
        let lock = pb.function("pthread_mutex_lock", &["m"]);
        let unlock = pb.function("pthread_mutex_unlock", &["m"]);
        let f = pb.function("f", &["x"]);
        {
            let mut b = pb.body(f);
            let entry = b.block("entry");
            let locked = b.block("locked");
            let mid = b.block("mid");
            let skip = b.block("skip");
            let release = b.block("release");
            let exit = b.block("exit");
            let three = Operand::Const(Constant::Int(3));
            let first = b.cmp(entry, "is3", Predicate::Eq, Operand::Arg(0), three);
            b.cond_br(entry, Operand::Inst(first), locked, mid);
            b.call(locked, lock, &[Operand::Global(m)]);
            b.br(locked, mid);
            let second = b.cmp(mid, "not3", Predicate::Ne, Operand::Arg(0), three);
            b.cond_br(mid, Operand::Inst(second), skip, release);
            b.br(skip, exit);
            b.call(release, unlock, &[Operand::Global(m)]);
            b.br(release, exit);
            b.ret(exit);
        }
        (pb.build().unwrap(), f)
    }

    #[test]
    fn equality_tests_share_one_predicate() {
        let (program, f) = equality_guarded();
        let mut log = DiagnosticLog::new();
        let result = run_on(&program, f, &LupaConfig::default(), &mut log);
        assert!(!result.holds_at_exit("@m"));
        assert_eq!(log.diagnostics().count(), 0);
        assert!(log.warnings().is_empty());
        let states = || result.facts.values().flat_map(|set| set.iter());
        assert!(states().any(|s| s.execution.get("%x==3") == Some(true)));
        assert!(states().any(|s| s.execution.get("%x==3") == Some(false)));
        // The held fact never reaches the path where `x != 3`.
        assert!(
            states()
                .filter(|s| s.locks.holds("@m"))
                .all(|s| s.execution.get("%x==3") == Some(true))
        );

        let mut log = DiagnosticLog::new();
        let config = LupaConfig {
            filter_infeasible: false,
            ..LupaConfig::default()
        };
        let result = run_on(&program, f, &config, &mut log);
        assert!(result.holds_at_exit("@m"));
        assert_eq!(log.count(DiagnosticKind::ReleaseWithoutAcquire), 1);
    }

    #[test]
    fn comparing_two_values_tracks_the_left_one() {
        let mut pb = ProgramBuilder::new("p");
        pb.global("m");
        let f = pb.function("f", &["a", "b"]);
        {
            let mut b = pb.body(f);
            let entry = b.block("entry");
            let left = b.block("left");
            let right = b.block("right");
            let c = b.cmp(entry, "same", Predicate::Eq, Operand::Arg(0), Operand::Arg(1));
            b.cond_br(entry, Operand::Inst(c), left, right);
            b.ret(left);
            b.ret(right);
        }
        let program = pb.build().unwrap();
        let mut log = DiagnosticLog::new();
        let result = run_on(&program, f, &LupaConfig::default(), &mut log);
        assert!(result.converged);
        assert_eq!(log.warnings().len(), 1);
        assert!(log.warnings()[0].contains("tracking %a only"));
        assert!(
            result
                .facts
                .values()
                .flat_map(|set| set.iter())
                .any(|s| s.execution.get("%a") == Some(true))
        );
    }

    #[test]
    fn ordered_comparison_leaves_paths_unconstrained() {
        let mut pb = ProgramBuilder::new("p");
        let m = pb.global("m");
        let lock = pb.function("pthread_mutex_lock", &["m"]);
        let f = pb.function("f", &["x"]);
        {
            let mut b = pb.body(f);
            let entry = b.block("entry");
            let then = b.block("then");
            let join = b.block("join");
            let c = b.cmp(entry, "small", Predicate::Lt, Operand::Arg(0), Operand::Const(Constant::Int(3)));
            b.cond_br(entry, Operand::Inst(c), then, join);
            b.call(then, lock, &[Operand::Global(m)]);
            b.br(then, join);
            b.ret(join);
        }
        let program = pb.build().unwrap();
        let mut log = DiagnosticLog::new();
        let result = run_on(&program, f, &LupaConfig::default(), &mut log);
        assert_eq!(log.warnings().len(), 1);
        assert!(log.warnings()[0].contains("Lt comparison of %x is not tracked"));
        let held = result.exit.iter().find(|s| s.locks.holds("@m")).unwrap();
        assert!(held.execution.is_all());
    }

    #[test]
    fn loops_reach_a_fixpoint() {
        let mut pb = ProgramBuilder::new("p");
        let m = pb.global("m");
        let lock = pb.function("pthread_mutex_lock", &["m"]);
        let unlock = pb.function("pthread_mutex_unlock", &["m"]);
        let f = pb.function("f", &["n"]);
        {
            let mut b = pb.body(f);
            let entry = b.block("entry");
            let head = b.block("head");
            let body = b.block("body");
            let exit = b.block("exit");
            b.br(entry, head);
            let c = b.cmp(head, "more", Predicate::Ne, Operand::Arg(0), Operand::Const(Constant::Int(0)));
            b.cond_br(head, Operand::Inst(c), body, exit);
            b.call(body, lock, &[Operand::Global(m)]);
            b.call(body, unlock, &[Operand::Global(m)]);
            b.br(body, head);
            b.ret(exit);
        }
        let program = pb.build().unwrap();
        let mut log = DiagnosticLog::new();
        let result = run_on(&program, f, &LupaConfig::default(), &mut log);
        assert!(result.converged);
        assert!(!result.holds_at_exit("@m"));
        assert_eq!(log.diagnostics().count(), 0);
    }

    #[test]
    fn step_limit_stops_the_run() {
        let mut pb = ProgramBuilder::new("p");
        let f = pb.function("f", &[]);
        pb.global("m");
        {
            let mut b = pb.body(f);
            let entry = b.block("entry");
            let next = b.block("next");
            b.br(entry, next);
            b.ret(next);
        }
        let program = pb.build().unwrap();
        let mut log = DiagnosticLog::new();
        let config = LupaConfig {
            max_steps: 1,
            ..LupaConfig::default()
        };
        let result = run_on(&program, f, &config, &mut log);
        assert!(!result.converged);
        assert_eq!(result.steps, 1);
        assert_eq!(log.warnings().len(), 1);
    }
}
