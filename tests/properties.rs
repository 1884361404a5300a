//! Lattice laws of the symbolic states and properties of the fixpoint.

use std::collections::HashSet;

use indexmap::IndexMap;
use proptest::prelude::*;

use lupa::analysis::analyze_program;
use lupa::analysis::defuse::DefUseChains;
use lupa::analysis::executor::{Executor, FunctionContext, RunResult, TrackedLock};
use lupa::analysis::grouping::group;
use lupa::analysis::state::{AbstractState, ExecutionState, StateSet, SymbolicState};
use lupa::analysis::worklist::SelectionOrder;
use lupa::concurrency::locks::{LockApi, LockSite};
use lupa::config::LupaConfig;
use lupa::ir::builder::ProgramBuilder;
use lupa::ir::{Callee, Constant, Operand, Predicate, Program};
use lupa::memory::{AliasId, NameAlias};
use lupa::report::{Diagnostic, DiagnosticLog};
use lupa::util::{FuncId, GlobalId, InstId};

const LOCKS: [&str; 2] = ["@a", "@b"];
const PREDICATES: [&str; 4] = ["%x", "%y", "%s==1", "%s==2"];

fn abstract_state() -> impl Strategy<Value = AbstractState> {
    prop::collection::vec((0..LOCKS.len(), any::<bool>()), 0..4).prop_map(|ops| {
        let mut state = AbstractState::new();
        for (lock, acquire) in ops {
            if acquire {
                state.add(LOCKS[lock], "");
            } else {
                state.delete(LOCKS[lock], "");
            }
        }
        state
    })
}

fn execution_state() -> impl Strategy<Value = ExecutionState> {
    prop_oneof![
        1 => Just(ExecutionState::unreachable()),
        6 => prop::collection::vec((0..PREDICATES.len(), any::<bool>()), 0..4).prop_map(|updates| {
            let mut state = ExecutionState::unconstrained();
            for (name, value) in updates {
                state.update(PREDICATES[name], value);
            }
            state
        }),
    ]
}

fn symbolic_state() -> impl Strategy<Value = SymbolicState> {
    (abstract_state(), execution_state())
        .prop_map(|(locks, execution)| SymbolicState::new(locks, execution))
}

fn state_set() -> impl Strategy<Value = StateSet> {
    prop::collection::vec(symbolic_state(), 0..6).prop_map(|states| states.into_iter().collect())
}

/// Operations of one block, its terminator kind and two target selectors.
type BlockShape = (Vec<u8>, u8, u8, u8);

fn block_shapes() -> impl Strategy<Value = Vec<BlockShape>> {
    prop::collection::vec(
        (prop::collection::vec(0u8..4, 0..4), 0u8..4, any::<u8>(), any::<u8>()),
        1..7,
    )
}

/// A function whose branches only jump forward, so its CFG has no cycle.
fn loop_free_program(blocks: &[BlockShape]) -> (Program, FuncId, GlobalId) {
    let mut pb = ProgramBuilder::new("generated");
    let m = pb.global("m");
    let n = pb.global("n");
    let lock = pb.function("pthread_mutex_lock", &["m"]);
    let unlock = pb.function("pthread_mutex_unlock", &["m"]);
    let f = pb.function("f", &["p", "q"]);
    {
        let mut b = pb.body(f);
        let ids: Vec<_> = (0..blocks.len()).map(|i| b.block(format!("b{}", i))).collect();
        for (i, (ops, term, t1, t2)) in blocks.iter().enumerate() {
            let bb = ids[i];
            for (k, op) in ops.iter().enumerate() {
                match op {
                    0 => {
                        b.call(bb, lock, &[Operand::Global(m)]);
                    }
                    1 => {
                        b.call(bb, unlock, &[Operand::Global(m)]);
                    }
                    2 => {
                        b.call(bb, lock, &[Operand::Global(n)]);
                    }
                    _ => {
                        b.other(bb, &format!("v{}_{}", i, k), &[Operand::Arg(0)]);
                    }
                }
            }
            if i + 1 == blocks.len() {
                b.ret(bb);
                continue;
            }
            let span = blocks.len() - 1 - i;
            let then_bb = ids[i + 1 + *t1 as usize % span];
            let else_bb = ids[i + 1 + *t2 as usize % span];
            match term {
                0 => {
                    b.br(bb, then_bb);
                }
                1 => {
                    b.cond_br(bb, Operand::Arg(0), then_bb, else_bb);
                }
                2 => {
                    let pred = if t1 % 2 == 0 { Predicate::Ne } else { Predicate::Eq };
                    let c = b.cmp(
                        bb,
                        &format!("c{}", i),
                        pred,
                        Operand::Arg(u32::from(t2 % 2)),
                        Operand::Const(Constant::Int(0)),
                    );
                    b.cond_br(bb, Operand::Inst(c), then_bb, else_bb);
                }
                _ => {
                    b.ret(bb);
                }
            }
        }
    }
    (pb.build().unwrap(), f, m)
}

fn run_tracking(
    program: &Program,
    func: FuncId,
    lock: GlobalId,
    order: SelectionOrder,
) -> RunResult {
    let config = LupaConfig {
        worklist_order: order,
        ..LupaConfig::default()
    };
    let api = LockApi::new(&config).unwrap();
    let function = program.function(func);
    let mut sites: IndexMap<InstId, Vec<LockSite>> = IndexMap::new();
    for (inst, callee, _) in function.call_sites() {
        if let (Some((op, operand)), Callee::Direct(target)) =
            (api.primitive_call(program, &function.inst(inst).kind), callee)
        {
            sites.entry(inst).or_default().push(LockSite {
                inst,
                op,
                lock: operand,
                callee: *target,
                via_wrapper: false,
                depth: 0,
            });
        }
    }
    let chains = DefUseChains::new(function);
    let ctx = FunctionContext {
        program,
        func_id: func,
        func: function,
        oracle: &NameAlias,
        config: &config,
        sites: &sites,
        chains: &chains,
    };
    let tracked = TrackedLock {
        name: program.value_name(func, Operand::Global(lock)),
        id: AliasId::new(func, Operand::Global(lock)),
        unlock_wrapper: false,
    };
    let mut log = DiagnosticLog::new();
    Executor::new(ctx, tracked, &mut log).run()
}

proptest! {
    #[test]
    fn grouping_is_idempotent(states in state_set()) {
        let once = group(states);
        let twice = group(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn grouping_bounds_the_set(states in state_set()) {
        let grouped = group(states);
        // An init bucket, plus one per held or pending lock name.
        prop_assert!(grouped.len() <= 1 + 2 * LOCKS.len());
    }

    #[test]
    fn equality_is_reflexive_and_symmetric(a in symbolic_state(), b in symbolic_state()) {
        prop_assert_eq!(&a, &a);
        prop_assert_eq!(a == b, b == a);
        prop_assert_eq!(a.fork(), a.clone());
    }

    #[test]
    fn contradicting_update_leaves_state_untouched(state in execution_state()) {
        let recorded: Vec<(String, bool)> =
            state.conditions().iter().map(|(k, v)| (k.clone(), *v)).collect();
        for (name, value) in recorded {
            let mut flipped = state.clone();
            prop_assert!(!flipped.update(&name, !value));
            prop_assert_eq!(&flipped, &state);
            prop_assert_eq!(flipped.conditions(), state.conditions());
        }
    }

    #[test]
    fn reconcile_replays_the_other_state(
        base in abstract_state(),
        other in abstract_state(),
    ) {
        let mut joined = base.clone();
        joined.reconcile(&other);

        let mut replayed = base.clone();
        for lock in other.held() {
            replayed.add(&lock.name, &lock.pre_condition);
        }
        for lock in other.pending_releases() {
            replayed.delete(&lock.name, &lock.pre_condition);
        }
        prop_assert_eq!(&joined, &replayed);
        prop_assert_eq!(
            joined.is_init(),
            joined.held().is_empty() && joined.pending_releases().is_empty()
        );
    }

    #[test]
    fn reconciling_with_top_is_top(state in execution_state()) {
        let mut joined = state.clone();
        joined.reconcile(&ExecutionState::unconstrained());
        prop_assert!(joined.is_all());
        prop_assert!(joined.conditions().is_empty());

        let mut top = ExecutionState::unconstrained();
        top.reconcile(&state);
        prop_assert!(top.is_all());
        prop_assert!(top.conditions().is_empty());
    }

    #[test]
    fn loop_free_functions_converge(blocks in block_shapes()) {
        let (program, _, _) = loop_free_program(&blocks);
        let stat = analyze_program(&program, &NameAlias, &LupaConfig::default()).unwrap();
        prop_assert!(stat.functions.iter().all(|f| f.converged));
    }

    #[test]
    fn diagnostics_ignore_selection_order(blocks in block_shapes()) {
        let (program, _, _) = loop_free_program(&blocks);
        let reported = |order| -> HashSet<Diagnostic> {
            let config = LupaConfig {
                worklist_order: order,
                ..LupaConfig::default()
            };
            let stat = analyze_program(&program, &NameAlias, &config).unwrap();
            stat.diagnostics.into_iter().collect()
        };
        prop_assert_eq!(reported(SelectionOrder::Fifo), reported(SelectionOrder::Lifo));
    }

    #[test]
    fn fixpoint_ignores_selection_order(blocks in block_shapes()) {
        let (program, f, m) = loop_free_program(&blocks);
        let fifo = run_tracking(&program, f, m, SelectionOrder::Fifo);
        let lifo = run_tracking(&program, f, m, SelectionOrder::Lifo);
        prop_assert!(fifo.converged && lifo.converged);
        prop_assert_eq!(fifo.exit, lifo.exit);
    }
}
