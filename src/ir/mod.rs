//! Program model consumed by the analysis: functions, basic blocks and
//! instructions in program order, plus the globals they reference.
//!
//! The model is read-only once built. Instructions are addressed by
//! [`InstId`] inside their owning [`Function`]; values crossing the function
//! boundary are always [`Operand::Global`].

pub mod builder;
pub mod io;

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::util::{BlockId, FuncId, GlobalId, IndexVec, InstId};

#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("function `{function}` references unknown block {block}")]
    UnknownBlock { function: String, block: BlockId },
    #[error("function `{function}` references unknown instruction {inst}")]
    UnknownInst { function: String, inst: InstId },
    #[error("function `{function}` calls unknown function {callee}")]
    UnknownFunction { function: String, callee: FuncId },
    #[error("function `{function}` references unknown global {global}")]
    UnknownGlobal { function: String, global: GlobalId },
    #[error("function `{function}` references argument {index} but has {arity} parameters")]
    UnknownArg {
        function: String,
        index: u32,
        arity: usize,
    },
    #[error("block `{block}` of function `{function}` has no instructions")]
    EmptyBlock { function: String, block: String },
    #[error("instruction {inst} of function `{function}` is listed in the wrong block")]
    MisplacedInst { function: String, inst: InstId },
    #[error("`{name}` is defined more than once in {scope}")]
    DuplicateName { scope: String, name: String },
    #[error("cannot resolve `{name}` in {scope}")]
    Unresolved { scope: String, name: String },
    #[error("malformed program description: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot read program: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Constant {
    Int(i64),
    Null,
}

impl Constant {
    /// Zero and null are the sentinels branch predicates are usually tested against.
    pub fn is_null_value(self) -> bool {
        matches!(self, Constant::Null | Constant::Int(0))
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(value) => write!(f, "{}", value),
            Constant::Null => write!(f, "null"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operand {
    /// Result of an instruction of the same function.
    Inst(InstId),
    /// Positional parameter of the enclosing function.
    Arg(u32),
    Global(GlobalId),
    Const(Constant),
}

impl Operand {
    pub fn as_const(self) -> Option<Constant> {
        match self {
            Operand::Const(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_const(self) -> bool {
        matches!(self, Operand::Const(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Callee {
    Direct(FuncId),
    Indirect(Operand),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Predicate {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstKind {
    Call {
        callee: Callee,
        args: Vec<Operand>,
    },
    Br {
        target: BlockId,
    },
    CondBr {
        cond: Operand,
        then_bb: BlockId,
        else_bb: BlockId,
    },
    /// Multi-way branch; `default` is successor 0.
    Switch {
        value: Operand,
        default: BlockId,
        cases: Vec<(i64, BlockId)>,
    },
    Ret {
        value: Option<Operand>,
    },
    Unreachable,
    Cmp {
        pred: Predicate,
        lhs: Operand,
        rhs: Operand,
    },
    /// Any other computation; the first operand is the value it derives from.
    Other {
        operands: Vec<Operand>,
    },
}

impl InstKind {
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            InstKind::Br { .. }
                | InstKind::CondBr { .. }
                | InstKind::Switch { .. }
                | InstKind::Ret { .. }
                | InstKind::Unreachable
        )
    }

    /// Function exits funnel into the synthetic return node.
    pub fn is_exit(&self) -> bool {
        matches!(self, InstKind::Ret { .. } | InstKind::Unreachable)
    }

    pub fn successors(&self) -> SmallVec<[BlockId; 2]> {
        let mut succs = SmallVec::new();
        match self {
            InstKind::Br { target } => succs.push(*target),
            InstKind::CondBr {
                then_bb, else_bb, ..
            } => {
                succs.push(*then_bb);
                succs.push(*else_bb);
            }
            InstKind::Switch { default, cases, .. } => {
                succs.push(*default);
                succs.extend(cases.iter().map(|(_, bb)| *bb));
            }
            _ => {}
        }
        succs
    }

    pub fn operands(&self) -> SmallVec<[Operand; 4]> {
        let mut ops = SmallVec::new();
        match self {
            InstKind::Call { callee, args } => {
                if let Callee::Indirect(target) = callee {
                    ops.push(*target);
                }
                ops.extend(args.iter().copied());
            }
            InstKind::CondBr { cond, .. } => ops.push(*cond),
            InstKind::Switch { value, .. } => ops.push(*value),
            InstKind::Ret { value: Some(value) } => ops.push(*value),
            InstKind::Cmp { lhs, rhs, .. } => {
                ops.push(*lhs);
                ops.push(*rhs);
            }
            InstKind::Other { operands } => ops.extend(operands.iter().copied()),
            InstKind::Br { .. } | InstKind::Ret { value: None } | InstKind::Unreachable => {}
        }
        ops
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub name: Option<String>,
    pub block: BlockId,
    pub kind: InstKind,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BasicBlock {
    pub name: String,
    pub insts: Vec<InstId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub blocks: IndexVec<BlockId, BasicBlock>,
    pub insts: IndexVec<InstId, Instruction>,
}

impl Function {
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            name: name.into(),
            params,
            ..Default::default()
        }
    }

    /// A function without a body only names an external routine, e.g. a lock primitive.
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn entry_block(&self) -> Option<BlockId> {
        self.blocks.indices().next()
    }

    pub fn entry_inst(&self) -> Option<InstId> {
        self.entry_block().and_then(|bb| self.first_inst(bb))
    }

    pub fn inst(&self, id: InstId) -> &Instruction {
        &self.insts[id]
    }

    pub fn block_of(&self, id: InstId) -> BlockId {
        self.insts[id].block
    }

    pub fn first_inst(&self, bb: BlockId) -> Option<InstId> {
        self.blocks.get(bb)?.insts.first().copied()
    }

    /// The last instruction of `bb` when it actually terminates the block.
    pub fn terminator(&self, bb: BlockId) -> Option<InstId> {
        let last = *self.blocks.get(bb)?.insts.last()?;
        self.insts[last].kind.is_terminator().then_some(last)
    }

    /// Successor blocks of `bb` in terminator order.
    pub fn block_successors(&self, bb: BlockId) -> SmallVec<[BlockId; 2]> {
        self.terminator(bb)
            .map(|term| self.insts[term].kind.successors())
            .unwrap_or_default()
    }

    /// The instruction following `id` in its block, if any.
    pub fn next_inst(&self, id: InstId) -> Option<InstId> {
        let insts = &self.blocks[self.block_of(id)].insts;
        let pos = insts.iter().position(|&i| i == id)?;
        insts.get(pos + 1).copied()
    }

    /// The instruction preceding `id` in its block, if any.
    pub fn prev_inst(&self, id: InstId) -> Option<InstId> {
        let insts = &self.blocks[self.block_of(id)].insts;
        let pos = insts.iter().position(|&i| i == id)?;
        pos.checked_sub(1).map(|p| insts[p])
    }

    pub fn is_block_head(&self, id: InstId) -> bool {
        self.first_inst(self.block_of(id)) == Some(id)
    }

    /// Direct and indirect call sites in program order.
    pub fn call_sites(&self) -> impl Iterator<Item = (InstId, &Callee, &[Operand])> {
        self.blocks
            .iter()
            .flat_map(|bb| bb.insts.iter().copied())
            .filter_map(|id| match &self.insts[id].kind {
                InstKind::Call { callee, args } => Some((id, callee, args.as_slice())),
                _ => None,
            })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Global {
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    pub name: String,
    pub functions: IndexVec<FuncId, Function>,
    pub globals: IndexVec<GlobalId, Global>,
}

impl Program {
    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id]
    }

    pub fn defined_functions(&self) -> impl Iterator<Item = (FuncId, &Function)> {
        self.functions
            .iter_enumerated()
            .filter(|(_, f)| !f.is_declaration())
    }

    /// Textual name of a value: `@g` for globals, `%x` for locals.
    pub fn value_name(&self, func: FuncId, operand: Operand) -> String {
        let function = &self.functions[func];
        match operand {
            Operand::Global(g) => format!("@{}", self.globals[g].name),
            Operand::Arg(index) => match function.params.get(index as usize) {
                Some(param) => format!("%{}", param),
                None => format!("%arg{}", index),
            },
            Operand::Inst(id) => match &function.insts[id].name {
                Some(name) => format!("%{}", name),
                None => format!("%{}", id),
            },
            Operand::Const(c) => c.to_string(),
        }
    }

    /// Name of the routine a call site targets, when statically known.
    pub fn callee_name(&self, callee: &Callee) -> Option<&str> {
        match callee {
            Callee::Direct(id) => Some(self.functions[*id].name.as_str()),
            Callee::Indirect(_) => None,
        }
    }

    /// Checks every cross reference so the analysis can index without failing.
    pub fn validate(&self) -> Result<(), ProgramError> {
        for function in self.functions.iter() {
            for (bb, block) in function.blocks.iter_enumerated() {
                if block.insts.is_empty() {
                    return Err(ProgramError::EmptyBlock {
                        function: function.name.clone(),
                        block: block.name.clone(),
                    });
                }
                for &id in &block.insts {
                    let inst = function.insts.get(id).ok_or_else(|| ProgramError::UnknownInst {
                        function: function.name.clone(),
                        inst: id,
                    })?;
                    if inst.block != bb {
                        return Err(ProgramError::MisplacedInst {
                            function: function.name.clone(),
                            inst: id,
                        });
                    }
                }
            }
            for inst in function.insts.iter() {
                self.validate_inst(function, inst)?;
            }
        }
        Ok(())
    }

    fn validate_inst(&self, function: &Function, inst: &Instruction) -> Result<(), ProgramError> {
        if !function.blocks.contains_index(inst.block) {
            return Err(ProgramError::UnknownBlock {
                function: function.name.clone(),
                block: inst.block,
            });
        }
        if let Some(bb) = inst
            .kind
            .successors()
            .into_iter()
            .find(|bb| !function.blocks.contains_index(*bb))
        {
            return Err(ProgramError::UnknownBlock {
                function: function.name.clone(),
                block: bb,
            });
        }
        if let InstKind::Call {
            callee: Callee::Direct(callee),
            ..
        } = &inst.kind
        {
            if !self.functions.contains_index(*callee) {
                return Err(ProgramError::UnknownFunction {
                    function: function.name.clone(),
                    callee: *callee,
                });
            }
        }
        for operand in inst.kind.operands() {
            match operand {
                Operand::Inst(id) if !function.insts.contains_index(id) => {
                    return Err(ProgramError::UnknownInst {
                        function: function.name.clone(),
                        inst: id,
                    });
                }
                Operand::Global(g) if !self.globals.contains_index(g) => {
                    return Err(ProgramError::UnknownGlobal {
                        function: function.name.clone(),
                        global: g,
                    });
                }
                Operand::Arg(index) if index as usize >= function.params.len() => {
                    return Err(ProgramError::UnknownArg {
                        function: function.name.clone(),
                        index,
                        arity: function.params.len(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }
}
