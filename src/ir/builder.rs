//! Incremental construction of [`Program`]s, used by the JSON loader and by tests.

use crate::ir::{
    BasicBlock, Callee, Function, Global, InstKind, Instruction, Operand, Predicate, Program,
    ProgramError,
};
use crate::util::{BlockId, FuncId, GlobalId, InstId};

pub struct ProgramBuilder {
    program: Program,
}

impl ProgramBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            program: Program {
                name: name.into(),
                ..Default::default()
            },
        }
    }

    pub fn global(&mut self, name: impl Into<String>) -> GlobalId {
        self.program.globals.push(Global { name: name.into() })
    }

    /// Adds a function without a body. Give it blocks through [`ProgramBuilder::body`].
    pub fn function(&mut self, name: impl Into<String>, params: &[&str]) -> FuncId {
        let params = params.iter().map(|p| p.to_string()).collect();
        self.program.functions.push(Function::new(name, params))
    }

    pub fn body(&mut self, func: FuncId) -> FunctionBuilder<'_> {
        FunctionBuilder {
            func: &mut self.program.functions[func],
        }
    }

    pub fn build(self) -> Result<Program, ProgramError> {
        self.program.validate()?;
        Ok(self.program)
    }
}

pub struct FunctionBuilder<'a> {
    func: &'a mut Function,
}

impl FunctionBuilder<'_> {
    pub fn block(&mut self, name: impl Into<String>) -> BlockId {
        self.func.blocks.push(BasicBlock {
            name: name.into(),
            insts: Vec::new(),
        })
    }

    pub fn push(&mut self, block: BlockId, name: Option<&str>, kind: InstKind) -> InstId {
        let id = self.func.insts.push(Instruction {
            name: name.map(str::to_string),
            block,
            kind,
        });
        self.func.blocks[block].insts.push(id);
        id
    }

    pub fn call(&mut self, block: BlockId, callee: FuncId, args: &[Operand]) -> InstId {
        self.push(
            block,
            None,
            InstKind::Call {
                callee: Callee::Direct(callee),
                args: args.to_vec(),
            },
        )
    }

    /// A call whose result is named and may be used later.
    pub fn call_named(
        &mut self,
        block: BlockId,
        name: &str,
        callee: FuncId,
        args: &[Operand],
    ) -> InstId {
        self.push(
            block,
            Some(name),
            InstKind::Call {
                callee: Callee::Direct(callee),
                args: args.to_vec(),
            },
        )
    }

    pub fn cmp(
        &mut self,
        block: BlockId,
        name: &str,
        pred: Predicate,
        lhs: Operand,
        rhs: Operand,
    ) -> InstId {
        self.push(block, Some(name), InstKind::Cmp { pred, lhs, rhs })
    }

    pub fn other(&mut self, block: BlockId, name: &str, operands: &[Operand]) -> InstId {
        self.push(
            block,
            Some(name),
            InstKind::Other {
                operands: operands.to_vec(),
            },
        )
    }

    pub fn br(&mut self, block: BlockId, target: BlockId) -> InstId {
        self.push(block, None, InstKind::Br { target })
    }

    pub fn cond_br(
        &mut self,
        block: BlockId,
        cond: Operand,
        then_bb: BlockId,
        else_bb: BlockId,
    ) -> InstId {
        self.push(
            block,
            None,
            InstKind::CondBr {
                cond,
                then_bb,
                else_bb,
            },
        )
    }

    pub fn switch(
        &mut self,
        block: BlockId,
        value: Operand,
        default: BlockId,
        cases: &[(i64, BlockId)],
    ) -> InstId {
        self.push(
            block,
            None,
            InstKind::Switch {
                value,
                default,
                cases: cases.to_vec(),
            },
        )
    }

    pub fn ret(&mut self, block: BlockId) -> InstId {
        self.push(block, None, InstKind::Ret { value: None })
    }

    pub fn unreachable(&mut self, block: BlockId) -> InstId {
        self.push(block, None, InstKind::Unreachable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_function_with_forward_blocks() {
        let mut pb = ProgramBuilder::new("demo");
        let m = pb.global("m");
        let lock = pb.function("pthread_mutex_lock", &["m"]);
        let f = pb.function("f", &[]);
        {
            let mut b = pb.body(f);
            let entry = b.block("entry");
            let exit = b.block("exit");
            b.call(entry, lock, &[Operand::Global(m)]);
            b.br(entry, exit);
            b.ret(exit);
        }
        let program = pb.build().unwrap();
        let func = program.function(f);
        assert!(program.function(lock).is_declaration());
        assert_eq!(func.blocks.len(), 2);
        assert_eq!(func.block_successors(BlockId::new(0)).as_slice(), &[BlockId::new(1)]);
        assert_eq!(program.value_name(f, Operand::Global(m)), "@m");
    }

    #[test]
    fn rejects_empty_block() {
        let mut pb = ProgramBuilder::new("demo");
        let f = pb.function("f", &[]);
        pb.body(f).block("entry");
        assert!(matches!(pb.build(), Err(ProgramError::EmptyBlock { .. })));
    }

    #[test]
    fn rejects_out_of_range_argument() {
        let mut pb = ProgramBuilder::new("demo");
        let g = pb.function("g", &[]);
        {
            let mut b = pb.body(g);
            let entry = b.block("entry");
            b.other(entry, "x", &[Operand::Arg(2)]);
            b.ret(entry);
        }
        assert!(matches!(pb.build(), Err(ProgramError::UnknownArg { index: 2, .. })));
    }
}
