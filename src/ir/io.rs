//! JSON description of a program.
//!
//! ```json
//! { "name": "app", "globals": ["m"],
//!   "functions": [
//!     { "name": "pthread_mutex_lock", "params": ["m"] },
//!     { "name": "f", "blocks": [
//!       { "name": "entry", "insts": [
//!         { "op": "call", "callee": "pthread_mutex_lock", "args": ["@m"] },
//!         { "op": "ret" } ] } ] } ] }
//! ```
//!
//! Operands are written `@g` (global), `%x` (parameter or named instruction),
//! an integer literal, `null`, `true` or `false`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::ir::builder::{FunctionBuilder, ProgramBuilder};
use crate::ir::{Callee, Constant, InstKind, Operand, Predicate, Program, ProgramError};
use crate::util::{BlockId, FuncId, GlobalId, InstId};

#[derive(Debug, Deserialize)]
struct ProgramText {
    name: String,
    #[serde(default)]
    globals: Vec<String>,
    functions: Vec<FunctionText>,
}

#[derive(Debug, Deserialize)]
struct FunctionText {
    name: String,
    #[serde(default)]
    params: Vec<String>,
    #[serde(default)]
    blocks: Vec<BlockText>,
}

#[derive(Debug, Deserialize)]
struct BlockText {
    name: String,
    insts: Vec<InstText>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum InstText {
    Call {
        #[serde(default)]
        name: Option<String>,
        callee: String,
        #[serde(default)]
        args: Vec<String>,
    },
    Br {
        target: String,
    },
    CondBr {
        cond: String,
        then: String,
        #[serde(rename = "else")]
        otherwise: String,
    },
    Switch {
        value: String,
        default: String,
        #[serde(default)]
        cases: Vec<(i64, String)>,
    },
    Ret {
        #[serde(default)]
        value: Option<String>,
    },
    Unreachable,
    Cmp {
        name: String,
        pred: Predicate,
        lhs: String,
        rhs: String,
    },
    Other {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        operands: Vec<String>,
    },
}

impl InstText {
    fn name(&self) -> Option<&str> {
        match self {
            InstText::Call { name, .. } | InstText::Other { name, .. } => name.as_deref(),
            InstText::Cmp { name, .. } => Some(name),
            _ => None,
        }
    }
}

pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Program, ProgramError> {
    let content = fs::read_to_string(path)?;
    parse_program(&content)
}

pub fn parse_program(text: &str) -> Result<Program, ProgramError> {
    let desc: ProgramText = serde_json::from_str(text)?;
    let mut pb = ProgramBuilder::new(desc.name.clone());

    let mut globals = HashMap::new();
    for name in &desc.globals {
        let id = pb.global(name.clone());
        if globals.insert(name.clone(), id).is_some() {
            return Err(duplicate(&desc.name, name));
        }
    }
    let mut functions = HashMap::new();
    for function in &desc.functions {
        let params: Vec<&str> = function.params.iter().map(String::as_str).collect();
        let id = pb.function(function.name.clone(), &params);
        if functions.insert(function.name.clone(), id).is_some() {
            return Err(duplicate(&desc.name, &function.name));
        }
    }

    for function in &desc.functions {
        let id = functions[&function.name];
        let scope = Scope::new(function, &globals, &functions)?;
        let mut body = pb.body(id);
        for block in &function.blocks {
            body.block(block.name.clone());
        }
        for (bb, block) in function.blocks.iter().enumerate() {
            for inst in &block.insts {
                lower_inst(&scope, &mut body, BlockId::new(bb as u32), inst)?;
            }
        }
    }
    pb.build()
}

fn duplicate(scope: &str, name: &str) -> ProgramError {
    ProgramError::DuplicateName {
        scope: scope.to_string(),
        name: name.to_string(),
    }
}

/// Name resolution tables for one function body.
struct Scope<'a> {
    function: &'a str,
    globals: &'a HashMap<String, GlobalId>,
    functions: &'a HashMap<String, FuncId>,
    params: HashMap<&'a str, u32>,
    insts: HashMap<&'a str, InstId>,
    blocks: HashMap<&'a str, BlockId>,
}

impl<'a> Scope<'a> {
    fn new(
        function: &'a FunctionText,
        globals: &'a HashMap<String, GlobalId>,
        functions: &'a HashMap<String, FuncId>,
    ) -> Result<Self, ProgramError> {
        let scope_name = format!("function `{}`", function.name);
        let params = function
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| (p.as_str(), i as u32))
            .collect();
        let mut blocks = HashMap::new();
        for (i, block) in function.blocks.iter().enumerate() {
            if blocks.insert(block.name.as_str(), BlockId::new(i as u32)).is_some() {
                return Err(duplicate(&scope_name, &block.name));
            }
        }
        // Instruction ids are handed out in block order by the builder.
        let mut insts = HashMap::new();
        let all = function.blocks.iter().flat_map(|b| b.insts.iter());
        for (i, inst) in all.enumerate() {
            if let Some(name) = inst.name() {
                if insts.insert(name, InstId::new(i as u32)).is_some() {
                    return Err(duplicate(&scope_name, name));
                }
            }
        }
        Ok(Self {
            function: &function.name,
            globals,
            functions,
            params,
            insts,
            blocks,
        })
    }

    fn unresolved(&self, name: &str) -> ProgramError {
        ProgramError::Unresolved {
            scope: format!("function `{}`", self.function),
            name: name.to_string(),
        }
    }

    fn block(&self, name: &str) -> Result<BlockId, ProgramError> {
        self.blocks
            .get(name)
            .copied()
            .ok_or_else(|| self.unresolved(name))
    }

    fn operand(&self, text: &str) -> Result<Operand, ProgramError> {
        let text = text.trim();
        if let Some(name) = text.strip_prefix('@') {
            return self
                .globals
                .get(name)
                .map(|g| Operand::Global(*g))
                .ok_or_else(|| self.unresolved(text));
        }
        if let Some(name) = text.strip_prefix('%') {
            if let Some(index) = self.params.get(name) {
                return Ok(Operand::Arg(*index));
            }
            return self
                .insts
                .get(name)
                .map(|i| Operand::Inst(*i))
                .ok_or_else(|| self.unresolved(text));
        }
        match text {
            "null" => Ok(Operand::Const(Constant::Null)),
            "true" => Ok(Operand::Const(Constant::Int(1))),
            "false" => Ok(Operand::Const(Constant::Int(0))),
            _ => text
                .parse::<i64>()
                .map(|v| Operand::Const(Constant::Int(v)))
                .map_err(|_| self.unresolved(text)),
        }
    }

    fn operands(&self, texts: &[String]) -> Result<Vec<Operand>, ProgramError> {
        texts.iter().map(|t| self.operand(t)).collect()
    }

    fn callee(&self, text: &str) -> Result<Callee, ProgramError> {
        let name = text.strip_prefix('@').unwrap_or(text);
        if let Some(id) = self.functions.get(name) {
            return Ok(Callee::Direct(*id));
        }
        self.operand(text).map(Callee::Indirect)
    }
}

fn lower_inst(
    scope: &Scope<'_>,
    body: &mut FunctionBuilder<'_>,
    bb: BlockId,
    inst: &InstText,
) -> Result<InstId, ProgramError> {
    let kind = match inst {
        InstText::Call { callee, args, .. } => InstKind::Call {
            callee: scope.callee(callee)?,
            args: scope.operands(args)?,
        },
        InstText::Br { target } => InstKind::Br {
            target: scope.block(target)?,
        },
        InstText::CondBr {
            cond,
            then,
            otherwise,
        } => InstKind::CondBr {
            cond: scope.operand(cond)?,
            then_bb: scope.block(then)?,
            else_bb: scope.block(otherwise)?,
        },
        InstText::Switch {
            value,
            default,
            cases,
        } => InstKind::Switch {
            value: scope.operand(value)?,
            default: scope.block(default)?,
            cases: cases
                .iter()
                .map(|(v, target)| scope.block(target).map(|bb| (*v, bb)))
                .collect::<Result<_, _>>()?,
        },
        InstText::Ret { value } => InstKind::Ret {
            value: value.as_deref().map(|v| scope.operand(v)).transpose()?,
        },
        InstText::Unreachable => InstKind::Unreachable,
        InstText::Cmp { pred, lhs, rhs, .. } => InstKind::Cmp {
            pred: *pred,
            lhs: scope.operand(lhs)?,
            rhs: scope.operand(rhs)?,
        },
        InstText::Other { operands, .. } => InstKind::Other {
            operands: scope.operands(operands)?,
        },
    };
    Ok(body.push(bb, inst.name(), kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO: &str = r#"{
        "name": "demo",
        "globals": ["m", "flag"],
        "functions": [
            { "name": "pthread_mutex_lock", "params": ["m"] },
            { "name": "pthread_mutex_unlock", "params": ["m"] },
            { "name": "f", "params": ["p"], "blocks": [
                { "name": "entry", "insts": [
                    { "op": "other", "name": "c", "operands": ["@flag"] },
                    { "op": "cmp", "name": "t", "pred": "ne", "lhs": "%c", "rhs": "0" },
                    { "op": "cond_br", "cond": "%t", "then": "locked", "else": "exit" } ] },
                { "name": "locked", "insts": [
                    { "op": "call", "name": "r", "callee": "pthread_mutex_lock", "args": ["@m"] },
                    { "op": "call", "callee": "pthread_mutex_unlock", "args": ["@m"] },
                    { "op": "br", "target": "exit" } ] },
                { "name": "exit", "insts": [ { "op": "ret" } ] } ] } ] }"#;

    #[test]
    fn parses_named_values_and_blocks() {
        let program = parse_program(DEMO).unwrap();
        let func = program.function(FuncId::new(2));
        assert_eq!(func.name, "f");
        assert_eq!(func.blocks.len(), 3);
        let term = func.terminator(BlockId::new(0)).unwrap();
        match &func.inst(term).kind {
            InstKind::CondBr {
                cond: Operand::Inst(cond),
                then_bb,
                else_bb,
            } => {
                assert_eq!(func.inst(*cond).name.as_deref(), Some("t"));
                assert_eq!(*then_bb, BlockId::new(1));
                assert_eq!(*else_bb, BlockId::new(2));
            }
            other => panic!("unexpected terminator {:?}", other),
        }
        assert_eq!(func.call_sites().count(), 2);
    }

    #[test]
    fn reports_unresolved_names() {
        let text = DEMO.replacen("\"@m\"", "\"@nope\"", 1);
        let err = parse_program(&text).unwrap_err();
        assert!(matches!(err, ProgramError::Unresolved { ref name, .. } if name == "@nope"));
    }

    #[test]
    fn rejects_duplicate_functions() {
        let text = r#"{ "name": "d", "functions": [ { "name": "a" }, { "name": "a" } ] }"#;
        assert!(matches!(
            parse_program(text),
            Err(ProgramError::DuplicateName { .. })
        ));
    }
}
