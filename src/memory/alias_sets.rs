//! Alias answers read from a precomputed alias-set file.
//!
//! The file is a whitespace separated token stream of groups:
//!
//! ```text
//! must 1
//! set 2  @m  worker %lock
//! may 1
//! set 2  @a  @b
//! ```
//!
//! Each group names a kind (`must`, `may` or `no`) and a number of sets.
//! Each set has a tag, a member count and its members. A member starting
//! with `@` is a global; otherwise it is a function name followed by a
//! local value name.

use std::fs;
use std::path::Path;

use indexmap::IndexSet;
use thiserror::Error;

use crate::ir::Program;
use crate::memory::alias::{AliasId, AliasKind, AliasOracle};

#[derive(Debug, Error)]
pub enum AliasSetError {
    #[error("unknown alias kind `{0}`, expected must, may or no")]
    UnknownKind(String),
    #[error("expected a count, found `{0}`")]
    ExpectedCount(String),
    #[error("alias file ends in the middle of a set")]
    UnexpectedEnd,
    #[error("cannot read alias file: {0}")]
    Io(#[from] std::io::Error),
}

type Member = (Option<String>, String);

#[derive(Debug, Clone)]
pub struct AliasSet {
    pub kind: AliasKind,
    pub members: IndexSet<Member>,
}

impl AliasSet {
    fn relates(&self, a: &Member, b: &Member) -> Option<AliasKind> {
        (self.members.contains(a) && self.members.contains(b)).then_some(self.kind)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AliasSets {
    pub sets: Vec<AliasSet>,
}

impl AliasSets {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AliasSetError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(text: &str) -> Result<Self, AliasSetError> {
        let mut tokens = text.split_whitespace();
        let mut sets = Vec::new();
        while let Some(kind) = tokens.next() {
            let kind = match kind {
                "must" => AliasKind::Must,
                "may" => AliasKind::May,
                "no" => AliasKind::No,
                other => return Err(AliasSetError::UnknownKind(other.to_string())),
            };
            let set_count = next_count(&mut tokens)?;
            for _ in 0..set_count {
                // Set tag, unused.
                tokens.next().ok_or(AliasSetError::UnexpectedEnd)?;
                let member_count = next_count(&mut tokens)?;
                let mut members = IndexSet::new();
                for _ in 0..member_count {
                    let first = tokens.next().ok_or(AliasSetError::UnexpectedEnd)?;
                    if first.starts_with('@') {
                        members.insert((None, first.to_string()));
                    } else {
                        let value = tokens.next().ok_or(AliasSetError::UnexpectedEnd)?;
                        members.insert((Some(first.to_string()), local_name(value)));
                    }
                }
                sets.push(AliasSet { kind, members });
            }
        }
        Ok(Self { sets })
    }
}

fn next_count<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Result<usize, AliasSetError> {
    let token = tokens.next().ok_or(AliasSetError::UnexpectedEnd)?;
    token
        .parse()
        .map_err(|_| AliasSetError::ExpectedCount(token.to_string()))
}

fn local_name(value: &str) -> String {
    if value.starts_with('%') {
        value.to_string()
    } else {
        format!("%{}", value)
    }
}

impl AliasOracle for AliasSets {
    fn alias(&self, program: &Program, a: AliasId, b: AliasId) -> AliasKind {
        if a.value.is_const() || b.value.is_const() {
            return AliasKind::No;
        }
        let a = a.scoped_name(program);
        let b = b.scoped_name(program);
        if a == b {
            return AliasKind::Must;
        }
        self.sets
            .iter()
            .filter(|set| set.kind != AliasKind::No)
            .find_map(|set| set.relates(&a, &b))
            .unwrap_or(AliasKind::No)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Operand;
    use crate::ir::builder::ProgramBuilder;

    const SETS: &str = "must 1\nset 2 @m worker lock\nmay 1\nset 2 @a @b\nno 1\nset 2 @m @a\n";

    #[test]
    fn parses_groups() {
        let sets = AliasSets::parse(SETS).unwrap();
        assert_eq!(sets.sets.len(), 3);
        assert_eq!(sets.sets[0].kind, AliasKind::Must);
        assert!(
            sets.sets[0]
                .members
                .contains(&(Some("worker".to_string()), "%lock".to_string()))
        );
    }

    #[test]
    fn answers_from_sets() {
        let mut pb = ProgramBuilder::new("p");
        let m = pb.global("m");
        let a = pb.global("a");
        let b = pb.global("b");
        let worker = pb.function("worker", &["lock"]);
        let program = pb.build().unwrap();
        let sets = AliasSets::parse(SETS).unwrap();

        let id = |op| AliasId::new(worker, op);
        assert_eq!(
            sets.alias(&program, id(Operand::Global(m)), id(Operand::Arg(0))),
            AliasKind::Must
        );
        assert_eq!(
            sets.alias(&program, id(Operand::Global(a)), id(Operand::Global(b))),
            AliasKind::May
        );
        assert_eq!(
            sets.alias(&program, id(Operand::Global(m)), id(Operand::Global(a))),
            AliasKind::No
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(
            AliasSets::parse("maybe 1"),
            Err(AliasSetError::UnknownKind(_))
        ));
        assert!(matches!(
            AliasSets::parse("must x"),
            Err(AliasSetError::ExpectedCount(_))
        ));
        assert!(matches!(
            AliasSets::parse("must 1 set 3 @m"),
            Err(AliasSetError::UnexpectedEnd)
        ));
    }
}
