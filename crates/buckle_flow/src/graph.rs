//! Basic blocks, branches and the control-flow graph.

use buckle_ast::SyntaxKind;
use buckle_bound::constant_folding::fold_unary;
use buckle_bound::{
    BoundBlockStatement, BoundExpression, BoundLabel, BoundStatement, BoundUnaryOperator, Value,
};
use buckle_diagnostics::InternalError;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::fmt;
use std::io;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicBlockKind {
    Start,
    End,
    Body,
}

#[derive(Debug)]
pub struct BasicBlock {
    id: BlockId,
    kind: BasicBlockKind,
    statements: Vec<Arc<BoundStatement>>,
    /// Control leaves this block only by returning.
    returns: bool,
}

impl BasicBlock {
    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn kind(&self) -> BasicBlockKind {
        self.kind
    }

    pub fn statements(&self) -> &[Arc<BoundStatement>] {
        &self.statements
    }

    pub fn ends_in_return(&self) -> bool {
        self.returns
    }
}

impl fmt::Display for BasicBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            BasicBlockKind::Start => f.write_str("<Start>"),
            BasicBlockKind::End => f.write_str("<End>"),
            BasicBlockKind::Body => {
                for statement in &self.statements {
                    write!(f, "{}", statement)?;
                }
                Ok(())
            }
        }
    }
}

/// A directed edge. No condition means the edge is always taken.
#[derive(Debug)]
pub struct BasicBlockBranch {
    pub from: BlockId,
    pub to: BlockId,
    pub condition: Option<Arc<BoundExpression>>,
}

impl fmt::Display for BasicBlockBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.condition {
            Some(condition) => write!(f, "{}", condition),
            None => Ok(()),
        }
    }
}

#[derive(Debug)]
pub struct ControlFlowGraph {
    start: BlockId,
    end: BlockId,
    blocks: IndexMap<BlockId, BasicBlock>,
    branches: Vec<BasicBlockBranch>,
}

impl ControlFlowGraph {
    /// Build the graph of a lowered body and prune its unreachable blocks.
    pub fn create(body: &BoundBlockStatement) -> Result<Self, InternalError> {
        let mut graph = Self::build(body)?;
        let removed = graph.remove_unreachable_blocks();
        debug!(
            blocks = graph.blocks.len(),
            branches = graph.branches.len(),
            removed,
            "built control flow graph"
        );
        Ok(graph)
    }

    /// Build the graph without pruning.
    pub fn build(body: &BoundBlockStatement) -> Result<Self, InternalError> {
        GraphBuilder::new(false).build(body)
    }

    pub fn start(&self) -> BlockId {
        self.start
    }

    pub fn end(&self) -> BlockId {
        self.end
    }

    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.blocks.values()
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(&id)
    }

    pub fn branches(&self) -> &[BasicBlockBranch] {
        &self.branches
    }

    pub fn incoming(&self, id: BlockId) -> impl Iterator<Item = &BasicBlockBranch> {
        self.branches.iter().filter(move |branch| branch.to == id)
    }

    pub fn outgoing(&self, id: BlockId) -> impl Iterator<Item = &BasicBlockBranch> {
        self.branches.iter().filter(move |branch| branch.from == id)
    }

    /// Remove body blocks without incoming branches, repeating until none
    /// remain, since removing one block can orphan its successors. Returns
    /// the number of blocks removed.
    pub fn remove_unreachable_blocks(&mut self) -> usize {
        let mut removed = 0;
        loop {
            let dead: Vec<BlockId> = self
                .blocks
                .values()
                .filter(|block| block.kind == BasicBlockKind::Body)
                .filter(|block| self.incoming(block.id).next().is_none())
                .map(|block| block.id)
                .collect();
            if dead.is_empty() {
                return removed;
            }
            for id in &dead {
                self.branches.retain(|branch| branch.from != *id && branch.to != *id);
                self.blocks.shift_remove(id);
            }
            removed += dead.len();
        }
    }

    /// Every branch into `<End>` leaves a block that returns. A graph where
    /// nothing reaches `<End>` does not qualify.
    pub fn returns_on_all_paths(&self) -> bool {
        let mut incoming = self.incoming(self.end).peekable();
        if incoming.peek().is_none() {
            return false;
        }
        incoming.all(|branch| self.blocks.get(&branch.from).is_some_and(|block| block.returns))
    }

    /// Write the graph in Graphviz DOT format.
    pub fn write_dot<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        let names: FxHashMap<BlockId, String> = self
            .blocks
            .keys()
            .enumerate()
            .map(|(i, id)| (*id, format!("N{}", i)))
            .collect();

        writeln!(writer, "digraph G {{")?;
        for block in self.blocks.values() {
            writeln!(
                writer,
                "    {} [label = \"{}\", shape = box]",
                names[&block.id],
                quote(&block.to_string())
            )?;
        }
        for branch in &self.branches {
            writeln!(
                writer,
                "    {} -> {} [label = \"{}\"]",
                names[&branch.from],
                names[&branch.to],
                quote(&branch.to_string())
            )?;
        }
        writeln!(writer, "}}")
    }
}

fn quote(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\l")
}

/// Whether every path through a lowered body ends in a `return`.
pub fn all_paths_return(body: &BoundBlockStatement) -> Result<bool, InternalError> {
    Ok(ControlFlowGraph::create(body)?.returns_on_all_paths())
}

// ============================================================================
// Construction
// ============================================================================

struct GraphBuilder {
    /// Gotos may target labels outside the body, as in a `try` body.
    allow_escaping: bool,
    blocks: IndexMap<BlockId, BasicBlock>,
    branches: Vec<BasicBlockBranch>,
}

impl GraphBuilder {
    fn new(allow_escaping: bool) -> Self {
        Self {
            allow_escaping,
            blocks: IndexMap::new(),
            branches: Vec::new(),
        }
    }

    fn build(mut self, body: &BoundBlockStatement) -> Result<ControlFlowGraph, InternalError> {
        let partition = partition(body)?;
        let start = BlockId(0);
        let end = BlockId(partition.len() + 1);

        self.add_block(start, BasicBlockKind::Start, Vec::new());
        let mut labels: FxHashMap<&BoundLabel, BlockId> = FxHashMap::default();
        for (i, statements) in partition.iter().enumerate() {
            let id = BlockId(i + 1);
            if let Some(BoundStatement::Label(label)) = statements.first().map(|statement| &**statement) {
                labels.insert(label, id);
            }
            self.add_block(id, BasicBlockKind::Body, statements.clone());
        }
        self.add_block(end, BasicBlockKind::End, Vec::new());

        if partition.is_empty() {
            self.connect(start, end, None);
        } else {
            self.connect(start, BlockId(1), None);
        }

        for (i, statements) in partition.iter().enumerate() {
            let id = BlockId(i + 1);
            let next = BlockId(i + 2);
            let Some(last) = statements.last() else {
                continue;
            };
            match &**last {
                BoundStatement::Goto(label) => {
                    let target = self.target(&labels, label, end)?;
                    self.connect(id, target, None);
                }
                BoundStatement::ConditionalGoto { label, condition, jump_if_true } => {
                    let target = self.target(&labels, label, end)?;
                    let negated = negate(condition);
                    let (jump_condition, fallthrough_condition) = if *jump_if_true {
                        (Some(condition.clone()), negated)
                    } else {
                        (negated, Some(condition.clone()))
                    };
                    self.connect(id, target, jump_condition);
                    self.connect(id, next, fallthrough_condition);
                }
                BoundStatement::Return { .. } => {
                    self.mark_returning(id);
                    self.connect(id, end, None);
                }
                BoundStatement::Try { body, catch_body, finally_body } => {
                    let mut escaping = Vec::new();
                    for block in [Some(body), catch_body.as_ref(), finally_body.as_ref()].into_iter().flatten() {
                        escaping_labels(block, &mut escaping);
                    }
                    for label in escaping {
                        if let Some(target) = labels.get(&label) {
                            self.connect(id, *target, None);
                        } else if !self.allow_escaping {
                            return Err(InternalError::MissingLabel(label.0));
                        }
                    }
                    if try_always_returns(body, catch_body.as_deref(), finally_body.as_deref())? {
                        self.mark_returning(id);
                        self.connect(id, end, None);
                    } else {
                        self.connect(id, next, None);
                    }
                }
                _ => self.connect(id, next, None),
            }
        }

        Ok(ControlFlowGraph {
            start,
            end,
            blocks: self.blocks,
            branches: self.branches,
        })
    }

    fn add_block(&mut self, id: BlockId, kind: BasicBlockKind, statements: Vec<Arc<BoundStatement>>) {
        self.blocks.insert(
            id,
            BasicBlock {
                id,
                kind,
                statements,
                returns: false,
            },
        );
    }

    fn mark_returning(&mut self, id: BlockId) {
        if let Some(block) = self.blocks.get_mut(&id) {
            block.returns = true;
        }
    }

    fn target(
        &self,
        labels: &FxHashMap<&BoundLabel, BlockId>,
        label: &BoundLabel,
        end: BlockId,
    ) -> Result<BlockId, InternalError> {
        match labels.get(label) {
            Some(id) => Ok(*id),
            None if self.allow_escaping => Ok(end),
            None => Err(InternalError::MissingLabel(label.0.clone())),
        }
    }

    /// Add a branch. A condition that folds to `true` is dropped, and a
    /// branch whose condition folds to anything else is never added.
    fn connect(&mut self, from: BlockId, to: BlockId, condition: Option<Arc<BoundExpression>>) {
        let condition = match condition {
            Some(condition) => match condition.constant() {
                Some(constant) if constant.value == Value::Bool(true) => None,
                Some(_) => return,
                None => Some(condition),
            },
            None => None,
        };
        self.branches.push(BasicBlockBranch { from, to, condition });
    }
}

/// Split a flat body into basic blocks. Labels start a block; gotos,
/// returns and `try` statements end one.
fn partition(body: &BoundBlockStatement) -> Result<Vec<Vec<Arc<BoundStatement>>>, InternalError> {
    let mut blocks = Vec::new();
    let mut current: Vec<Arc<BoundStatement>> = Vec::new();
    for statement in &body.statements {
        match &**statement {
            BoundStatement::Label(_) => {
                if !current.is_empty() {
                    blocks.push(std::mem::take(&mut current));
                }
                current.push(statement.clone());
            }
            BoundStatement::Goto(_)
            | BoundStatement::ConditionalGoto { .. }
            | BoundStatement::Return { .. }
            | BoundStatement::Try { .. } => {
                current.push(statement.clone());
                blocks.push(std::mem::take(&mut current));
            }
            BoundStatement::VariableDeclaration { .. } | BoundStatement::Expression { .. } | BoundStatement::Nop => {
                current.push(statement.clone());
            }
            other => {
                return Err(InternalError::UnexpectedStatement {
                    kind: other.kind().as_str(),
                    stage: "control flow analysis",
                })
            }
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    Ok(blocks)
}

/// `!condition`, folding boolean constants. `None` if the condition is not
/// a boolean (an error-typed condition).
fn negate(condition: &Arc<BoundExpression>) -> Option<Arc<BoundExpression>> {
    if let Some(constant) = condition.constant() {
        if let Value::Bool(value) = constant.value {
            return Some(Arc::new(BoundExpression::literal(Value::Bool(!value))));
        }
    }
    let operator = BoundUnaryOperator::bind(SyntaxKind::ExclamationToken, &condition.type_clause())?;
    let constant = fold_unary(operator, condition);
    Some(Arc::new(BoundExpression::Unary {
        operator,
        operand: condition.clone(),
        constant,
    }))
}

/// Labels targeted by gotos in `block` that `block` does not define.
fn escaping_labels(block: &BoundBlockStatement, out: &mut Vec<BoundLabel>) {
    let defined: Vec<&BoundLabel> = block
        .statements
        .iter()
        .filter_map(|statement| match &**statement {
            BoundStatement::Label(label) => Some(label),
            _ => None,
        })
        .collect();
    for statement in &block.statements {
        match &**statement {
            BoundStatement::Goto(label) | BoundStatement::ConditionalGoto { label, .. } => {
                if !defined.contains(&label) && !out.contains(label) {
                    out.push(label.clone());
                }
            }
            BoundStatement::Try { body, catch_body, finally_body } => {
                let mut inner = Vec::new();
                for nested in [Some(body), catch_body.as_ref(), finally_body.as_ref()].into_iter().flatten() {
                    escaping_labels(nested, &mut inner);
                }
                for label in inner {
                    if !defined.contains(&&label) && !out.contains(&label) {
                        out.push(label);
                    }
                }
            }
            _ => {}
        }
    }
}

fn body_returns(body: &BoundBlockStatement) -> Result<bool, InternalError> {
    let mut graph = GraphBuilder::new(true).build(body)?;
    graph.remove_unreachable_blocks();
    Ok(graph.returns_on_all_paths())
}

/// A `try` returns on all paths when its `finally` body does, or when its
/// body does and so does its `catch` body, if any.
fn try_always_returns(
    body: &BoundBlockStatement,
    catch_body: Option<&BoundBlockStatement>,
    finally_body: Option<&BoundBlockStatement>,
) -> Result<bool, InternalError> {
    if let Some(finally_body) = finally_body {
        if body_returns(finally_body)? {
            return Ok(true);
        }
    }
    if !body_returns(body)? {
        return Ok(false);
    }
    match catch_body {
        Some(catch_body) => body_returns(catch_body),
        None => Ok(true),
    }
}
