use crate::error::{IrError, IrResult};
use crate::function::FunctionId;
use crate::instruction::{Container, InstId};
use crate::module::Module;
use crate::opcode::Opcode;
use crate::operand::Operand;

/// Arena key for a basic block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub(crate) u32);

#[derive(Debug)]
pub(crate) struct BasicBlockData {
    pub(crate) label_inst: InstId,
    pub(crate) insts: Vec<InstId>,
    pub(crate) function: Option<FunctionId>,
}

impl Module {
    pub(crate) fn block_data(&self, block: BlockId) -> &BasicBlockData {
        self.blocks[block.0 as usize].as_ref().expect("basic block used after destruction")
    }

    pub(crate) fn block_data_mut(&mut self, block: BlockId) -> &mut BasicBlockData {
        self.blocks[block.0 as usize].as_mut().expect("basic block used after destruction")
    }

    /// Create a new, detached basic block with a fresh (or given) label.
    pub fn create_block(&mut self, label_id: Option<crate::id::Id>) -> IrResult<BlockId> {
        let label_inst = self.create_inst(Opcode::OpLabel, None, Vec::new(), label_id)?;
        self.blocks.push(Some(BasicBlockData { label_inst, insts: Vec::new(), function: None }));
        let block = BlockId((self.blocks.len() - 1) as u32);
        self.inst_data_mut(label_inst).container = Container::Block(block);
        Ok(block)
    }

    pub fn label_inst(&self, block: BlockId) -> InstId {
        self.block_data(block).label_inst
    }

    pub fn block_function(&self, block: BlockId) -> Option<FunctionId> {
        self.block_data(block).function
    }

    /// Body instructions, in order, including the terminator.
    pub fn block_insts(&self, block: BlockId) -> Vec<InstId> {
        self.block_data(block).insts.clone()
    }

    pub fn append_inst_to_block(&mut self, block: BlockId, inst: InstId) -> IrResult<()> {
        if self.is_global_inst(inst) {
            return Err(IrError::MisplacedInstruction(format!("{} is a global instruction", self.opcode(inst))));
        }
        self.block_data_mut(block).insts.push(inst);
        let function = self.block_data(block).function;
        let data = self.inst_data_mut(inst);
        data.container = Container::Block(block);
        data.function = function;
        self.register_uses(inst);
        Ok(())
    }

    pub fn prepend_inst_to_block(&mut self, block: BlockId, inst: InstId) -> IrResult<()> {
        if self.is_global_inst(inst) {
            return Err(IrError::MisplacedInstruction(format!("{} is a global instruction", self.opcode(inst))));
        }
        self.block_data_mut(block).insts.insert(0, inst);
        let function = self.block_data(block).function;
        let data = self.inst_data_mut(inst);
        data.container = Container::Block(block);
        data.function = function;
        self.register_uses(inst);
        Ok(())
    }

    pub(crate) fn block_insert_after(&mut self, block: BlockId, inst: InstId, pos: InstId) -> IrResult<()> {
        let idx = self
            .block_data(block)
            .insts
            .iter()
            .position(|&i| i == pos)
            .ok_or_else(|| IrError::Invalid("position instruction is not in this basic block".into()))?;
        self.block_data_mut(block).insts.insert(idx + 1, inst);
        let function = self.block_data(block).function;
        let data = self.inst_data_mut(inst);
        data.container = Container::Block(block);
        data.function = function;
        self.register_uses(inst);
        Ok(())
    }

    pub(crate) fn block_insert_before(&mut self, block: BlockId, inst: InstId, pos: InstId) -> IrResult<()> {
        let idx = self
            .block_data(block)
            .insts
            .iter()
            .position(|&i| i == pos)
            .ok_or_else(|| IrError::Invalid("position instruction is not in this basic block".into()))?;
        self.block_data_mut(block).insts.insert(idx, inst);
        let function = self.block_data(block).function;
        let data = self.inst_data_mut(inst);
        data.container = Container::Block(block);
        data.function = function;
        self.register_uses(inst);
        Ok(())
    }

    pub(crate) fn block_remove(&mut self, block: BlockId, inst: InstId) {
        self.unregister_uses(inst);
        self.block_data_mut(block).insts.retain(|&i| i != inst);
        let data = self.inst_data_mut(inst);
        data.container = Container::Detached;
        data.function = None;
    }

    /// Successor basic blocks, derived from the block's terminator.
    pub fn get_successors(&self, block: BlockId) -> Vec<BlockId> {
        let insts = &self.block_data(block).insts;
        let Some(&terminator) = insts.last() else { return Vec::new() };
        match self.opcode(terminator) {
            Opcode::OpBranch => {
                let target = self.operands(terminator)[0].as_id().expect("OpBranch target must be an id");
                self.defining_inst(target).and_then(|i| self.block_of(i)).into_iter().collect()
            }
            Opcode::OpBranchConditional => {
                let then_id = self.operands(terminator)[1].as_id().expect("then target must be an id");
                let else_id = self.operands(terminator)[2].as_id().expect("else target must be an id");
                [then_id, else_id]
                    .into_iter()
                    .filter_map(|id| self.defining_inst(id).and_then(|i| self.block_of(i)))
                    .collect()
            }
            Opcode::OpSwitch => {
                let operands = self.operands(terminator);
                let mut successors = Vec::new();
                if let Some(default_id) = operands[1].as_id() {
                    if let Some(b) = self.defining_inst(default_id).and_then(|i| self.block_of(i)) {
                        successors.push(b);
                    }
                }
                let mut rest = operands[2..].iter();
                while let Some(_literal) = rest.next() {
                    if let Some(Operand::Id(target)) = rest.next() {
                        if let Some(b) = self.defining_inst(*target).and_then(|i| self.block_of(i)) {
                            successors.push(b);
                        }
                    }
                }
                successors
            }
            _ => Vec::new(),
        }
    }

    /// Predecessor basic blocks, derived from the label's use-set
    /// (excluding `OpPhi` references, which do not control flow).
    pub fn predecessors(&self, block: BlockId) -> Vec<BlockId> {
        let label = self.label_inst(block);
        let Some(label_id) = self.result_id(label) else { return Vec::new() };
        self.uses_of(label_id)
            .into_iter()
            .filter(|&u| self.opcode(u) != Opcode::OpPhi)
            .filter_map(|u| self.block_of(u))
            .collect()
    }

    /// Detach the basic block from its function.
    pub fn remove_block(&mut self, block: BlockId) -> IrResult<()> {
        let Some(function) = self.block_data(block).function else {
            return Err(IrError::Invalid("basic block is not in a function".into()));
        };
        self.function_data_mut(function).basic_blocks.retain(|&b| b != block);
        self.block_data_mut(block).function = None;
        let insts = self.block_data(block).insts.clone();
        for inst in insts {
            self.inst_data_mut(inst).function = None;
        }
        Ok(())
    }

    /// Destroy the basic block: unhook phi entries in users first, then
    /// destroy every body instruction in reverse order.
    pub fn destroy_block(&mut self, block: BlockId) -> IrResult<()> {
        self.remove_block(block)?;
        let label = self.label_inst(block);
        if let Some(label_id) = self.result_id(label) {
            let users = self.uses_of(label_id);
            for user in users {
                if self.opcode(user) == Opcode::OpPhi {
                    self.remove_from_phi(user, label_id);
                }
            }
        }
        let insts = self.block_data(block).insts.clone();
        for inst in insts.into_iter().rev() {
            self.destroy_inst(inst);
        }
        self.destroy_inst(label);
        self.blocks[block.0 as usize] = None;
        Ok(())
    }
}
