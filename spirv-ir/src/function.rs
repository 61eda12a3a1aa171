use crate::block::BlockId;
use crate::error::{IrError, IrResult};
use crate::id::Id;
use crate::instruction::InstId;
use crate::module::Module;
use crate::opcode::Opcode;
use crate::operand::Operand;

/// Arena key for a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionId(pub(crate) u32);

#[derive(Debug)]
pub(crate) struct FunctionData {
    pub(crate) header_inst: InstId,
    pub(crate) end_inst: InstId,
    pub(crate) parameters: Vec<InstId>,
    pub(crate) basic_blocks: Vec<BlockId>,
}

impl Module {
    pub(crate) fn function_data(&self, function: FunctionId) -> &FunctionData {
        self.functions_arena[function.0 as usize].as_ref().expect("function used after destruction")
    }

    pub(crate) fn function_data_mut(&mut self, function: FunctionId) -> &mut FunctionData {
        self.functions_arena[function.0 as usize].as_mut().expect("function used after destruction")
    }

    /// Create a new function header (`OpFunction` + `OpFunctionEnd`),
    /// detached from the module's function list.
    ///
    /// `function_type` must name an `OpTypeFunction` instruction; its
    /// first operand (the return type) becomes the new `OpFunction`'s
    /// type-id.
    pub fn create_function(
        &mut self,
        function_control: Vec<String>,
        function_type: Id,
        result_id: Option<Id>,
    ) -> IrResult<FunctionId> {
        let type_inst = self
            .defining_inst(function_type)
            .ok_or_else(|| IrError::Invalid("function type id is undefined".into()))?;
        if self.opcode(type_inst) != Opcode::OpTypeFunction {
            return Err(IrError::Invalid("expected OpTypeFunction".into()));
        }
        let return_type = self.operands(type_inst)[0].as_id().expect("OpTypeFunction's first operand is the return type");

        let header_inst = self.create_inst(
            Opcode::OpFunction,
            Some(return_type),
            vec![Operand::Mask(function_control), Operand::Id(function_type)],
            result_id,
        )?;
        self.register_uses(header_inst);
        let end_inst = self.create_inst(Opcode::OpFunctionEnd, None, Vec::new(), None)?;

        self.functions_arena.push(Some(FunctionData {
            header_inst,
            end_inst,
            parameters: Vec::new(),
            basic_blocks: Vec::new(),
        }));
        Ok(FunctionId((self.functions_arena.len() - 1) as u32))
    }

    pub fn function_header(&self, function: FunctionId) -> InstId {
        self.function_data(function).header_inst
    }

    pub fn function_end(&self, function: FunctionId) -> InstId {
        self.function_data(function).end_inst
    }

    pub fn function_parameters(&self, function: FunctionId) -> Vec<InstId> {
        self.function_data(function).parameters.clone()
    }

    pub fn function_basic_blocks(&self, function: FunctionId) -> Vec<BlockId> {
        self.function_data(function).basic_blocks.clone()
    }

    /// Append a parameter; its type must match the next position in the
    /// function type's parameter list.
    pub fn append_parameter(&mut self, function: FunctionId, inst: InstId) -> IrResult<()> {
        if self.opcode(inst) != Opcode::OpFunctionParameter {
            return Err(IrError::Invalid("expected OpFunctionParameter".into()));
        }
        let header = self.function_data(function).header_inst;
        let func_type_id = self.operands(header)[1].as_id().expect("OpFunction's second operand is its type");
        let func_type_inst = self.defining_inst(func_type_id).expect("function type must be defined");
        let params: Vec<Id> = self.operands(func_type_inst)[1..].iter().filter_map(Operand::as_id).collect();
        let idx = self.function_data(function).parameters.len();
        if idx >= params.len() {
            return Err(IrError::ParameterMismatch("too many parameters".into()));
        }
        if self.type_id(inst) != Some(params[idx]) {
            return Err(IrError::ParameterMismatch("incorrect parameter type".into()));
        }
        self.function_data_mut(function).parameters.push(inst);
        self.inst_data_mut(inst).function = Some(function);
        self.register_uses(inst);
        Ok(())
    }

    pub fn append_basic_block(&mut self, function: FunctionId, block: BlockId) {
        self.function_data_mut(function).basic_blocks.push(block);
        self.attach_block_to_function(block, function);
    }

    pub fn prepend_basic_block(&mut self, function: FunctionId, block: BlockId) {
        self.function_data_mut(function).basic_blocks.insert(0, block);
        self.attach_block_to_function(block, function);
    }

    pub fn insert_basic_block_after(&mut self, function: FunctionId, block: BlockId, pos: BlockId) -> IrResult<()> {
        let idx = self
            .function_data(function)
            .basic_blocks
            .iter()
            .position(|&b| b == pos)
            .ok_or_else(|| IrError::Invalid("position block is not in this function".into()))?;
        self.function_data_mut(function).basic_blocks.insert(idx + 1, block);
        self.attach_block_to_function(block, function);
        Ok(())
    }

    pub fn insert_basic_block_before(&mut self, function: FunctionId, block: BlockId, pos: BlockId) -> IrResult<()> {
        let idx = self
            .function_data(function)
            .basic_blocks
            .iter()
            .position(|&b| b == pos)
            .ok_or_else(|| IrError::Invalid("position block is not in this function".into()))?;
        self.function_data_mut(function).basic_blocks.insert(idx, block);
        self.attach_block_to_function(block, function);
        Ok(())
    }

    fn attach_block_to_function(&mut self, block: BlockId, function: FunctionId) {
        self.block_data_mut(block).function = Some(function);
        let label = self.label_inst(block);
        self.inst_data_mut(label).function = Some(function);
        let insts = self.block_insts(block);
        for inst in insts {
            self.inst_data_mut(inst).function = Some(function);
        }
    }

    /// Append `function` at the end of the module's function list.
    pub fn append_function(&mut self, function: FunctionId) {
        self.functions.push(function);
    }

    pub fn prepend_function(&mut self, function: FunctionId) {
        self.functions.insert(0, function);
    }

    pub fn remove_function(&mut self, function: FunctionId) {
        self.functions.retain(|&f| f != function);
    }

    /// Iterate over every instruction in the function: header, parameters,
    /// each block's label and body, then the end sentinel.
    pub fn function_instructions(&self, function: FunctionId) -> Vec<InstId> {
        let data = self.function_data(function);
        let mut out = vec![data.header_inst];
        out.extend(data.parameters.iter().copied());
        for &block in &data.basic_blocks {
            out.push(self.label_inst(block));
            out.extend(self.block_insts(block));
        }
        out.push(data.end_inst);
        out
    }

    pub fn function_instructions_reversed(&self, function: FunctionId) -> Vec<InstId> {
        let mut out = self.function_instructions(function);
        out.reverse();
        out
    }

    /// Destroy the function: its basic blocks (in reverse order), then
    /// parameters, then header/end sentinel.
    pub fn destroy_function(&mut self, function: FunctionId) -> IrResult<()> {
        self.remove_function(function);
        let blocks = self.function_data(function).basic_blocks.clone();
        for block in blocks.into_iter().rev() {
            self.destroy_block(block)?;
        }
        let parameters = self.function_data(function).parameters.clone();
        for param in parameters {
            self.destroy_inst(param);
        }
        let end_inst = self.function_data(function).end_inst;
        self.destroy_inst(end_inst);
        let header_inst = self.function_data(function).header_inst;
        self.destroy_inst(header_inst);
        self.functions_arena[function.0 as usize] = None;
        Ok(())
    }
}
