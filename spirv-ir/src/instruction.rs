use crate::block::BlockId;
use crate::error::{IrError, IrResult};
use crate::function::FunctionId;
use crate::id::Id;
use crate::opcode::{self, Opcode};
use crate::operand::Operand;
use crate::module::Module;

/// Arena key for an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstId(pub(crate) u32);

/// Where an instruction currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Container {
    Detached,
    Global,
    Block(BlockId),
}

#[derive(Debug)]
pub(crate) struct InstructionData {
    pub(crate) opcode: Opcode,
    pub(crate) result_id: Option<Id>,
    pub(crate) type_id: Option<Id>,
    pub(crate) operands: Vec<Operand>,
    pub(crate) container: Container,
    pub(crate) function: Option<FunctionId>,
}

/// A constant's value, as interpreted by [`Module::value`] and friends.
///
/// Integer values are widened to `i128` so both signed and unsigned
/// 64-bit results fit without a separate variant.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Bool(bool),
    Int(i128),
    Float(f64),
    Composite(Vec<ConstValue>),
}

impl Module {
    pub(crate) fn inst_data(&self, inst: InstId) -> &InstructionData {
        self.insts[inst.0 as usize].as_ref().expect("instruction used after destruction")
    }

    pub(crate) fn inst_data_mut(&mut self, inst: InstId) -> &mut InstructionData {
        self.insts[inst.0 as usize].as_mut().expect("instruction used after destruction")
    }

    pub fn opcode(&self, inst: InstId) -> Opcode {
        self.inst_data(inst).opcode
    }

    pub fn result_id(&self, inst: InstId) -> Option<Id> {
        self.inst_data(inst).result_id
    }

    pub fn type_id(&self, inst: InstId) -> Option<Id> {
        self.inst_data(inst).type_id
    }

    pub fn operands(&self, inst: InstId) -> &[Operand] {
        &self.inst_data(inst).operands
    }

    pub fn set_operands(&mut self, inst: InstId, operands: Vec<Operand>) {
        self.inst_data_mut(inst).operands = operands;
    }

    pub fn function_of(&self, inst: InstId) -> Option<FunctionId> {
        self.inst_data(inst).function
    }

    /// The basic block an attached body instruction lives in, or `None` for
    /// global/detached instructions.
    pub fn block_of(&self, inst: InstId) -> Option<BlockId> {
        match self.inst_data(inst).container {
            Container::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn is_attached(&self, inst: InstId) -> bool {
        !matches!(self.inst_data(inst).container, Container::Detached)
    }

    /// Create a new instruction, attached to no container yet.
    ///
    /// Allocates a fresh *temporary* result id when the opcode's metadata
    /// says it has a result and `result_id` was not supplied; the caller
    /// (or a later `renumber_temp_ids`) is responsible for giving it a
    /// concrete value before the module is serialized.
    pub fn create_inst(
        &mut self,
        opcode: Opcode,
        type_id: Option<Id>,
        operands: Vec<Operand>,
        result_id: Option<Id>,
    ) -> IrResult<InstId> {
        let info = opcode.info();
        let result_id = match result_id {
            Some(id) => Some(id),
            None if info.has_result => Some(self.new_temporary_id()),
            None => None,
        };

        if opcode == Opcode::OpFunction {
            let func_type_id = operands
                .get(1)
                .and_then(Operand::as_id)
                .ok_or_else(|| IrError::Invalid("OpFunction missing function-type operand".into()))?;
            let func_type_inst = self
                .defining_inst(func_type_id)
                .ok_or_else(|| IrError::Invalid("OpFunction's type operand is undefined".into()))?;
            if self.opcode(func_type_inst) != Opcode::OpTypeFunction {
                return Err(IrError::Invalid("expected OpTypeFunction as second operand".into()));
            }
        }

        if let Some(id) = result_id {
            if self.id_slot(id).inst.is_some() {
                return Err(IrError::AlreadyDefined(format!("{id}")));
            }
        }

        self.insts.push(Some(InstructionData {
            opcode,
            result_id,
            type_id,
            operands,
            container: Container::Detached,
            function: None,
        }));
        let inst = InstId((self.insts.len() - 1) as u32);
        if let Some(id) = result_id {
            self.id_slot_mut(id).inst = Some(inst);
        }
        Ok(inst)
    }

    /// Register the use edges an instruction's type-id and operands
    /// impose on their target ids.
    pub(crate) fn register_uses(&mut self, inst: InstId) {
        if let Some(type_id) = self.inst_data(inst).type_id {
            self.add_use(type_id, inst);
        }
        let ids: Vec<Id> = self.inst_data(inst).operands.iter().filter_map(Operand::as_id).collect();
        for id in ids {
            self.add_use(id, inst);
        }
    }

    pub(crate) fn unregister_uses(&mut self, inst: InstId) {
        if let Some(type_id) = self.inst_data(inst).type_id {
            self.remove_use(type_id, inst);
        }
        let ids: Vec<Id> = self.inst_data(inst).operands.iter().filter_map(Operand::as_id).collect();
        for id in ids {
            self.remove_use(id, inst);
        }
    }

    /// True if this instruction belongs outside any function body (the
    /// `OpVariable`-with-`Function`-storage-class instruction is the one
    /// exception: it is a global opcode, but a body instruction).
    pub fn is_global_inst(&self, inst: InstId) -> bool {
        let data = self.inst_data(inst);
        if !opcode::is_global_opcode(data.opcode) {
            return false;
        }
        if data.opcode == Opcode::OpVariable {
            if let Some(Operand::Enum(storage_class)) = data.operands.first() {
                if storage_class == "Function" {
                    return false;
                }
            }
        }
        true
    }

    pub fn insert_inst_after(&mut self, inst: InstId, pos: InstId) -> IrResult<()> {
        match self.inst_data(pos).container {
            Container::Detached => Err(IrError::MisplacedInstruction("position instruction is detached".into())),
            Container::Global => self.global_insert_after(inst, pos),
            Container::Block(block) => self.block_insert_after(block, inst, pos),
        }
    }

    pub fn insert_inst_before(&mut self, inst: InstId, pos: InstId) -> IrResult<()> {
        match self.inst_data(pos).container {
            Container::Detached => Err(IrError::MisplacedInstruction("position instruction is detached".into())),
            Container::Global => self.global_insert_before(inst, pos),
            Container::Block(block) => self.block_insert_before(block, inst, pos),
        }
    }

    /// Detach `inst` from its container, unregistering its use edges but
    /// leaving the instruction (and its result id's definition) intact
    /// so it can be reinserted.
    pub fn remove_inst(&mut self, inst: InstId) -> IrResult<()> {
        match self.inst_data(inst).container {
            Container::Detached => Err(IrError::Invalid("instruction is not attached".into())),
            Container::Global => {
                self.global_remove(inst);
                Ok(())
            }
            Container::Block(block) => {
                self.block_remove(block, inst);
                Ok(())
            }
        }
    }

    /// Destroy an instruction: cascade-destroy its debug/decoration
    /// instructions, detach it from its container, and clear its result
    /// id's definition.
    pub fn destroy_inst(&mut self, inst: InstId) {
        if let Some(result_id) = self.result_id(inst) {
            let dependents: Vec<InstId> = self
                .uses_of(result_id)
                .into_iter()
                .filter(|&u| {
                    let op = self.opcode(u);
                    opcode::DECORATION_INSTRUCTIONS.contains(&op) || opcode::DEBUG_INSTRUCTIONS.contains(&op)
                })
                .collect();
            for dep in dependents {
                self.destroy_inst(dep);
            }
        }
        if self.is_attached(inst) {
            let _ = self.remove_inst(inst);
        }
        if let Some(result_id) = self.result_id(inst) {
            self.id_slot_mut(result_id).inst = None;
        }
        self.insts[inst.0 as usize] = None;
    }

    /// Instructions that use `inst`'s result, excluding decoration and
    /// debug instructions (those are considered part of `inst`, not
    /// separate users).
    pub fn uses(&self, inst: InstId) -> Vec<InstId> {
        match self.result_id(inst) {
            None => Vec::new(),
            Some(id) => self
                .uses_of(id)
                .into_iter()
                .filter(|&u| {
                    let op = self.opcode(u);
                    !opcode::DECORATION_INSTRUCTIONS.contains(&op) && !opcode::DEBUG_INSTRUCTIONS.contains(&op)
                })
                .collect(),
        }
    }

    /// The `OpDecorate`/`OpMemberDecorate`/... instructions targeting
    /// `inst`'s result, sorted by decoration kind for determinism.
    pub fn get_decorations(&self, inst: InstId) -> Vec<InstId> {
        let Some(id) = self.result_id(inst) else { return Vec::new() };
        let mut decorations: Vec<InstId> = self
            .uses_of(id)
            .into_iter()
            .filter(|&u| opcode::DECORATION_INSTRUCTIONS.contains(&self.opcode(u)))
            .collect();
        decorations.sort_by_key(|&d| format!("{:?}", self.operands(d).get(1)));
        decorations
    }

    pub fn replace_uses_with(&mut self, inst: InstId, new_inst: InstId) {
        let Some(old_id) = self.result_id(inst) else { return };
        let new_id = self.result_id(new_inst);
        for user in self.uses(inst) {
            self.unregister_uses(user);
            let data = self.inst_data_mut(user);
            if data.type_id == Some(old_id) {
                data.type_id = new_id;
            }
            for operand in &mut data.operands {
                if *operand == Operand::Id(old_id) {
                    if let Some(nid) = new_id {
                        *operand = Operand::Id(nid);
                    }
                }
            }
            self.register_uses(user);
        }
    }

    /// Insert `new_inst` after `inst`, replace all uses of `inst` with
    /// `new_inst`, then destroy `inst`.
    pub fn replace_with(&mut self, inst: InstId, new_inst: InstId) -> IrResult<()> {
        self.insert_inst_after(new_inst, inst)?;
        self.replace_uses_with(inst, new_inst);
        self.destroy_inst(inst);
        Ok(())
    }

    pub fn has_side_effects(&self, inst: InstId) -> bool {
        let data = self.inst_data(inst);
        if data.result_id.is_none() && data.opcode != Opcode::OpNop {
            return true;
        }
        if data.opcode == Opcode::OpExtInst {
            let Some(set_id) = data.operands.first().and_then(Operand::as_id) else { return true };
            let Some(set_inst) = self.defining_inst(set_id) else { return true };
            let Some(set_name) = self.operands(set_inst).first().and_then(Operand::as_literal_string) else {
                return true;
            };
            let Some(number) = data.operands.get(1).and_then(Operand::as_literal_number) else { return true };
            return match opcode::ext_inst_info(set_name, number) {
                Some(info) => info.has_side_effects,
                None => true,
            };
        }
        opcode::HAS_SIDE_EFFECT.contains(&data.opcode)
    }

    pub fn is_commutative(&self, inst: InstId) -> bool {
        let data = self.inst_data(inst);
        if data.opcode == Opcode::OpExtInst {
            let set_id = match data.operands.first().and_then(Operand::as_id) {
                Some(id) => id,
                None => return false,
            };
            let set_inst = match self.defining_inst(set_id) {
                Some(i) => i,
                None => return false,
            };
            let set_name = match self.operands(set_inst).first().and_then(Operand::as_literal_string) {
                Some(s) => s,
                None => return false,
            };
            let number = match data.operands.get(1).and_then(Operand::as_literal_number) {
                Some(n) => n,
                None => return false,
            };
            return opcode::ext_inst_info(set_name, number).map(|i| i.is_commutative).unwrap_or(false);
        }
        opcode::IS_COMMUTATIVE.contains(&data.opcode)
    }

    pub fn add_to_phi(&mut self, phi: InstId, variable_inst: InstId, parent_inst: InstId) {
        debug_assert_eq!(self.opcode(phi), Opcode::OpPhi);
        let var_id = self.result_id(variable_inst).expect("phi operand must have a result id");
        let parent_id = self.result_id(parent_inst).expect("phi parent must have a result id (its label)");
        self.inst_data_mut(phi).operands.push(Operand::Id(var_id));
        self.add_use(var_id, phi);
        self.inst_data_mut(phi).operands.push(Operand::Id(parent_id));
        self.add_use(parent_id, phi);
    }

    /// Remove the `(value, parent)` pair naming `parent_id` from a phi
    /// node, unregistering both use edges.
    pub fn remove_from_phi(&mut self, phi: InstId, parent_id: Id) {
        debug_assert_eq!(self.opcode(phi), Opcode::OpPhi);
        let operands = &self.inst_data(phi).operands;
        let idx = operands
            .iter()
            .position(|op| *op == Operand::Id(parent_id))
            .expect("parent_id is not an operand of this phi");
        let value_id = operands[idx - 1].as_id().expect("phi value operand must be an id");
        self.inst_data_mut(phi).operands.drain(idx - 1..=idx);
        self.remove_use(value_id, phi);
        self.remove_use(parent_id, phi);
    }

    pub fn copy_decorations(&mut self, inst: InstId, src_inst: InstId) -> IrResult<()> {
        let target_id = self.result_id(inst);
        for decoration in self.get_decorations(src_inst) {
            let mut operands = self.operands(decoration).to_vec();
            if let (Some(Operand::Id(_)), Some(target)) = (operands.first(), target_id) {
                operands[0] = Operand::Id(target);
            }
            let opcode = self.opcode(decoration);
            let new_inst = self.create_inst(opcode, None, operands, None)?;
            self.insert_inst_after(new_inst, decoration)?;
        }
        Ok(())
    }

    pub fn is_constant_value(&self, inst: InstId, value: &ConstValue) -> bool {
        if self.type_id(inst).is_none() {
            return false;
        }
        let op = self.opcode(inst);
        if !opcode::CONSTANT_INSTRUCTIONS.contains(&op) {
            return false;
        }
        match self.value(inst) {
            Some(actual) => values_equal(&actual, value),
            None => false,
        }
    }

    pub fn value_unsigned(&self, inst: InstId) -> Option<ConstValue> {
        let type_id = self.type_id(inst)?;
        let type_inst = self.defining_inst(type_id)?;
        if self.opcode(type_inst) == Opcode::OpTypeVector || self.opcode(type_inst) == Opcode::OpTypeMatrix {
            let elems = self
                .operands(inst)
                .iter()
                .filter_map(Operand::as_id)
                .filter_map(|id| self.defining_inst(id))
                .filter_map(|e| self.value_unsigned(e))
                .collect();
            return Some(ConstValue::Composite(elems));
        }
        let bitwidth = self.operands(type_inst).first().and_then(Operand::as_literal_number)? as u32;
        let lo = self.operands(inst).first().and_then(Operand::as_literal_number)? as u64;
        let mut val = lo;
        if bitwidth == 64 {
            let hi = self.operands(inst).get(1).and_then(Operand::as_literal_number)? as u64;
            val |= hi << 32;
        }
        if bitwidth < 64 {
            val &= (1u64 << bitwidth) - 1;
        }
        Some(ConstValue::Int(val as i128))
    }

    pub fn value_signed(&self, inst: InstId) -> Option<ConstValue> {
        let type_id = self.type_id(inst)?;
        let type_inst = self.defining_inst(type_id)?;
        if self.opcode(type_inst) == Opcode::OpTypeVector || self.opcode(type_inst) == Opcode::OpTypeMatrix {
            let elems = self
                .operands(inst)
                .iter()
                .filter_map(Operand::as_id)
                .filter_map(|id| self.defining_inst(id))
                .filter_map(|e| self.value_signed(e))
                .collect();
            return Some(ConstValue::Composite(elems));
        }
        let ConstValue::Int(unsigned) = self.value_unsigned(inst)? else { return None };
        let bitwidth = self.operands(type_inst).first().and_then(Operand::as_literal_number)? as u32;
        let signed_max = (1i128 << (bitwidth - 1)) - 1;
        if unsigned <= signed_max {
            Some(ConstValue::Int(unsigned))
        } else {
            Some(ConstValue::Int(unsigned - (1i128 << bitwidth)))
        }
    }

    pub fn value(&self, inst: InstId) -> Option<ConstValue> {
        match self.opcode(inst) {
            Opcode::OpConstantTrue => Some(ConstValue::Bool(true)),
            Opcode::OpConstantFalse => Some(ConstValue::Bool(false)),
            Opcode::OpConstant => {
                let type_id = self.type_id(inst)?;
                let type_inst = self.defining_inst(type_id)?;
                match self.opcode(type_inst) {
                    Opcode::OpTypeInt => {
                        let is_signed = self.operands(type_inst).get(1).and_then(Operand::as_literal_number) == Some(1);
                        if is_signed { self.value_signed(inst) } else { self.value_unsigned(inst) }
                    }
                    Opcode::OpTypeFloat => {
                        let bitwidth = self.operands(type_inst).first().and_then(Operand::as_literal_number)? as u32;
                        let lo = self.operands(inst).first().and_then(Operand::as_literal_number)? as u64;
                        let bits = if bitwidth == 64 {
                            let hi = self.operands(inst).get(1).and_then(Operand::as_literal_number)? as u64;
                            lo | (hi << 32)
                        } else {
                            lo
                        };
                        Some(ConstValue::Float(bits_to_float(bitwidth, bits)))
                    }
                    _ => None,
                }
            }
            Opcode::OpConstantComposite => {
                let type_id = self.type_id(inst)?;
                let type_inst = self.defining_inst(type_id)?;
                if matches!(self.opcode(type_inst), Opcode::OpTypeVector | Opcode::OpTypeMatrix) {
                    let elems = self
                        .operands(inst)
                        .iter()
                        .filter_map(Operand::as_id)
                        .filter_map(|id| self.defining_inst(id))
                        .filter_map(|e| self.value(e))
                        .collect();
                    Some(ConstValue::Composite(elems))
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

fn values_equal(a: &ConstValue, b: &ConstValue) -> bool {
    match (a, b) {
        (ConstValue::Bool(x), ConstValue::Bool(y)) => x == y,
        (ConstValue::Int(x), ConstValue::Int(y)) => x == y,
        (ConstValue::Float(x), ConstValue::Float(y)) => x == y,
        (ConstValue::Composite(xs), ConstValue::Composite(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        _ => false,
    }
}

pub fn float_to_bits(bitwidth: u32, value: f64) -> u64 {
    if bitwidth == 64 {
        value.to_bits()
    } else {
        (value as f32).to_bits() as u64
    }
}

pub fn bits_to_float(bitwidth: u32, value: u64) -> f64 {
    if bitwidth == 64 {
        f64::from_bits(value)
    } else {
        f32::from_bits(value as u32) as f64
    }
}
