use std::collections::HashMap;

use crate::block::BlockId;
use crate::error::{IrError, IrResult};
use crate::function::FunctionId;
use crate::id::{Id, IdSlot};
use crate::instruction::{ConstValue, Container, InstId, InstructionData};
use crate::opcode::{self, Opcode};
use crate::operand::Operand;

/// The five canonical buckets global instructions are partitioned into,
/// in serialization order (spec.md §3 "Global ordering").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum GlobalBucket {
    Initial,
    Strings,
    Names,
    Decorations,
    Types,
}

const GLOBAL_BUCKET_ORDER: &[GlobalBucket] = &[
    GlobalBucket::Initial,
    GlobalBucket::Strings,
    GlobalBucket::Names,
    GlobalBucket::Decorations,
    GlobalBucket::Types,
];

fn global_bucket_of(opcode: Opcode) -> Option<GlobalBucket> {
    if opcode::INITIAL_INSTRUCTIONS.contains(&opcode) {
        Some(GlobalBucket::Initial)
    } else if matches!(
        opcode,
        Opcode::OpString | Opcode::OpSourceExtension | Opcode::OpSource | Opcode::OpSourceContinued
    ) {
        Some(GlobalBucket::Strings)
    } else if matches!(opcode, Opcode::OpName | Opcode::OpMemberName) {
        Some(GlobalBucket::Names)
    } else if opcode::DECORATION_INSTRUCTIONS.contains(&opcode) {
        Some(GlobalBucket::Decorations)
    } else if opcode::TYPE_DECLARATION_INSTRUCTIONS.contains(&opcode)
        || opcode::CONSTANT_INSTRUCTIONS.contains(&opcode)
        || opcode::SPECCONSTANT_INSTRUCTIONS.contains(&opcode)
        || opcode::GLOBAL_VARIABLE_INSTRUCTIONS.contains(&opcode)
    {
        Some(GlobalBucket::Types)
    } else {
        None
    }
}

/// The top-level IR container: an id bound, the module's functions (in
/// emission order), and the global instruction buckets.
///
/// `Module` owns two arenas (`insts`, `ids`) keyed by the `InstId`/`Id`
/// newtypes; destroyed slots are left `None` rather than reused, so a
/// stale handle captured by a pass can never silently alias a later
/// insertion (see `SPEC_FULL.md` §3).
#[derive(Debug)]
pub struct Module {
    pub(crate) bound: u32,
    pub(crate) temp_counter: u32,
    pub(crate) ids: Vec<Option<IdSlot>>,
    pub(crate) concrete_ids: HashMap<u32, Id>,
    pub(crate) insts: Vec<Option<InstructionData>>,
    pub(crate) blocks: Vec<Option<crate::block::BasicBlockData>>,
    pub(crate) functions_arena: Vec<Option<crate::function::FunctionData>>,
    pub(crate) functions: Vec<FunctionId>,
    pub(crate) global_insts: HashMap<GlobalBucket, Vec<InstId>>,
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}

impl Module {
    pub fn new() -> Self {
        let mut global_insts = HashMap::new();
        for &bucket in GLOBAL_BUCKET_ORDER {
            global_insts.insert(bucket, Vec::new());
        }
        Self {
            bound: 1,
            temp_counter: 0,
            ids: Vec::new(),
            concrete_ids: HashMap::new(),
            insts: Vec::new(),
            blocks: Vec::new(),
            functions_arena: Vec::new(),
            functions: Vec::new(),
            global_insts,
        }
    }

    /// One past the highest concrete id value used so far.
    pub fn bound(&self) -> u32 {
        self.bound
    }

    pub fn functions(&self) -> &[FunctionId] {
        &self.functions
    }

    /// Every global instruction, in canonical bucket order.
    pub fn global_instructions(&self) -> Vec<InstId> {
        GLOBAL_BUCKET_ORDER.iter().flat_map(|bucket| self.global_insts[bucket].iter().copied()).collect()
    }

    pub fn global_instructions_reversed(&self) -> Vec<InstId> {
        let mut out: Vec<InstId> =
            GLOBAL_BUCKET_ORDER.iter().rev().flat_map(|bucket| self.global_insts[bucket].iter().rev().copied()).collect();
        out.shrink_to_fit();
        out
    }

    /// Every instruction in the module: global instructions first, then
    /// each function's instructions in emission order. A shallow copy of
    /// the working lists is taken up front (spec.md §5), so destroying
    /// instructions while iterating the returned `Vec` is safe.
    pub fn instructions(&self) -> Vec<InstId> {
        let mut out = self.global_instructions();
        for &function in &self.functions.clone() {
            out.extend(self.function_instructions(function));
        }
        out
    }

    pub fn instructions_reversed(&self) -> Vec<InstId> {
        let mut out = Vec::new();
        for &function in self.functions.iter().rev() {
            out.extend(self.function_instructions_reversed(function));
        }
        out.extend(self.global_instructions_reversed());
        out
    }

    pub(crate) fn global_insert_after(&mut self, inst: InstId, pos: InstId) -> IrResult<()> {
        let Some(bucket) = global_bucket_of(self.opcode(inst)) else {
            return Err(IrError::MisplacedInstruction(format!("{} is not a global instruction", self.opcode(inst))));
        };
        let pos_bucket = global_bucket_of(self.opcode(pos))
            .ok_or_else(|| IrError::MisplacedInstruction("position instruction is not global".into()))?;
        if pos_bucket == bucket {
            let list = self.global_insts.get_mut(&bucket).expect("bucket exists");
            let idx = list.iter().position(|&i| i == pos).expect("position instruction is in this bucket");
            list.insert(idx + 1, inst);
        } else if bucket_order(bucket) > bucket_order(pos_bucket) {
            self.global_insts.get_mut(&bucket).expect("bucket exists").insert(0, inst);
        } else {
            return Err(IrError::MisplacedInstruction(format!(
                "{} cannot be inserted after {}",
                self.opcode(inst),
                self.opcode(pos)
            )));
        }
        self.inst_data_mut(inst).container = Container::Global;
        self.register_uses(inst);
        Ok(())
    }

    pub(crate) fn global_insert_before(&mut self, inst: InstId, pos: InstId) -> IrResult<()> {
        let Some(bucket) = global_bucket_of(self.opcode(inst)) else {
            return Err(IrError::MisplacedInstruction(format!("{} is not a global instruction", self.opcode(inst))));
        };
        let pos_bucket = global_bucket_of(self.opcode(pos))
            .ok_or_else(|| IrError::MisplacedInstruction("position instruction is not global".into()))?;
        if pos_bucket == bucket {
            let list = self.global_insts.get_mut(&bucket).expect("bucket exists");
            let idx = list.iter().position(|&i| i == pos).expect("position instruction is in this bucket");
            list.insert(idx, inst);
        } else if bucket_order(bucket) < bucket_order(pos_bucket) {
            self.global_insts.get_mut(&bucket).expect("bucket exists").push(inst);
        } else {
            return Err(IrError::MisplacedInstruction(format!(
                "{} cannot be inserted before {}",
                self.opcode(inst),
                self.opcode(pos)
            )));
        }
        self.inst_data_mut(inst).container = Container::Global;
        self.register_uses(inst);
        Ok(())
    }

    pub(crate) fn global_remove(&mut self, inst: InstId) {
        self.unregister_uses(inst);
        let bucket = global_bucket_of(self.opcode(inst)).expect("instruction is in a global bucket");
        self.global_insts.get_mut(&bucket).expect("bucket exists").retain(|&i| i != inst);
        self.inst_data_mut(inst).container = Container::Detached;
    }

    /// Insert a new global instruction at the end of its bucket,
    /// registering its use edges.
    pub fn insert_global_inst(&mut self, inst: InstId) -> IrResult<()> {
        let bucket = global_bucket_of(self.opcode(inst))
            .ok_or_else(|| IrError::MisplacedInstruction(format!("{} is not a global instruction", self.opcode(inst))))?;
        self.global_insts.get_mut(&bucket).expect("bucket exists").push(inst);
        self.inst_data_mut(inst).container = Container::Global;
        self.register_uses(inst);
        Ok(())
    }

    pub fn prepend_global_inst(&mut self, inst: InstId) -> IrResult<()> {
        let bucket = global_bucket_of(self.opcode(inst))
            .ok_or_else(|| IrError::MisplacedInstruction(format!("{} is not a global instruction", self.opcode(inst))))?;
        self.global_insts.get_mut(&bucket).expect("bucket exists").insert(0, inst);
        self.inst_data_mut(inst).container = Container::Global;
        self.register_uses(inst);
        Ok(())
    }

    /// Return an existing global instruction matching `(opcode, type_id,
    /// operands)` exactly, or create and append one (spec.md §3 invariant
    /// 5, "Type/constant uniqueness after interning").
    pub fn get_global_inst(&mut self, opcode: Opcode, type_id: Option<Id>, operands: Vec<Operand>) -> IrResult<InstId> {
        let bucket = global_bucket_of(opcode)
            .ok_or_else(|| IrError::MisplacedInstruction(format!("{opcode} is not a valid global instruction")))?;
        if let Some(existing) = self.global_insts[&bucket].iter().copied().find(|&inst| {
            self.opcode(inst) == opcode && self.type_id(inst) == type_id && self.operands(inst) == operands.as_slice()
        }) {
            return Ok(existing);
        }
        let inst = self.create_inst(opcode, type_id, operands, None)?;
        self.insert_global_inst(inst)?;
        Ok(inst)
    }

    /// Typed entry point for interning constants (spec.md §4.5). Integer
    /// and float scalars are packed into one or two 32-bit words and
    /// clamped to the type's range; vectors/matrices recurse per element
    /// (broadcasting a scalar); booleans use the dedicated constant
    /// opcodes.
    pub fn get_constant(&mut self, type_id: Id, value: ConstValue) -> IrResult<InstId> {
        let type_inst =
            self.defining_inst(type_id).ok_or_else(|| IrError::Invalid("constant type id is undefined".into()))?;
        match self.opcode(type_inst) {
            Opcode::OpTypeFloat => {
                let ConstValue::Float(f) = value else {
                    return Err(IrError::ConstantOutOfRange("expected a float value for OpTypeFloat".into()));
                };
                let bitwidth = self.operands(type_inst)[0].as_literal_number().expect("bitwidth literal");
                let bits = crate::instruction::float_to_bits(bitwidth, f);
                let operands = words_for(bitwidth, bits);
                self.get_global_inst(Opcode::OpConstant, Some(type_id), operands)
            }
            Opcode::OpTypeInt => {
                let bitwidth = self.operands(type_inst)[0].as_literal_number().expect("bitwidth literal");
                let raw = match value {
                    ConstValue::Int(v) => v,
                    ConstValue::Bool(b) => i128::from(b),
                    _ => return Err(IrError::ConstantOutOfRange("expected an integer value for OpTypeInt".into())),
                };
                let mask = if bitwidth >= 128 { u128::MAX } else { (1u128 << bitwidth) - 1 };
                #[allow(clippy::cast_sign_loss, reason = "two's-complement truncation to the type's bit width")]
                let clamped = (raw as u128 & mask) as u64;
                let operands = words_for(bitwidth, clamped);
                self.get_global_inst(Opcode::OpConstant, Some(type_id), operands)
            }
            Opcode::OpTypeVector | Opcode::OpTypeMatrix => {
                let elem_type =
                    self.operands(type_inst)[0].as_id().expect("vector/matrix element type must be an id");
                let count = self.operands(type_inst)[1].as_literal_number().expect("element count literal") as usize;
                let elems = match value {
                    ConstValue::Composite(v) => v,
                    scalar => std::iter::repeat(scalar).take(count).collect(),
                };
                let mut operand_ids = Vec::with_capacity(elems.len());
                for elem in elems {
                    let inst = self.get_constant(elem_type, elem)?;
                    let id = self.result_id(inst).expect("constant must have a result id");
                    operand_ids.push(Operand::Id(id));
                }
                self.get_global_inst(Opcode::OpConstantComposite, Some(type_id), operand_ids)
            }
            Opcode::OpTypeBool => {
                let ConstValue::Bool(b) = value else {
                    return Err(IrError::ConstantOutOfRange("expected a bool value for OpTypeBool".into()));
                };
                let op = if b { Opcode::OpConstantTrue } else { Opcode::OpConstantFalse };
                self.get_global_inst(op, Some(type_id), Vec::new())
            }
            _ => Err(IrError::Invalid("invalid type for constant".into())),
        }
    }

    /// Walk every instruction; every temporary result id gets a fresh
    /// concrete value (the current `bound`, then `bound` advances by
    /// one), and every use of it is rewritten in place.
    pub fn renumber_temp_ids(&mut self) {
        let temp_ids: Vec<Id> = self
            .instructions()
            .into_iter()
            .filter_map(|inst| self.result_id(inst))
            .filter(|&id| self.is_temporary(id))
            .collect();
        for old_id in temp_ids {
            let value = self.bound;
            self.bound = self.bound.checked_add(1).expect("id bound overflowed u32");
            let slot = IdSlot { value, is_temp: false, inst: self.id_slot(old_id).inst, uses: self.id_slot(old_id).uses.clone() };
            self.ids.push(Some(slot));
            let new_id = Id((self.ids.len() - 1) as u32);
            self.concrete_ids.insert(value, new_id);

            if let Some(defining) = self.id_slot(old_id).inst {
                self.inst_data_mut(defining).result_id = Some(new_id);
            }
            let users: Vec<InstId> = self.id_slot(old_id).uses.iter().copied().collect();
            for user in users {
                let data = self.inst_data_mut(user);
                if data.type_id == Some(old_id) {
                    data.type_id = Some(new_id);
                }
                for operand in &mut data.operands {
                    if *operand == Operand::Id(old_id) {
                        *operand = Operand::Id(new_id);
                    }
                }
            }
            self.ids[old_id.0 as usize] = None;
        }
    }
}

fn bucket_order(bucket: GlobalBucket) -> usize {
    GLOBAL_BUCKET_ORDER.iter().position(|&b| b == bucket).expect("bucket is in the canonical order list")
}

/// Split a (possibly 64-bit) raw value into one or two little-endian
/// 32-bit literal operand words, per spec.md §4.5.
fn words_for(bitwidth: u32, value: u64) -> Vec<Operand> {
    if bitwidth == 64 {
        #[allow(clippy::cast_possible_truncation, reason = "intentional word split")]
        vec![Operand::LiteralNumber(value as u32), Operand::LiteralNumber((value >> 32) as u32)]
    } else {
        #[allow(clippy::cast_possible_truncation, reason = "value was already masked to bitwidth")]
        vec![Operand::LiteralNumber(value as u32)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_i32_module() -> (Module, Id) {
        let mut module = Module::new();
        let operands = vec![Operand::LiteralNumber(32), Operand::LiteralNumber(1)];
        let i32_ty = module.get_global_inst(Opcode::OpTypeInt, None, operands).unwrap();
        let id = module.result_id(i32_ty).unwrap();
        (module, id)
    }

    #[coverage_helper::test]
    fn get_constant_dedupes_identical_constants() {
        let (mut module, i32_ty) = make_i32_module();
        let a = module.get_constant(i32_ty, ConstValue::Int(42)).unwrap();
        let b = module.get_constant(i32_ty, ConstValue::Int(42)).unwrap();
        assert_eq!(a, b);
    }

    #[coverage_helper::test]
    fn get_constant_distinguishes_different_values() {
        let (mut module, i32_ty) = make_i32_module();
        let a = module.get_constant(i32_ty, ConstValue::Int(1)).unwrap();
        let b = module.get_constant(i32_ty, ConstValue::Int(2)).unwrap();
        assert_ne!(a, b);
    }

    #[coverage_helper::test]
    fn renumber_temp_ids_leaves_no_temporaries() {
        let (mut module, i32_ty) = make_i32_module();
        let block = module.create_block(None).unwrap();
        let undef = module.create_inst(Opcode::OpUndef, Some(i32_ty), Vec::new(), None).unwrap();
        module.append_inst_to_block(block, undef).unwrap();
        assert!(module.is_temporary(module.result_id(undef).unwrap()));
        assert!(module.is_temporary(module.result_id(module.label_inst(block)).unwrap()));

        module.renumber_temp_ids();

        assert!(!module.is_temporary(module.result_id(undef).unwrap()));
        assert!(!module.is_temporary(module.result_id(module.label_inst(block)).unwrap()));
        for inst in module.instructions() {
            if let Some(id) = module.result_id(inst) {
                assert!(!module.is_temporary(id));
            }
        }
    }

    #[coverage_helper::test]
    fn global_bucket_order_matches_spec() {
        assert_eq!(bucket_order(GlobalBucket::Initial), 0);
        assert_eq!(bucket_order(GlobalBucket::Types), 4);
    }
}
