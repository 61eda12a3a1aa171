//! Static opcode metadata: for each opcode, whether it has a type-id and/or
//! a result-id, and the ordered list of operand kinds.
//!
//! This mirrors the `INST_FORMAT` table in the reference implementation:
//! a pure function of the opcode name, loaded once and never mutated.

use std::fmt;

/// The vocabulary an opcode's operand list is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    Id,
    OptionalId,
    LiteralNumber,
    OptionalLiteralNumber,
    LiteralString,
    OptionalLiteralString,
    /// A trailing run of ids, each a separate operand.
    VariableId,
    /// A trailing run of literal numbers.
    VariableLiteralNumber,
    /// A trailing run of `(id, literal)` pairs, flattened.
    VariableIdLiteralPair,
    /// A trailing run of `(literal, id)` pairs, flattened.
    VariableLiteralIdPair,
    /// A named enumeration, e.g. `StorageClass`, `ExecutionModel`.
    Enum(&'static str),
    /// A named bitmask, e.g. `FunctionControl`, `MemoryAccess`.
    Mask(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct OpcodeInfo {
    pub has_type: bool,
    pub has_result: bool,
    pub operands: &'static [OperandKind],
}

macro_rules! opcodes {
    ($( $variant:ident ( $number:expr ) => { type: $has_type:expr, result: $has_result:expr, operands: [$($kind:expr),* $(,)?] } ),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[allow(non_camel_case_types)]
        pub enum Opcode {
            $($variant),*
        }

        impl Opcode {
            pub fn name(self) -> &'static str {
                match self {
                    $(Opcode::$variant => stringify!($variant)),*
                }
            }

            pub fn number(self) -> u32 {
                match self {
                    $(Opcode::$variant => $number),*
                }
            }

            pub fn from_name(name: &str) -> Option<Opcode> {
                match name {
                    $(stringify!($variant) => Some(Opcode::$variant),)*
                    _ => None,
                }
            }

            pub fn from_number(number: u32) -> Option<Opcode> {
                match number {
                    $($number => Some(Opcode::$variant),)*
                    _ => None,
                }
            }

            pub fn info(self) -> OpcodeInfo {
                match self {
                    $(Opcode::$variant => OpcodeInfo {
                        has_type: $has_type,
                        has_result: $has_result,
                        operands: &[$($kind),*],
                    }),*
                }
            }
        }
    };
}

use OperandKind::*;

opcodes! {
    OpNop(0) => { type: false, result: false, operands: [] },
    OpUndef(1) => { type: true, result: true, operands: [] },
    OpSourceContinued(2) => { type: false, result: false, operands: [LiteralString] },
    OpSource(3) => { type: false, result: false, operands: [Enum("SourceLanguage"), LiteralNumber, OptionalId, OptionalLiteralString] },
    OpSourceExtension(4) => { type: false, result: false, operands: [LiteralString] },
    OpName(5) => { type: false, result: false, operands: [Id, LiteralString] },
    OpMemberName(6) => { type: false, result: false, operands: [Id, LiteralNumber, LiteralString] },
    OpString(7) => { type: false, result: true, operands: [LiteralString] },
    OpLine(8) => { type: false, result: false, operands: [Id, LiteralNumber, LiteralNumber] },
    OpExtension(10) => { type: false, result: false, operands: [LiteralString] },
    OpExtInstImport(11) => { type: false, result: true, operands: [LiteralString] },
    OpExtInst(12) => { type: true, result: true, operands: [Id, LiteralNumber, VariableId] },
    OpMemoryModel(14) => { type: false, result: false, operands: [Enum("AddressingModel"), Enum("MemoryModel")] },
    OpEntryPoint(15) => { type: false, result: false, operands: [Enum("ExecutionModel"), Id, LiteralString, VariableId] },
    OpExecutionMode(16) => { type: false, result: false, operands: [Id, Enum("ExecutionMode"), VariableLiteralNumber] },
    OpCapability(17) => { type: false, result: false, operands: [Enum("Capability")] },
    OpTypeVoid(19) => { type: false, result: true, operands: [] },
    OpTypeBool(20) => { type: false, result: true, operands: [] },
    OpTypeInt(21) => { type: false, result: true, operands: [LiteralNumber, LiteralNumber] },
    OpTypeFloat(22) => { type: false, result: true, operands: [LiteralNumber] },
    OpTypeVector(23) => { type: false, result: true, operands: [Id, LiteralNumber] },
    OpTypeMatrix(24) => { type: false, result: true, operands: [Id, LiteralNumber] },
    OpTypeImage(25) => { type: false, result: true, operands: [Id, Enum("Dim"), LiteralNumber, LiteralNumber, LiteralNumber, LiteralNumber, Enum("ImageFormat"), OptionalLiteralNumber] },
    OpTypeSampler(26) => { type: false, result: true, operands: [] },
    OpTypeSampledImage(27) => { type: false, result: true, operands: [Id] },
    OpTypeArray(28) => { type: false, result: true, operands: [Id, Id] },
    OpTypeRuntimeArray(29) => { type: false, result: true, operands: [Id] },
    OpTypeStruct(30) => { type: false, result: true, operands: [VariableId] },
    OpTypeOpaque(31) => { type: false, result: true, operands: [LiteralString] },
    OpTypePointer(32) => { type: false, result: true, operands: [Enum("StorageClass"), Id] },
    OpTypeFunction(33) => { type: false, result: true, operands: [Id, VariableId] },
    OpTypeEvent(34) => { type: false, result: true, operands: [] },
    OpTypeDeviceEvent(35) => { type: false, result: true, operands: [] },
    OpTypeReserveId(36) => { type: false, result: true, operands: [] },
    OpTypeQueue(37) => { type: false, result: true, operands: [] },
    OpTypePipe(38) => { type: false, result: true, operands: [Enum("AccessQualifier")] },
    OpConstantTrue(41) => { type: true, result: true, operands: [] },
    OpConstantFalse(42) => { type: true, result: true, operands: [] },
    OpConstant(43) => { type: true, result: true, operands: [VariableLiteralNumber] },
    OpConstantComposite(44) => { type: true, result: true, operands: [VariableId] },
    OpConstantSampler(45) => { type: true, result: true, operands: [Enum("SamplerAddressingMode"), LiteralNumber, Enum("SamplerFilterMode")] },
    OpConstantNull(46) => { type: true, result: true, operands: [] },
    OpSpecConstantTrue(48) => { type: true, result: true, operands: [] },
    OpSpecConstantFalse(49) => { type: true, result: true, operands: [] },
    OpSpecConstant(50) => { type: true, result: true, operands: [VariableLiteralNumber] },
    OpSpecConstantComposite(51) => { type: true, result: true, operands: [VariableId] },
    OpSpecConstantOp(52) => { type: true, result: true, operands: [LiteralNumber, VariableId] },
    OpFunction(54) => { type: true, result: true, operands: [Mask("FunctionControl"), Id] },
    OpFunctionParameter(55) => { type: true, result: true, operands: [] },
    OpFunctionEnd(56) => { type: false, result: false, operands: [] },
    OpFunctionCall(57) => { type: true, result: true, operands: [Id, VariableId] },
    OpVariable(59) => { type: true, result: true, operands: [Enum("StorageClass"), OptionalId] },
    OpImageTexelPointer(60) => { type: true, result: true, operands: [Id, Id, Id] },
    OpLoad(61) => { type: true, result: true, operands: [Id, Mask("MemoryAccess")] },
    OpStore(62) => { type: false, result: false, operands: [Id, Id, Mask("MemoryAccess")] },
    OpCopyMemory(63) => { type: false, result: false, operands: [Id, Id, Mask("MemoryAccess")] },
    OpCopyMemorySized(64) => { type: false, result: false, operands: [Id, Id, Id, Mask("MemoryAccess")] },
    OpAccessChain(65) => { type: true, result: true, operands: [Id, VariableId] },
    OpInBoundsAccessChain(66) => { type: true, result: true, operands: [Id, VariableId] },
    OpPtrAccessChain(67) => { type: true, result: true, operands: [Id, Id, VariableId] },
    OpArrayLength(68) => { type: true, result: true, operands: [Id, LiteralNumber] },
    OpDecorate(71) => { type: false, result: false, operands: [Id, Enum("Decoration"), VariableLiteralNumber] },
    OpMemberDecorate(72) => { type: false, result: false, operands: [Id, LiteralNumber, Enum("Decoration"), VariableLiteralNumber] },
    OpDecorationGroup(73) => { type: false, result: true, operands: [] },
    OpGroupDecorate(74) => { type: false, result: false, operands: [Id, VariableId] },
    OpGroupMemberDecorate(75) => { type: false, result: false, operands: [Id, VariableIdLiteralPair] },
    OpVectorExtractDynamic(77) => { type: true, result: true, operands: [Id, Id] },
    OpVectorInsertDynamic(78) => { type: true, result: true, operands: [Id, Id, Id] },
    OpVectorShuffle(79) => { type: true, result: true, operands: [Id, Id, VariableLiteralNumber] },
    OpCompositeConstruct(80) => { type: true, result: true, operands: [VariableId] },
    OpCompositeExtract(81) => { type: true, result: true, operands: [Id, VariableLiteralNumber] },
    OpCompositeInsert(82) => { type: true, result: true, operands: [Id, Id, VariableLiteralNumber] },
    OpCopyObject(83) => { type: true, result: true, operands: [Id] },
    OpTranspose(84) => { type: true, result: true, operands: [Id] },
    OpSampledImage(86) => { type: true, result: true, operands: [Id, Id] },
    OpConvertFToU(109) => { type: true, result: true, operands: [Id] },
    OpConvertFToS(110) => { type: true, result: true, operands: [Id] },
    OpConvertSToF(111) => { type: true, result: true, operands: [Id] },
    OpConvertUToF(112) => { type: true, result: true, operands: [Id] },
    OpUConvert(113) => { type: true, result: true, operands: [Id] },
    OpSConvert(114) => { type: true, result: true, operands: [Id] },
    OpFConvert(115) => { type: true, result: true, operands: [Id] },
    OpQuantizeToF16(116) => { type: true, result: true, operands: [Id] },
    OpBitcast(124) => { type: true, result: true, operands: [Id] },
    OpSNegate(126) => { type: true, result: true, operands: [Id] },
    OpFNegate(127) => { type: true, result: true, operands: [Id] },
    OpIAdd(128) => { type: true, result: true, operands: [Id, Id] },
    OpFAdd(129) => { type: true, result: true, operands: [Id, Id] },
    OpISub(130) => { type: true, result: true, operands: [Id, Id] },
    OpFSub(131) => { type: true, result: true, operands: [Id, Id] },
    OpIMul(132) => { type: true, result: true, operands: [Id, Id] },
    OpFMul(133) => { type: true, result: true, operands: [Id, Id] },
    OpUDiv(134) => { type: true, result: true, operands: [Id, Id] },
    OpSDiv(135) => { type: true, result: true, operands: [Id, Id] },
    OpFDiv(136) => { type: true, result: true, operands: [Id, Id] },
    OpUMod(137) => { type: true, result: true, operands: [Id, Id] },
    OpSRem(138) => { type: true, result: true, operands: [Id, Id] },
    OpSMod(139) => { type: true, result: true, operands: [Id, Id] },
    OpFRem(140) => { type: true, result: true, operands: [Id, Id] },
    OpFMod(141) => { type: true, result: true, operands: [Id, Id] },
    OpVectorTimesScalar(142) => { type: true, result: true, operands: [Id, Id] },
    OpMatrixTimesScalar(143) => { type: true, result: true, operands: [Id, Id] },
    OpVectorTimesMatrix(144) => { type: true, result: true, operands: [Id, Id] },
    OpMatrixTimesVector(145) => { type: true, result: true, operands: [Id, Id] },
    OpMatrixTimesMatrix(146) => { type: true, result: true, operands: [Id, Id] },
    OpOuterProduct(147) => { type: true, result: true, operands: [Id, Id] },
    OpDot(148) => { type: true, result: true, operands: [Id, Id] },
    OpShiftRightLogical(194) => { type: true, result: true, operands: [Id, Id] },
    OpShiftRightArithmetic(195) => { type: true, result: true, operands: [Id, Id] },
    OpShiftLeftLogical(196) => { type: true, result: true, operands: [Id, Id] },
    OpBitwiseOr(197) => { type: true, result: true, operands: [Id, Id] },
    OpBitwiseXor(198) => { type: true, result: true, operands: [Id, Id] },
    OpBitwiseAnd(199) => { type: true, result: true, operands: [Id, Id] },
    OpNot(200) => { type: true, result: true, operands: [Id] },
    OpBitFieldInsert(201) => { type: true, result: true, operands: [Id, Id, Id, Id] },
    OpBitFieldSExtract(202) => { type: true, result: true, operands: [Id, Id, Id] },
    OpBitFieldUExtract(203) => { type: true, result: true, operands: [Id, Id, Id] },
    OpBitReverse(204) => { type: true, result: true, operands: [Id] },
    OpBitCount(205) => { type: true, result: true, operands: [Id] },
    OpAny(154) => { type: true, result: true, operands: [Id] },
    OpAll(155) => { type: true, result: true, operands: [Id] },
    OpIsNan(156) => { type: true, result: true, operands: [Id] },
    OpIsInf(157) => { type: true, result: true, operands: [Id] },
    OpLogicalEqual(164) => { type: true, result: true, operands: [Id, Id] },
    OpLogicalNotEqual(165) => { type: true, result: true, operands: [Id, Id] },
    OpLogicalOr(166) => { type: true, result: true, operands: [Id, Id] },
    OpLogicalAnd(167) => { type: true, result: true, operands: [Id, Id] },
    OpLogicalNot(168) => { type: true, result: true, operands: [Id] },
    OpSelect(169) => { type: true, result: true, operands: [Id, Id, Id] },
    OpIEqual(170) => { type: true, result: true, operands: [Id, Id] },
    OpINotEqual(171) => { type: true, result: true, operands: [Id, Id] },
    OpUGreaterThan(172) => { type: true, result: true, operands: [Id, Id] },
    OpSGreaterThan(173) => { type: true, result: true, operands: [Id, Id] },
    OpUGreaterThanEqual(174) => { type: true, result: true, operands: [Id, Id] },
    OpSGreaterThanEqual(175) => { type: true, result: true, operands: [Id, Id] },
    OpULessThan(176) => { type: true, result: true, operands: [Id, Id] },
    OpSLessThan(177) => { type: true, result: true, operands: [Id, Id] },
    OpULessThanEqual(178) => { type: true, result: true, operands: [Id, Id] },
    OpSLessThanEqual(179) => { type: true, result: true, operands: [Id, Id] },
    OpFOrdEqual(180) => { type: true, result: true, operands: [Id, Id] },
    OpFUnordEqual(181) => { type: true, result: true, operands: [Id, Id] },
    OpFOrdNotEqual(182) => { type: true, result: true, operands: [Id, Id] },
    OpFUnordNotEqual(183) => { type: true, result: true, operands: [Id, Id] },
    OpFOrdLessThan(184) => { type: true, result: true, operands: [Id, Id] },
    OpFUnordLessThan(185) => { type: true, result: true, operands: [Id, Id] },
    OpFOrdGreaterThan(186) => { type: true, result: true, operands: [Id, Id] },
    OpFUnordGreaterThan(187) => { type: true, result: true, operands: [Id, Id] },
    OpFOrdLessThanEqual(188) => { type: true, result: true, operands: [Id, Id] },
    OpFUnordLessThanEqual(189) => { type: true, result: true, operands: [Id, Id] },
    OpFOrdGreaterThanEqual(190) => { type: true, result: true, operands: [Id, Id] },
    OpFUnordGreaterThanEqual(191) => { type: true, result: true, operands: [Id, Id] },
    OpPhi(245) => { type: true, result: true, operands: [VariableIdLiteralPair] },
    OpLoopMerge(246) => { type: false, result: false, operands: [Id, Id, Mask("LoopControl")] },
    OpSelectionMerge(247) => { type: false, result: false, operands: [Id, Mask("SelectionControl")] },
    OpLabel(248) => { type: false, result: true, operands: [] },
    OpBranch(249) => { type: false, result: false, operands: [Id] },
    OpBranchConditional(250) => { type: false, result: false, operands: [Id, Id, Id, VariableLiteralNumber] },
    OpSwitch(251) => { type: false, result: false, operands: [Id, Id, VariableLiteralIdPair] },
    OpKill(252) => { type: false, result: false, operands: [] },
    OpReturn(253) => { type: false, result: false, operands: [] },
    OpReturnValue(254) => { type: false, result: false, operands: [Id] },
    OpUnreachable(255) => { type: false, result: false, operands: [] },
    OpLifetimeStart(256) => { type: false, result: false, operands: [Id, LiteralNumber] },
    OpLifetimeStop(257) => { type: false, result: false, operands: [Id, LiteralNumber] },
    OpAtomicLoad(227) => { type: true, result: true, operands: [Id, Id, Mask("MemorySemantics")] },
    OpAtomicStore(228) => { type: false, result: false, operands: [Id, Id, Mask("MemorySemantics"), Id] },
    OpAtomicExchange(229) => { type: true, result: true, operands: [Id, Id, Mask("MemorySemantics"), Id] },
    OpAtomicCompareExchange(230) => { type: true, result: true, operands: [Id, Id, Mask("MemorySemantics"), Mask("MemorySemantics"), Id, Id] },
    OpAtomicCompareExchangeWeak(231) => { type: true, result: true, operands: [Id, Id, Mask("MemorySemantics"), Mask("MemorySemantics"), Id, Id] },
    OpAtomicIIncrement(232) => { type: true, result: true, operands: [Id, Id, Mask("MemorySemantics")] },
    OpAtomicIDecrement(233) => { type: true, result: true, operands: [Id, Id, Mask("MemorySemantics")] },
    OpAtomicIAdd(234) => { type: true, result: true, operands: [Id, Id, Mask("MemorySemantics"), Id] },
    OpAtomicISub(235) => { type: true, result: true, operands: [Id, Id, Mask("MemorySemantics"), Id] },
    OpAtomicSMin(236) => { type: true, result: true, operands: [Id, Id, Mask("MemorySemantics"), Id] },
    OpAtomicUMin(237) => { type: true, result: true, operands: [Id, Id, Mask("MemorySemantics"), Id] },
    OpAtomicSMax(238) => { type: true, result: true, operands: [Id, Id, Mask("MemorySemantics"), Id] },
    OpAtomicUMax(239) => { type: true, result: true, operands: [Id, Id, Mask("MemorySemantics"), Id] },
    OpAtomicAnd(240) => { type: true, result: true, operands: [Id, Id, Mask("MemorySemantics"), Id] },
    OpAtomicOr(241) => { type: true, result: true, operands: [Id, Id, Mask("MemorySemantics"), Id] },
    OpAtomicXor(242) => { type: true, result: true, operands: [Id, Id, Mask("MemorySemantics"), Id] },
    OpAsyncGroupCopy(259) => { type: true, result: true, operands: [Enum("Scope"), Id, Id, Id, Id, Id] },
    OpWaitGroupEvents(260) => { type: true, result: true, operands: [Enum("Scope"), Id, Id] },
    OpGroupAll(261) => { type: true, result: true, operands: [Enum("Scope"), Id] },
    OpGroupAny(262) => { type: true, result: true, operands: [Enum("Scope"), Id] },
    OpGroupBroadcast(263) => { type: true, result: true, operands: [Enum("Scope"), Id, Id] },
    OpGroupIAdd(264) => { type: true, result: true, operands: [Enum("Scope"), Enum("GroupOperation"), Id] },
    OpGroupFAdd(265) => { type: true, result: true, operands: [Enum("Scope"), Enum("GroupOperation"), Id] },
    OpGroupFMin(266) => { type: true, result: true, operands: [Enum("Scope"), Enum("GroupOperation"), Id] },
    OpGroupUMin(267) => { type: true, result: true, operands: [Enum("Scope"), Enum("GroupOperation"), Id] },
    OpGroupSMin(268) => { type: true, result: true, operands: [Enum("Scope"), Enum("GroupOperation"), Id] },
    OpGroupFMax(269) => { type: true, result: true, operands: [Enum("Scope"), Enum("GroupOperation"), Id] },
    OpGroupUMax(270) => { type: true, result: true, operands: [Enum("Scope"), Enum("GroupOperation"), Id] },
    OpGroupSMax(271) => { type: true, result: true, operands: [Enum("Scope"), Enum("GroupOperation"), Id] },
    OpReadPipe(274) => { type: true, result: true, operands: [Id, Id, Id, Id] },
    OpWritePipe(275) => { type: true, result: true, operands: [Id, Id, Id, Id] },
    OpReservedReadPipe(276) => { type: true, result: true, operands: [Id, Id, Id, Id, Id, Id] },
    OpReservedWritePipe(277) => { type: true, result: true, operands: [Id, Id, Id, Id, Id, Id] },
    OpReserveReadPipePackets(278) => { type: true, result: true, operands: [Id, Id, Id, Id] },
    OpReserveWritePipePackets(279) => { type: true, result: true, operands: [Id, Id, Id, Id] },
    OpGroupReserveWritePipePackets(282) => { type: true, result: true, operands: [Enum("Scope"), Id, Id, Id, Id] },
    OpEnqueueMarker(291) => { type: true, result: true, operands: [Id, Id, Id, Id] },
    OpEnqueueKernel(292) => { type: true, result: true, operands: [Id, Id, Id, Id, Id, Id, Id, Id, VariableId] },
    OpCreateUserEvent(295) => { type: true, result: true, operands: [] },
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Instructions that terminate a basic block.
pub const BRANCH_INSTRUCTIONS: &[Opcode] = &[
    Opcode::OpReturnValue,
    Opcode::OpBranch,
    Opcode::OpBranchConditional,
    Opcode::OpReturn,
    Opcode::OpKill,
    Opcode::OpUnreachable,
    Opcode::OpSwitch,
];

/// Instructions that appear before debug/annotation instructions in the
/// binary layout.
pub const INITIAL_INSTRUCTIONS: &[Opcode] = &[
    Opcode::OpCapability,
    Opcode::OpExtension,
    Opcode::OpExtInstImport,
    Opcode::OpMemoryModel,
    Opcode::OpEntryPoint,
    Opcode::OpExecutionMode,
];

pub const DEBUG_INSTRUCTIONS: &[Opcode] = &[
    Opcode::OpString,
    Opcode::OpSourceExtension,
    Opcode::OpSource,
    Opcode::OpSourceContinued,
    Opcode::OpName,
    Opcode::OpMemberName,
];

pub const DECORATION_INSTRUCTIONS: &[Opcode] = &[
    Opcode::OpDecorate,
    Opcode::OpMemberDecorate,
    Opcode::OpGroupDecorate,
    Opcode::OpGroupMemberDecorate,
    Opcode::OpDecorationGroup,
];

pub const TYPE_DECLARATION_INSTRUCTIONS: &[Opcode] = &[
    Opcode::OpTypeVoid,
    Opcode::OpTypeBool,
    Opcode::OpTypeInt,
    Opcode::OpTypeFloat,
    Opcode::OpTypeVector,
    Opcode::OpTypeMatrix,
    Opcode::OpTypeImage,
    Opcode::OpTypeSampler,
    Opcode::OpTypeSampledImage,
    Opcode::OpTypeArray,
    Opcode::OpTypeRuntimeArray,
    Opcode::OpTypeStruct,
    Opcode::OpTypeOpaque,
    Opcode::OpTypePointer,
    Opcode::OpTypeFunction,
    Opcode::OpTypeEvent,
    Opcode::OpTypeDeviceEvent,
    Opcode::OpTypeReserveId,
    Opcode::OpTypeQueue,
    Opcode::OpTypePipe,
];

pub const CONSTANT_INSTRUCTIONS: &[Opcode] = &[
    Opcode::OpConstantTrue,
    Opcode::OpConstantFalse,
    Opcode::OpConstant,
    Opcode::OpConstantComposite,
    Opcode::OpConstantSampler,
    Opcode::OpConstantNull,
];

pub const SPECCONSTANT_INSTRUCTIONS: &[Opcode] = &[
    Opcode::OpSpecConstantTrue,
    Opcode::OpSpecConstantFalse,
    Opcode::OpSpecConstant,
    Opcode::OpSpecConstantComposite,
    Opcode::OpSpecConstantOp,
];

pub const GLOBAL_VARIABLE_INSTRUCTIONS: &[Opcode] = &[Opcode::OpVariable];

pub(crate) const HAS_SIDE_EFFECT: &[Opcode] = &[
    Opcode::OpFunction,
    Opcode::OpFunctionParameter,
    Opcode::OpFunctionCall,
    Opcode::OpExtInst,
    Opcode::OpAtomicExchange,
    Opcode::OpAtomicCompareExchange,
    Opcode::OpAtomicCompareExchangeWeak,
    Opcode::OpAtomicIIncrement,
    Opcode::OpAtomicIDecrement,
    Opcode::OpAtomicIAdd,
    Opcode::OpAtomicISub,
    Opcode::OpAtomicSMin,
    Opcode::OpAtomicUMin,
    Opcode::OpAtomicSMax,
    Opcode::OpAtomicUMax,
    Opcode::OpAtomicAnd,
    Opcode::OpAtomicOr,
    Opcode::OpAtomicXor,
    Opcode::OpLabel,
    Opcode::OpAsyncGroupCopy,
    Opcode::OpWaitGroupEvents,
    Opcode::OpGroupAll,
    Opcode::OpGroupAny,
    Opcode::OpGroupBroadcast,
    Opcode::OpGroupIAdd,
    Opcode::OpGroupFAdd,
    Opcode::OpGroupFMin,
    Opcode::OpGroupUMin,
    Opcode::OpGroupSMin,
    Opcode::OpGroupFMax,
    Opcode::OpGroupUMax,
    Opcode::OpGroupSMax,
    Opcode::OpReadPipe,
    Opcode::OpWritePipe,
    Opcode::OpReservedReadPipe,
    Opcode::OpReservedWritePipe,
    Opcode::OpReserveReadPipePackets,
    Opcode::OpReserveWritePipePackets,
    Opcode::OpGroupReserveWritePipePackets,
    Opcode::OpEnqueueMarker,
    Opcode::OpEnqueueKernel,
    Opcode::OpCreateUserEvent,
];

pub(crate) const IS_COMMUTATIVE: &[Opcode] = &[
    Opcode::OpLogicalAnd,
    Opcode::OpFAdd,
    Opcode::OpIMul,
    Opcode::OpBitwiseOr,
    Opcode::OpFMul,
    Opcode::OpBitwiseAnd,
    Opcode::OpLogicalOr,
    Opcode::OpBitwiseXor,
    Opcode::OpIAdd,
    Opcode::OpLogicalEqual,
    Opcode::OpLogicalNotEqual,
];

/// Metadata for one instruction number in an extended instruction set
/// (e.g. `GLSL.std.450`, `OpenCL.std`).
#[derive(Debug, Clone, Copy)]
pub struct ExtInstInfo {
    pub name: &'static str,
    pub has_side_effects: bool,
    pub is_commutative: bool,
}

/// Extended instruction set metadata, keyed by `(set name, instruction
/// number)`. Only the entries this repository's passes actually consult
/// (side-effect and commutativity flags) are populated; a full operand-kind
/// table per extended instruction would mirror this shape but is not
/// needed by any pass here.
pub fn ext_inst_info(set_name: &str, number: u32) -> Option<ExtInstInfo> {
    match (set_name, number) {
        ("GLSL.std.450", 26) => Some(ExtInstInfo { name: "FMin", has_side_effects: false, is_commutative: true }),
        ("GLSL.std.450", 40) => Some(ExtInstInfo { name: "FMax", has_side_effects: false, is_commutative: true }),
        ("GLSL.std.450", 37) => Some(ExtInstInfo { name: "FAbs", has_side_effects: false, is_commutative: false }),
        ("GLSL.std.450", 66) => Some(ExtInstInfo { name: "Sqrt", has_side_effects: false, is_commutative: false }),
        ("GLSL.std.450", 69) => Some(ExtInstInfo { name: "NClamp", has_side_effects: false, is_commutative: false }),
        ("OpenCL.std", 160) => Some(ExtInstInfo { name: "fmin", has_side_effects: false, is_commutative: true }),
        ("OpenCL.std", 165) => Some(ExtInstInfo { name: "fmax", has_side_effects: false, is_commutative: true }),
        _ => None,
    }
}

/// True if `op_name` is a global instruction regardless of where it is
/// currently attached (the function-local exception for `OpVariable` in
/// the `Function` storage class is handled by the caller, which has
/// access to the operand list).
pub fn is_global_opcode(op: Opcode) -> bool {
    INITIAL_INSTRUCTIONS.contains(&op)
        || DEBUG_INSTRUCTIONS.contains(&op)
        || DECORATION_INSTRUCTIONS.contains(&op)
        || TYPE_DECLARATION_INSTRUCTIONS.contains(&op)
        || CONSTANT_INSTRUCTIONS.contains(&op)
        || SPECCONSTANT_INSTRUCTIONS.contains(&op)
        || GLOBAL_VARIABLE_INSTRUCTIONS.contains(&op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    #[coverage_helper::test]
    fn every_opcode_name_round_trips_through_its_number() {
        let names = [
            Opcode::OpNop,
            Opcode::OpIAdd,
            Opcode::OpFunction,
            Opcode::OpLabel,
            Opcode::OpPhi,
            Opcode::OpBranchConditional,
        ];
        for op in names {
            assert_eq!(Opcode::from_name(op.name()), Some(op));
            assert_eq!(Opcode::from_number(op.number()), Some(op));
        }
    }

    #[coverage_helper::test]
    fn branch_instructions_all_have_no_result() {
        for op in BRANCH_INSTRUCTIONS.iter().copied().unique_by(Opcode::number) {
            assert!(!op.info().has_result, "{op} should not produce a result");
        }
    }

    #[coverage_helper::test]
    fn op_variable_is_a_global_instruction_by_name_alone() {
        // The Function-storage-class exception lives in `Instruction::is_global`,
        // which also looks at the operand list; the opcode-level predicate only
        // answers "could this ever be global".
        assert!(is_global_opcode(Opcode::OpVariable));
        assert!(!is_global_opcode(Opcode::OpLoad));
    }
}
