//! Name <-> numeric value tables for the `Enum`/`Mask` operand kinds
//! [`spirv_ir::opcode`] only stores by name.
//!
//! `spirv-ir` treats an instruction's enumerant and mask operands as plain
//! strings (or lists of strings, for masks); it has no reason to know their
//! wire-format values, since it never serializes anything itself. Encoding
//! and decoding those values is entirely this crate's job, so the tables
//! live here rather than in `spirv-ir`.
//!
//! Only the enumerant kinds actually reachable through
//! [`spirv_ir::Opcode::info`]'s operand lists are populated.

macro_rules! enum_table {
    ($name:ident => { $($variant:literal = $value:expr),* $(,)? }) => {
        fn $name(name: &str) -> Option<u32> {
            match name {
                $($variant => Some($value),)*
                _ => None,
            }
        }
    };
}

enum_table!(source_language => {
    "Unknown" = 0, "ESSL" = 1, "GLSL" = 2, "OpenCL_C" = 3, "OpenCL_CPP" = 4, "HLSL" = 5,
});

enum_table!(addressing_model => {
    "Logical" = 0, "Physical32" = 1, "Physical64" = 2, "PhysicalStorageBuffer64" = 5348,
});

enum_table!(memory_model => {
    "Simple" = 0, "GLSL450" = 1, "OpenCL" = 2, "Vulkan" = 3,
});

enum_table!(execution_model => {
    "Vertex" = 0, "TessellationControl" = 1, "TessellationEvaluation" = 2, "Geometry" = 3,
    "Fragment" = 4, "GLCompute" = 5, "Kernel" = 6,
});

enum_table!(execution_mode => {
    "Invocations" = 0, "SpacingEqual" = 1, "SpacingFractionalEven" = 2, "SpacingFractionalOdd" = 3,
    "VertexOrderCw" = 4, "VertexOrderCcw" = 5, "PixelCenterInteger" = 6, "OriginUpperLeft" = 7,
    "OriginLowerLeft" = 8, "EarlyFragmentTests" = 9, "PointMode" = 10, "Xfb" = 11,
    "DepthReplacing" = 12, "DepthGreater" = 14, "DepthLess" = 15, "DepthUnchanged" = 16,
    "LocalSize" = 17, "LocalSizeHint" = 18, "InputPoints" = 19, "InputLines" = 20,
    "InputLinesAdjacency" = 21, "Triangles" = 22, "InputTrianglesAdjacency" = 23, "Quads" = 24,
    "Isolines" = 25, "OutputVertices" = 26, "OutputPoints" = 27, "OutputLineStrip" = 28,
    "OutputTriangleStrip" = 29, "VecTypeHint" = 30, "ContractionOff" = 31, "Initializer" = 33,
    "Finalizer" = 34, "SubgroupSize" = 35, "SubgroupsPerWorkgroup" = 36,
});

enum_table!(capability => {
    "Matrix" = 0, "Shader" = 1, "Geometry" = 2, "Tessellation" = 3, "Addresses" = 4,
    "Linkage" = 5, "Kernel" = 6, "Vector16" = 7, "Float16Buffer" = 8, "Float16" = 9,
    "Float64" = 10, "Int64" = 11, "Int64Atomics" = 12, "ImageBasic" = 13, "ImageReadWrite" = 14,
    "ImageMipmap" = 15, "Pipes" = 17, "Groups" = 18, "DeviceEnqueue" = 19, "LiteralSampler" = 20,
    "AtomicStorage" = 21, "Int16" = 22, "TessellationPointSize" = 23, "GeometryPointSize" = 24,
    "ImageGatherExtended" = 25, "StorageImageMultisample" = 27,
    "UniformBufferArrayDynamicIndexing" = 28, "SampledImageArrayDynamicIndexing" = 29,
    "StorageBufferArrayDynamicIndexing" = 30, "StorageImageArrayDynamicIndexing" = 31,
    "ClipDistance" = 32, "CullDistance" = 33, "ImageCubeArray" = 34, "SampleRateShading" = 35,
    "ImageRect" = 36, "SampledRect" = 37, "GenericPointer" = 38, "Int8" = 39,
    "InputAttachment" = 40, "SparseResidency" = 41, "MinLod" = 42, "Sampled1D" = 43,
    "Image1D" = 44, "SampledCubeArray" = 45, "SampledBuffer" = 46, "ImageBuffer" = 47,
    "ImageMSArray" = 48, "StorageImageExtendedFormats" = 49, "ImageQuery" = 50,
    "DerivativeControl" = 51, "InterpolationFunction" = 52, "TransformFeedback" = 53,
    "GeometryStreams" = 54, "StorageImageReadWithoutFormat" = 55,
    "StorageImageWriteWithoutFormat" = 56, "MultiViewport" = 57,
});

enum_table!(storage_class => {
    "UniformConstant" = 0, "Input" = 1, "Uniform" = 2, "Output" = 3, "Workgroup" = 4,
    "CrossWorkgroup" = 5, "Private" = 6, "Function" = 7, "Generic" = 8, "PushConstant" = 9,
    "AtomicCounter" = 10, "Image" = 11, "StorageBuffer" = 12,
});

enum_table!(dim => {
    "Dim1D" = 0, "Dim2D" = 1, "Dim3D" = 2, "Cube" = 3, "Rect" = 4, "Buffer" = 5, "SubpassData" = 6,
});

enum_table!(image_format => {
    "Unknown" = 0, "Rgba32f" = 1, "Rgba16f" = 2, "R32f" = 3, "Rgba8" = 4, "Rgba8Snorm" = 5,
    "Rg32f" = 6, "Rg16f" = 7, "R11fG11fB10f" = 8, "R16f" = 9, "Rgba16" = 10, "Rgb10A2" = 11,
    "Rg16" = 12, "Rg8" = 13, "R16" = 14, "R8" = 15, "Rgba16Snorm" = 16, "Rg16Snorm" = 17,
    "Rg8Snorm" = 18, "R16Snorm" = 19, "R8Snorm" = 20, "Rgba32i" = 21, "Rgba16i" = 22,
    "Rgba8i" = 23, "R32i" = 24, "Rg32i" = 25, "Rg16i" = 26, "Rg8i" = 27, "R16i" = 28, "R8i" = 29,
    "Rgba32ui" = 30, "Rgba16ui" = 31, "Rgba8ui" = 32, "R32ui" = 33, "Rgb10a2ui" = 34,
    "Rg32ui" = 35, "Rg16ui" = 36, "Rg8ui" = 37, "R16ui" = 38, "R8ui" = 39,
});

enum_table!(sampler_addressing_mode => {
    "None" = 0, "ClampToEdge" = 1, "Clamp" = 2, "Repeat" = 3, "RepeatMirrored" = 4,
});

enum_table!(sampler_filter_mode => {
    "Nearest" = 0, "Linear" = 1,
});

enum_table!(access_qualifier => {
    "ReadOnly" = 0, "WriteOnly" = 1, "ReadWrite" = 2,
});

enum_table!(decoration => {
    "RelaxedPrecision" = 0, "SpecId" = 1, "Block" = 2, "BufferBlock" = 3, "RowMajor" = 4,
    "ColMajor" = 5, "ArrayStride" = 6, "MatrixStride" = 7, "GLSLShared" = 8, "GLSLPacked" = 9,
    "CPacked" = 10, "BuiltIn" = 11, "NoPerspective" = 13, "Flat" = 14, "Patch" = 15,
    "Centroid" = 16, "Sample" = 17, "Invariant" = 18, "Restrict" = 19, "Aliased" = 20,
    "Volatile" = 21, "Constant" = 22, "Coherent" = 23, "NonWritable" = 24, "NonReadable" = 25,
    "Uniform" = 26, "SaturatedConversion" = 28, "Stream" = 29, "Location" = 30,
    "Component" = 31, "Index" = 32, "Binding" = 33, "DescriptorSet" = 34, "Offset" = 35,
    "XfbBuffer" = 36, "XfbStride" = 37, "FuncParamAttr" = 38, "FPRoundingMode" = 39,
    "FPFastMathMode" = 40, "LinkageAttributes" = 41, "NoContraction" = 42,
    "InputAttachmentIndex" = 43, "Alignment" = 44,
});

enum_table!(scope => {
    "CrossDevice" = 0, "Device" = 1, "Workgroup" = 2, "Subgroup" = 3, "Invocation" = 4,
});

enum_table!(group_operation => {
    "Reduce" = 0, "InclusiveScan" = 1, "ExclusiveScan" = 2,
});

fn enum_table_for(kind: &str) -> Option<fn(&str) -> Option<u32>> {
    Some(match kind {
        "SourceLanguage" => source_language,
        "AddressingModel" => addressing_model,
        "MemoryModel" => memory_model,
        "ExecutionModel" => execution_model,
        "ExecutionMode" => execution_mode,
        "Capability" => capability,
        "StorageClass" => storage_class,
        "Dim" => dim,
        "ImageFormat" => image_format,
        "SamplerAddressingMode" => sampler_addressing_mode,
        "SamplerFilterMode" => sampler_filter_mode,
        "AccessQualifier" => access_qualifier,
        "Decoration" => decoration,
        "Scope" => scope,
        "GroupOperation" => group_operation,
        _ => return None,
    })
}

/// All `(name, value)` pairs for an enumerant kind, for building the
/// reverse (value -> name) lookup.
fn enum_pairs(kind: &str) -> &'static [(&'static str, u32)] {
    match kind {
        "SourceLanguage" => &[("Unknown", 0), ("ESSL", 1), ("GLSL", 2), ("OpenCL_C", 3), ("OpenCL_CPP", 4), ("HLSL", 5)],
        "AddressingModel" => &[("Logical", 0), ("Physical32", 1), ("Physical64", 2), ("PhysicalStorageBuffer64", 5348)],
        "MemoryModel" => &[("Simple", 0), ("GLSL450", 1), ("OpenCL", 2), ("Vulkan", 3)],
        "ExecutionModel" => &[
            ("Vertex", 0), ("TessellationControl", 1), ("TessellationEvaluation", 2), ("Geometry", 3),
            ("Fragment", 4), ("GLCompute", 5), ("Kernel", 6),
        ],
        "ExecutionMode" => &[
            ("Invocations", 0), ("SpacingEqual", 1), ("SpacingFractionalEven", 2), ("SpacingFractionalOdd", 3),
            ("VertexOrderCw", 4), ("VertexOrderCcw", 5), ("PixelCenterInteger", 6), ("OriginUpperLeft", 7),
            ("OriginLowerLeft", 8), ("EarlyFragmentTests", 9), ("PointMode", 10), ("Xfb", 11),
            ("DepthReplacing", 12), ("DepthGreater", 14), ("DepthLess", 15), ("DepthUnchanged", 16),
            ("LocalSize", 17), ("LocalSizeHint", 18), ("InputPoints", 19), ("InputLines", 20),
            ("InputLinesAdjacency", 21), ("Triangles", 22), ("InputTrianglesAdjacency", 23), ("Quads", 24),
            ("Isolines", 25), ("OutputVertices", 26), ("OutputPoints", 27), ("OutputLineStrip", 28),
            ("OutputTriangleStrip", 29), ("VecTypeHint", 30), ("ContractionOff", 31), ("Initializer", 33),
            ("Finalizer", 34), ("SubgroupSize", 35), ("SubgroupsPerWorkgroup", 36),
        ],
        "Capability" => &[
            ("Matrix", 0), ("Shader", 1), ("Geometry", 2), ("Tessellation", 3), ("Addresses", 4),
            ("Linkage", 5), ("Kernel", 6), ("Vector16", 7), ("Float16Buffer", 8), ("Float16", 9),
            ("Float64", 10), ("Int64", 11), ("Int64Atomics", 12), ("ImageBasic", 13), ("ImageReadWrite", 14),
            ("ImageMipmap", 15), ("Pipes", 17), ("Groups", 18), ("DeviceEnqueue", 19), ("LiteralSampler", 20),
            ("AtomicStorage", 21), ("Int16", 22), ("TessellationPointSize", 23), ("GeometryPointSize", 24),
            ("ImageGatherExtended", 25), ("StorageImageMultisample", 27),
            ("UniformBufferArrayDynamicIndexing", 28), ("SampledImageArrayDynamicIndexing", 29),
            ("StorageBufferArrayDynamicIndexing", 30), ("StorageImageArrayDynamicIndexing", 31),
            ("ClipDistance", 32), ("CullDistance", 33), ("ImageCubeArray", 34), ("SampleRateShading", 35),
            ("ImageRect", 36), ("SampledRect", 37), ("GenericPointer", 38), ("Int8", 39),
            ("InputAttachment", 40), ("SparseResidency", 41), ("MinLod", 42), ("Sampled1D", 43),
            ("Image1D", 44), ("SampledCubeArray", 45), ("SampledBuffer", 46), ("ImageBuffer", 47),
            ("ImageMSArray", 48), ("StorageImageExtendedFormats", 49), ("ImageQuery", 50),
            ("DerivativeControl", 51), ("InterpolationFunction", 52), ("TransformFeedback", 53),
            ("GeometryStreams", 54), ("StorageImageReadWithoutFormat", 55),
            ("StorageImageWriteWithoutFormat", 56), ("MultiViewport", 57),
        ],
        "StorageClass" => &[
            ("UniformConstant", 0), ("Input", 1), ("Uniform", 2), ("Output", 3), ("Workgroup", 4),
            ("CrossWorkgroup", 5), ("Private", 6), ("Function", 7), ("Generic", 8), ("PushConstant", 9),
            ("AtomicCounter", 10), ("Image", 11), ("StorageBuffer", 12),
        ],
        "Dim" => &[("Dim1D", 0), ("Dim2D", 1), ("Dim3D", 2), ("Cube", 3), ("Rect", 4), ("Buffer", 5), ("SubpassData", 6)],
        "ImageFormat" => &[
            ("Unknown", 0), ("Rgba32f", 1), ("Rgba16f", 2), ("R32f", 3), ("Rgba8", 4), ("Rgba8Snorm", 5),
            ("Rg32f", 6), ("Rg16f", 7), ("R11fG11fB10f", 8), ("R16f", 9), ("Rgba16", 10), ("Rgb10A2", 11),
            ("Rg16", 12), ("Rg8", 13), ("R16", 14), ("R8", 15), ("Rgba16Snorm", 16), ("Rg16Snorm", 17),
            ("Rg8Snorm", 18), ("R16Snorm", 19), ("R8Snorm", 20), ("Rgba32i", 21), ("Rgba16i", 22),
            ("Rgba8i", 23), ("R32i", 24), ("Rg32i", 25), ("Rg16i", 26), ("Rg8i", 27), ("R16i", 28), ("R8i", 29),
            ("Rgba32ui", 30), ("Rgba16ui", 31), ("Rgba8ui", 32), ("R32ui", 33), ("Rgb10a2ui", 34),
            ("Rg32ui", 35), ("Rg16ui", 36), ("Rg8ui", 37), ("R16ui", 38), ("R8ui", 39),
        ],
        "SamplerAddressingMode" => &[
            ("None", 0), ("ClampToEdge", 1), ("Clamp", 2), ("Repeat", 3), ("RepeatMirrored", 4),
        ],
        "SamplerFilterMode" => &[("Nearest", 0), ("Linear", 1)],
        "AccessQualifier" => &[("ReadOnly", 0), ("WriteOnly", 1), ("ReadWrite", 2)],
        "Decoration" => &[
            ("RelaxedPrecision", 0), ("SpecId", 1), ("Block", 2), ("BufferBlock", 3), ("RowMajor", 4),
            ("ColMajor", 5), ("ArrayStride", 6), ("MatrixStride", 7), ("GLSLShared", 8), ("GLSLPacked", 9),
            ("CPacked", 10), ("BuiltIn", 11), ("NoPerspective", 13), ("Flat", 14), ("Patch", 15),
            ("Centroid", 16), ("Sample", 17), ("Invariant", 18), ("Restrict", 19), ("Aliased", 20),
            ("Volatile", 21), ("Constant", 22), ("Coherent", 23), ("NonWritable", 24), ("NonReadable", 25),
            ("Uniform", 26), ("SaturatedConversion", 28), ("Stream", 29), ("Location", 30),
            ("Component", 31), ("Index", 32), ("Binding", 33), ("DescriptorSet", 34), ("Offset", 35),
            ("XfbBuffer", 36), ("XfbStride", 37), ("FuncParamAttr", 38), ("FPRoundingMode", 39),
            ("FPFastMathMode", 40), ("LinkageAttributes", 41), ("NoContraction", 42),
            ("InputAttachmentIndex", 43), ("Alignment", 44),
        ],
        "Scope" => &[("CrossDevice", 0), ("Device", 1), ("Workgroup", 2), ("Subgroup", 3), ("Invocation", 4)],
        "GroupOperation" => &[("Reduce", 0), ("InclusiveScan", 1), ("ExclusiveScan", 2)],
        _ => &[],
    }
}

/// The mask tokens and bit values for a `Mask`-kind operand, in the order
/// they should be tested when decomposing a wire value (spec order, not
/// numeric order, matching the reference implementation's own table).
fn mask_pairs(kind: &str) -> &'static [(&'static str, u32)] {
    match kind {
        "FunctionControl" => {
            &[("None", 0x0), ("Inline", 0x1), ("DontInline", 0x2), ("Pure", 0x4), ("Const", 0x8)]
        }
        "MemoryAccess" => &[("None", 0x0), ("Volatile", 0x1), ("Aligned", 0x2), ("Nontemporal", 0x4)],
        "LoopControl" => &[("None", 0x0), ("Unroll", 0x1), ("DontUnroll", 0x2)],
        "SelectionControl" => &[("None", 0x0), ("Flatten", 0x1), ("DontFlatten", 0x2)],
        "MemorySemantics" => &[
            ("None", 0x0),
            ("Acquire", 0x2), ("Release", 0x4), ("AcquireRelease", 0x8), ("SequentiallyConsistent", 0x10),
            ("UniformMemory", 0x40), ("SubgroupMemory", 0x80), ("WorkgroupMemory", 0x100),
            ("CrossWorkgroupMemory", 0x200), ("AtomicCounterMemory", 0x400), ("ImageMemory", 0x800),
        ],
        _ => &[],
    }
}

/// The token name whose value is `0` for a mask kind (e.g. `"None"` for
/// `FunctionControl`), used by a pretty-printer to render an empty mask.
pub fn mask_zero_name(kind: &str) -> Option<&'static str> {
    mask_pairs(kind).iter().find(|&&(_, v)| v == 0).map(|&(name, _)| name)
}

/// Look up the numeric value of an enumerant by name.
pub fn enum_value(kind: &str, name: &str) -> Option<u32> {
    enum_table_for(kind).and_then(|table| table(name))
}

/// Look up the name of an enumerant by numeric value.
pub fn enum_name(kind: &str, value: u32) -> Option<&'static str> {
    enum_pairs(kind).iter().find(|&&(_, v)| v == value).map(|&(name, _)| name)
}

/// Combine a list of mask token names into their OR'd wire value.
pub fn mask_value(kind: &str, tokens: &[String]) -> Option<u32> {
    let pairs = mask_pairs(kind);
    let mut value = 0;
    for token in tokens {
        let (_, bit) = pairs.iter().find(|&&(name, _)| name == token)?;
        value |= bit;
    }
    Some(value)
}

/// Decompose a wire value into the mask token names it is built from, in
/// ascending bit order. Returns `None` if any set bit is not accounted
/// for by the kind's known mask tokens.
pub fn mask_names(kind: &str, value: u32) -> Option<Vec<&'static str>> {
    let mut remaining = value;
    let mut names = Vec::new();
    for &(name, bit) in mask_pairs(kind) {
        if remaining & bit != 0 {
            names.push(name);
            remaining ^= bit;
        }
    }
    if remaining != 0 {
        return None;
    }
    Some(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[coverage_helper::test]
    fn enum_value_round_trips_through_enum_name() {
        assert_eq!(enum_value("StorageClass", "Function"), Some(7));
        assert_eq!(enum_name("StorageClass", 7), Some("Function"));
    }

    #[coverage_helper::test]
    fn mask_value_combines_bits_and_mask_names_decomposes_them() {
        let tokens = vec!["Inline".to_string(), "Const".to_string()];
        let value = mask_value("FunctionControl", &tokens).unwrap();
        assert_eq!(value, 0x1 | 0x8);
        let mut names = mask_names("FunctionControl", value).unwrap();
        names.sort_unstable();
        assert_eq!(names, vec!["Const", "Inline"]);
    }

    #[coverage_helper::test]
    fn mask_names_rejects_unknown_bits() {
        assert_eq!(mask_names("LoopControl", 0x8000_0000), None);
    }

    #[coverage_helper::test]
    fn unknown_enum_kind_resolves_to_nothing() {
        assert_eq!(enum_value("NotAKind", "Whatever"), None);
    }
}
