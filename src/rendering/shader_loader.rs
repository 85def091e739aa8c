use std::{collections::HashMap, path::Path};

use naga::{
    back::wgsl::WriterFlags,
    valid::{Capabilities, ValidationFlags},
};
use naga_oil::compose::{Composer, NagaModuleDescriptor};

pub use naga_oil::compose::ShaderDefValue;

use crate::rendering::{
    context::ShaderStage,
    error::{DiagnosticInfo, ErrorCode, GraphicsError},
};

pub const SHADER_FOLDER: &'static str = "assets/shaders";

/// Preprocessor-style defines passed to the shader composer.
pub type ShaderDefines<'a> = &'a [(&'a str, ShaderDefValue)];

/// A vertex attribute consumed by a vertex entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexInput {
    pub location: u32,
    /// Scalar component count, 0 for types that are not scalars or vectors.
    pub components: u32,
}

/// Validated shader output of the composer, plus the reflection data needed
/// to check input layouts against it.
#[derive(Debug, Clone)]
pub struct CompiledShader {
    pub name: String,
    pub stage: ShaderStage,
    pub source: String,
    vertex_inputs: Vec<VertexInput>,
}

impl CompiledShader {
    pub fn entry_point(&self) -> &'static str {
        self.stage.entry_point()
    }

    /// Sorted by location. Empty for pixel shaders.
    pub fn vertex_inputs(&self) -> &[VertexInput] {
        &self.vertex_inputs
    }
}

/// Reads and compiles a shader relative to [`SHADER_FOLDER`].
pub fn compile_file(
    path: impl AsRef<Path>,
    stage: ShaderStage,
    defines: ShaderDefines,
) -> Result<CompiledShader, GraphicsError> {
    let path = Path::new(SHADER_FOLDER).join(path);
    let source = std::fs::read_to_string(&path).map_err(|e| {
        compile_error(format!(
            "Failed to read shader file {}: {}",
            path.display(),
            e
        ))
    })?;

    compile_source(&path.to_string_lossy(), &source, stage, defines)
}

pub fn compile_source(
    name: &str,
    source: &str,
    stage: ShaderStage,
    defines: ShaderDefines,
) -> Result<CompiledShader, GraphicsError> {
    log::debug!("Compiling {:?} shader {} ({} defines)", stage, name, defines.len());

    let mut composer = Composer::default();

    let shader_defs: HashMap<String, ShaderDefValue> = defines
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect();

    let module = composer
        .make_naga_module(NagaModuleDescriptor {
            file_path: name,
            source,
            shader_defs,
            ..Default::default()
        })
        .map_err(|e| compile_error(format!("{}: {}", name, e.emit_to_string(&composer))))?;

    let info = naga::valid::Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(&module)
        .map_err(|e| compile_error(format!("{}: {}", name, e.into_inner())))?;

    let entry_point = module
        .entry_points
        .iter()
        .find(|ep| ep.name == stage.entry_point() && ep.stage == stage.naga_stage())
        .ok_or_else(|| {
            compile_error(format!(
                "{}: missing {:?} entry point `{}`",
                name,
                stage,
                stage.entry_point()
            ))
        })?;

    let vertex_inputs = match stage {
        ShaderStage::Vertex => reflect_vertex_inputs(&module, &entry_point.function),
        ShaderStage::Pixel => Vec::new(),
    };

    let source = naga::back::wgsl::write_string(&module, &info, WriterFlags::empty())
        .map_err(|e| compile_error(format!("{}: failed to emit WGSL: {}", name, e)))?;

    Ok(CompiledShader {
        name: name.to_string(),
        stage,
        source,
        vertex_inputs,
    })
}

#[track_caller]
fn compile_error(message: String) -> GraphicsError {
    // Compiler output is reported regardless of build type; there is no
    // debug layer involved.
    GraphicsError::device(ErrorCode::SHADER_COMPILATION, DiagnosticInfo::single(message))
}

fn reflect_vertex_inputs(module: &naga::Module, function: &naga::Function) -> Vec<VertexInput> {
    let mut inputs = Vec::new();

    for argument in &function.arguments {
        match &argument.binding {
            Some(binding) => push_location(&mut inputs, module, binding, argument.ty),
            None => {
                if let naga::TypeInner::Struct { members, .. } = &module.types[argument.ty].inner {
                    for member in members {
                        if let Some(binding) = &member.binding {
                            push_location(&mut inputs, module, binding, member.ty);
                        }
                    }
                }
            }
        }
    }

    inputs.sort_by_key(|input| input.location);
    inputs
}

fn push_location(
    inputs: &mut Vec<VertexInput>,
    module: &naga::Module,
    binding: &naga::Binding,
    ty: naga::Handle<naga::Type>,
) {
    let naga::Binding::Location { location, .. } = *binding else {
        return;
    };

    let components = match module.types[ty].inner {
        naga::TypeInner::Scalar(_) => 1,
        naga::TypeInner::Vector { size, .. } => match size {
            naga::VectorSize::Bi => 2,
            naga::VectorSize::Tri => 3,
            naga::VectorSize::Quad => 4,
        },
        _ => 0,
    };

    inputs.push(VertexInput {
        location,
        components,
    });
}
