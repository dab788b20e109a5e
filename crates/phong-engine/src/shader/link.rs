use naga::{AddressSpace, Binding, Handle, Module, Type, TypeInner};

use crate::error::ShaderError;
use crate::mesh::VertexLayout;

use super::stage::{CompiledStage, ShaderStage};

/// Index of a uniform inside a linked program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformSlot(pub(crate) u32);

impl UniformSlot {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Which stages read a uniform.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct StageMask {
    pub vertex: bool,
    pub fragment: bool,
}

impl StageMask {
    fn insert(&mut self, stage: ShaderStage) {
        match stage {
            ShaderStage::Vertex => self.vertex = true,
            ShaderStage::Fragment => self.fragment = true,
        }
    }
}

/// A `var<uniform>` declaration resolved from the program's stages.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UniformDecl {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    /// Size of the value in bytes.
    pub size: u32,
    pub is_mat4: bool,
    pub stages: StageMask,
}

/// Two linked stages plus their merged uniform table.
#[derive(Debug)]
pub struct ProgramInterface {
    vertex: CompiledStage,
    fragment: CompiledStage,
    uniforms: Vec<UniformDecl>,
}

impl ProgramInterface {
    pub fn vertex(&self) -> &CompiledStage {
        &self.vertex
    }

    pub fn fragment(&self) -> &CompiledStage {
        &self.fragment
    }

    pub fn uniforms(&self) -> &[UniformDecl] {
        &self.uniforms
    }

    pub fn uniform(&self, slot: UniformSlot) -> Option<&UniformDecl> {
        self.uniforms.get(slot.0 as usize)
    }

    pub fn uniform_location(&self, name: &str) -> Result<UniformSlot, ShaderError> {
        self.uniforms
            .iter()
            .position(|u| u.name == name)
            .map(|i| UniformSlot(i as u32))
            .ok_or_else(|| ShaderError::UniformNotFound(name.to_string()))
    }
}

/// Checks the interface between `vertex`, `fragment` and the standard vertex layout.
pub fn link(vertex: CompiledStage, fragment: CompiledStage) -> Result<ProgramInterface, ShaderError> {
    if vertex.stage() != ShaderStage::Vertex || fragment.stage() != ShaderStage::Fragment {
        return Err(ShaderError::Link(format!(
            "expected vertex + fragment stages, got {} + {}",
            vertex.stage().label(),
            fragment.stage().label()
        )));
    }

    check_vertex_inputs(&vertex, &VertexLayout::STANDARD)?;
    check_varyings(&vertex, &fragment)?;

    let mut uniforms = Vec::new();
    collect_uniforms(&vertex, &mut uniforms)?;
    collect_uniforms(&fragment, &mut uniforms)?;
    uniforms.sort_by_key(|u| (u.group, u.binding));

    log::debug!(
        "linked program: {} uniforms ({})",
        uniforms.len(),
        uniforms
            .iter()
            .map(|u| u.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(ProgramInterface {
        vertex,
        fragment,
        uniforms,
    })
}

fn check_vertex_inputs(vertex: &CompiledStage, layout: &VertexLayout) -> Result<(), ShaderError> {
    let module = vertex.module();
    for arg in &vertex.entry().function.arguments {
        for (location, ty) in locations(module, arg.ty, arg.binding.as_ref()) {
            let Some(attr) = layout.attribute(location) else {
                return Err(ShaderError::Link(format!(
                    "vertex input @location({location}) is not provided by the vertex buffer"
                )));
            };
            let wanted = float_components(&module.types[ty].inner);
            if wanted != Some(attr.format.components()) {
                return Err(ShaderError::Link(format!(
                    "vertex input @location({location}) expects {:?} but the buffer provides {:?}",
                    module.types[ty].inner, attr.format
                )));
            }
        }
    }
    Ok(())
}

fn check_varyings(vertex: &CompiledStage, fragment: &CompiledStage) -> Result<(), ShaderError> {
    let vs_module = vertex.module();
    let outputs = vertex
        .entry()
        .function
        .result
        .as_ref()
        .map(|r| locations(vs_module, r.ty, r.binding.as_ref()))
        .unwrap_or_default();

    let fs_module = fragment.module();
    for arg in &fragment.entry().function.arguments {
        for (location, ty) in locations(fs_module, arg.ty, arg.binding.as_ref()) {
            let Some((_, out_ty)) = outputs.iter().find(|(l, _)| *l == location) else {
                return Err(ShaderError::Link(format!(
                    "fragment input @location({location}) is not written by the vertex stage"
                )));
            };
            if vs_module.types[*out_ty].inner != fs_module.types[ty].inner {
                return Err(ShaderError::Link(format!(
                    "@location({location}) type mismatch between vertex output and fragment input"
                )));
            }
        }
    }
    Ok(())
}

fn collect_uniforms(stage: &CompiledStage, out: &mut Vec<UniformDecl>) -> Result<(), ShaderError> {
    let module = stage.module();
    for (_, var) in module.global_variables.iter() {
        if var.space != AddressSpace::Uniform {
            continue;
        }
        let (Some(name), Some(res)) = (var.name.as_ref(), var.binding.as_ref()) else {
            continue;
        };

        let inner = &module.types[var.ty].inner;
        let decl = UniformDecl {
            name: name.clone(),
            group: res.group,
            binding: res.binding,
            size: inner.size(module.to_ctx()),
            is_mat4: is_mat4_f32(inner),
            stages: StageMask::default(),
        };

        let existing = out
            .iter_mut()
            .find(|u| u.name == decl.name || (u.group, u.binding) == (decl.group, decl.binding));

        match existing {
            Some(u) => {
                let same = u.name == decl.name
                    && (u.group, u.binding) == (decl.group, decl.binding)
                    && u.size == decl.size
                    && u.is_mat4 == decl.is_mat4;
                if !same {
                    return Err(ShaderError::Link(format!(
                        "uniform '{}' (@group({}) @binding({})) conflicts with '{}' (@group({}) @binding({}))",
                        decl.name, decl.group, decl.binding, u.name, u.group, u.binding
                    )));
                }
                u.stages.insert(stage.stage());
            }
            None => {
                let mut decl = decl;
                decl.stages.insert(stage.stage());
                out.push(decl);
            }
        }
    }
    Ok(())
}

/// Flattens an entry point argument/result into `(location, type)` pairs.
fn locations(module: &Module, ty: Handle<Type>, binding: Option<&Binding>) -> Vec<(u32, Handle<Type>)> {
    match binding {
        Some(Binding::Location { location, .. }) => vec![(*location, ty)],
        Some(Binding::BuiltIn(_)) => Vec::new(),
        None => match &module.types[ty].inner {
            TypeInner::Struct { members, .. } => members
                .iter()
                .flat_map(|m| locations(module, m.ty, m.binding.as_ref()))
                .collect(),
            _ => Vec::new(),
        },
    }
}

fn float_components(inner: &TypeInner) -> Option<u32> {
    match inner {
        TypeInner::Scalar(s) if *s == naga::Scalar::F32 => Some(1),
        TypeInner::Vector { size, scalar } if *scalar == naga::Scalar::F32 => Some(*size as u32),
        _ => None,
    }
}

fn is_mat4_f32(inner: &TypeInner) -> bool {
    matches!(
        inner,
        TypeInner::Matrix {
            columns: naga::VectorSize::Quad,
            rows: naga::VectorSize::Quad,
            scalar,
        } if *scalar == naga::Scalar::F32
    )
}
