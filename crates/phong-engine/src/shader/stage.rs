use std::path::Path;

use crate::error::ShaderError;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn label(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }

    pub(crate) fn to_naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

/// A parsed and validated WGSL stage with exactly one entry point.
#[derive(Debug)]
pub struct CompiledStage {
    stage: ShaderStage,
    source: String,
    entry_point: String,
    entry_index: usize,
    module: naga::Module,
}

impl CompiledStage {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub(crate) fn module(&self) -> &naga::Module {
        &self.module
    }

    pub(crate) fn entry(&self) -> &naga::EntryPoint {
        &self.module.entry_points[self.entry_index]
    }
}

/// Reads a shader source file as UTF-8 text.
pub fn read_text(path: impl AsRef<Path>) -> Result<String, ShaderError> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses and validates `source` as a single WGSL stage.
pub fn compile(stage: ShaderStage, source: &str) -> Result<CompiledStage, ShaderError> {
    let compile_error = |log: String| ShaderError::Compile {
        stage: stage.label(),
        log,
    };

    let module =
        naga::front::wgsl::parse_str(source).map_err(|e| compile_error(e.emit_to_string(source)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    )
    .validate(&module)
    .map_err(|e| compile_error(e.emit_to_string(source)))?;

    let wanted = stage.to_naga();
    let mut entries = module
        .entry_points
        .iter()
        .enumerate()
        .filter(|(_, ep)| ep.stage == wanted);
    let (entry_index, entry_point) = match (entries.next(), entries.next()) {
        (Some((index, ep)), None) => (index, ep.name.clone()),
        (None, _) => return Err(compile_error(format!("no @{} entry point", stage.label()))),
        (Some(_), Some(_)) => {
            return Err(compile_error(format!(
                "more than one @{} entry point",
                stage.label()
            )));
        }
    };

    log::debug!("compiled {} stage (entry point '{entry_point}')", stage.label());

    Ok(CompiledStage {
        stage,
        source: source.to_string(),
        entry_point,
        entry_index,
        module,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = r#"
@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 1.0);
}
"#;

    #[test]
    fn compiles_valid_stage() {
        let stage = compile(ShaderStage::Vertex, VS).unwrap();
        assert_eq!(stage.entry_point(), "vs_main");
        assert_eq!(stage.stage(), ShaderStage::Vertex);
    }

    #[test]
    fn syntax_error_is_a_compile_error() {
        let err = compile(ShaderStage::Vertex, "@vertex fn broken( -> {").unwrap_err();
        assert!(matches!(err, ShaderError::Compile { stage: "vertex", .. }));
    }

    #[test]
    fn type_error_is_a_compile_error() {
        let src = r#"
@vertex
fn vs_main() -> @builtin(position) vec4<f32> {
    let x: f32 = vec3<f32>(1.0);
    return vec4<f32>(x);
}
"#;
        assert!(matches!(
            compile(ShaderStage::Vertex, src),
            Err(ShaderError::Compile { .. })
        ));
    }

    #[test]
    fn wrong_stage_is_rejected() {
        let err = compile(ShaderStage::Fragment, VS).unwrap_err();
        match err {
            ShaderError::Compile { stage, log } => {
                assert_eq!(stage, "fragment");
                assert!(log.contains("no @fragment entry point"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unreadable_source_is_an_io_error() {
        let err = read_text("does/not/exist.wgsl").unwrap_err();
        assert!(matches!(err, ShaderError::Io { .. }));
    }
}
