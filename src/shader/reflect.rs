//! WGSL compilation and interface reflection through naga.

use std::collections::BTreeMap;
use std::fmt;

use naga::{AddressSpace, Binding, Handle, ImageDimension, Module, Type, TypeInner};

use super::ShaderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Uniform,
    Storage,
    Texture,
    CubeTexture,
    Sampler,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSlot {
    pub group: u32,
    pub binding: u32,
    pub kind: ResourceKind,
}

/// One validated shader stage and what it exposes.
#[derive(Debug)]
pub struct CompiledStage {
    pub stage: ShaderStage,
    pub entry_point: String,
    pub source: String,
    /// `@location` inputs of the entry point, keyed by location.
    pub inputs: BTreeMap<u32, Option<String>>,
    /// `@location` outputs of the entry point.
    pub outputs: BTreeMap<u32, Option<String>>,
    pub resources: BTreeMap<String, ResourceSlot>,
}

/// Parses and validates `source`, then records its entry point interface.
pub fn compile_stage(stage: ShaderStage, source: &str) -> Result<CompiledStage, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::Compile {
        stage,
        log: e.emit_to_string(source),
    })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| ShaderError::Compile {
        stage,
        log: e.emit_to_string(source),
    })?;

    let entry = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage.naga())
        .ok_or_else(|| ShaderError::Compile {
            stage,
            log: format!("no @{} entry point", stage),
        })?;

    let mut inputs = Vec::new();
    for arg in &entry.function.arguments {
        collect_locations(&module, arg.ty, arg.binding.as_ref(), arg.name.as_deref(), &mut inputs);
    }

    let mut outputs = Vec::new();
    if let Some(result) = &entry.function.result {
        collect_locations(&module, result.ty, result.binding.as_ref(), None, &mut outputs);
    }

    Ok(CompiledStage {
        stage,
        entry_point: entry.name.clone(),
        source: source.to_owned(),
        inputs: inputs.into_iter().collect(),
        outputs: outputs.into_iter().collect(),
        resources: collect_resources(&module),
    })
}

fn collect_locations(
    module: &Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    name: Option<&str>,
    out: &mut Vec<(u32, Option<String>)>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => out.push((*location, name.map(str::to_owned))),
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), member.name.as_deref(), out);
                }
            }
        }
    }
}

fn collect_resources(module: &Module) -> BTreeMap<String, ResourceSlot> {
    let mut resources = BTreeMap::new();
    for (_, var) in module.global_variables.iter() {
        let (Some(name), Some(binding)) = (&var.name, &var.binding) else {
            continue;
        };
        let kind = match var.space {
            AddressSpace::Uniform => ResourceKind::Uniform,
            AddressSpace::Storage { .. } => ResourceKind::Storage,
            AddressSpace::Handle => match module.types[var.ty].inner {
                TypeInner::Image { dim: ImageDimension::Cube, .. } => ResourceKind::CubeTexture,
                TypeInner::Image { .. } => ResourceKind::Texture,
                TypeInner::Sampler { .. } => ResourceKind::Sampler,
                _ => continue,
            },
            _ => continue,
        };
        resources.insert(
            name.clone(),
            ResourceSlot {
                group: binding.group,
                binding: binding.binding,
                kind,
            },
        );
    }
    resources
}

/// The linked interface of a vertex + fragment pair.
///
/// Every lookup returns `Option`; a name the shaders never declared is a
/// distinct outcome rather than a sentinel location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramInterface {
    attributes: BTreeMap<String, u32>,
    resources: BTreeMap<String, ResourceSlot>,
}

impl ProgramInterface {
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).copied()
    }

    pub fn resource(&self, name: &str) -> Option<ResourceSlot> {
        self.resources.get(name).copied()
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, u32)> {
        self.attributes.iter().map(|(name, loc)| (name.as_str(), *loc))
    }

    pub fn resources(&self) -> impl Iterator<Item = (&str, ResourceSlot)> {
        self.resources.iter().map(|(name, slot)| (name.as_str(), *slot))
    }
}

/// Checks that the stages agree and merges their interfaces.
pub fn link_stages(vertex: &CompiledStage, fragment: &CompiledStage) -> Result<ProgramInterface, ShaderError> {
    let mut problems = Vec::new();

    for (location, name) in &fragment.inputs {
        if !vertex.outputs.contains_key(location) {
            problems.push(format!(
                "fragment input {} at location {} is not written by the vertex stage",
                name.as_deref().unwrap_or("<unnamed>"),
                location
            ));
        }
    }

    let mut attributes = BTreeMap::new();
    for (location, name) in &vertex.inputs {
        match name {
            Some(name) => {
                attributes.insert(name.clone(), *location);
            }
            None => problems.push(format!("vertex input at location {} has no name", location)),
        }
    }

    let mut resources = vertex.resources.clone();
    for (name, slot) in &fragment.resources {
        match resources.get(name).copied() {
            Some(existing) if existing != *slot => problems.push(format!(
                "resource {} is declared at group {} binding {} in the vertex stage but group {} binding {} in the fragment stage",
                name, existing.group, existing.binding, slot.group, slot.binding
            )),
            _ => {
                resources.insert(name.clone(), *slot);
            }
        }
    }

    let mut taken: BTreeMap<(u32, u32), &str> = BTreeMap::new();
    for (name, slot) in &resources {
        if let Some(other) = taken.insert((slot.group, slot.binding), name.as_str()) {
            problems.push(format!(
                "resources {} and {} share group {} binding {}",
                other, name, slot.group, slot.binding
            ));
        }
    }

    if !problems.is_empty() {
        return Err(ShaderError::Link {
            log: problems.join("\n"),
        });
    }

    Ok(ProgramInterface { attributes, resources })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = r#"
        @group(0) @binding(0) var<uniform> pvm: mat4x4<f32>;

        struct VertexInput {
            @location(0) vertex: vec3<f32>,
            @location(3) normal: vec3<f32>,
        }

        struct VertexOutput {
            @builtin(position) clip_position: vec4<f32>,
            @location(0) normal: vec3<f32>,
        }

        @vertex
        fn vs_main(in: VertexInput) -> VertexOutput {
            var out: VertexOutput;
            out.clip_position = pvm * vec4<f32>(in.vertex, 1.0);
            out.normal = in.normal;
            return out;
        }
    "#;

    const FRAGMENT: &str = r#"
        @group(1) @binding(0) var cubemap: texture_cube<f32>;
        @group(1) @binding(1) var cubemap_sampler: sampler;

        @fragment
        fn fs_main(@location(0) normal: vec3<f32>) -> @location(0) vec4<f32> {
            return textureSample(cubemap, cubemap_sampler, normal);
        }
    "#;

    #[test]
    fn vertex_inputs_are_reflected_by_name() {
        let stage = compile_stage(ShaderStage::Vertex, VERTEX).unwrap();
        assert_eq!(stage.entry_point, "vs_main");
        assert_eq!(stage.inputs.get(&0), Some(&Some("vertex".to_string())));
        assert_eq!(stage.inputs.get(&3), Some(&Some("normal".to_string())));
        assert_eq!(stage.outputs.len(), 1);
    }

    #[test]
    fn resources_carry_group_binding_and_kind() {
        let stage = compile_stage(ShaderStage::Fragment, FRAGMENT).unwrap();
        assert_eq!(
            stage.resources.get("cubemap"),
            Some(&ResourceSlot { group: 1, binding: 0, kind: ResourceKind::CubeTexture })
        );
        assert_eq!(stage.resources.get("cubemap_sampler").map(|s| s.kind), Some(ResourceKind::Sampler));
    }

    #[test]
    fn linked_interface_separates_absent_from_present() {
        let vertex = compile_stage(ShaderStage::Vertex, VERTEX).unwrap();
        let fragment = compile_stage(ShaderStage::Fragment, FRAGMENT).unwrap();
        let interface = link_stages(&vertex, &fragment).unwrap();

        assert_eq!(interface.attribute_location("vertex"), Some(0));
        assert_eq!(interface.attribute_location("normal"), Some(3));
        assert_eq!(interface.attribute_location("texcoord"), None);
        assert_eq!(interface.resource("pvm").map(|s| s.kind), Some(ResourceKind::Uniform));
        assert_eq!(interface.resource("light_position"), None);
    }

    #[test]
    fn syntax_error_reports_the_vertex_stage() {
        let broken = VERTEX.replace("return out;", "return out");
        match compile_stage(ShaderStage::Vertex, &broken) {
            Err(ShaderError::Compile { stage, log }) => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("expected a vertex compile error, got {:?}", other.map(|s| s.entry_point)),
        }
    }

    #[test]
    fn type_error_is_caught_by_validation() {
        let broken = VERTEX.replace("out.normal = in.normal;", "out.normal = in.normal.xy;");
        assert!(matches!(
            compile_stage(ShaderStage::Vertex, &broken),
            Err(ShaderError::Compile { stage: ShaderStage::Vertex, .. })
        ));
    }

    #[test]
    fn missing_entry_point_is_a_compile_error() {
        let err = compile_stage(ShaderStage::Fragment, VERTEX).unwrap_err();
        match err {
            ShaderError::Compile { stage, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(log.contains("@fragment"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn unmatched_fragment_input_fails_to_link() {
        let vertex = compile_stage(ShaderStage::Vertex, VERTEX).unwrap();
        let fragment_src = FRAGMENT.replace("@location(0) normal", "@location(4) normal");
        let fragment = compile_stage(ShaderStage::Fragment, &fragment_src).unwrap();

        match link_stages(&vertex, &fragment) {
            Err(ShaderError::Link { log }) => assert!(log.contains("location 4")),
            other => panic!("expected link error, got {:?}", other),
        }
    }

    #[test]
    fn conflicting_resource_slots_fail_to_link() {
        let vertex = compile_stage(ShaderStage::Vertex, VERTEX).unwrap();
        let fragment_src = FRAGMENT.replace(
            "@group(1) @binding(0) var cubemap:",
            "@group(0) @binding(0) var cubemap:",
        );
        let fragment = compile_stage(ShaderStage::Fragment, &fragment_src).unwrap();

        assert!(matches!(link_stages(&vertex, &fragment), Err(ShaderError::Link { .. })));
    }
}
