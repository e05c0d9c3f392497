use std::sync::Arc;

use glam::Vec3;

use crate::media::DecodedMedia;

/// Geometry description carried by a model; the actual vertex data lives
/// with the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryDesc {
    pub label: String,
    pub triangle_count: u32,
}

impl GeometryDesc {
    pub fn new(label: impl Into<String>, triangle_count: u32) -> Self {
        Self {
            label: label.into(),
            triangle_count,
        }
    }
}

/// PBR material slot of a model mesh.
#[derive(Debug, Clone, Default)]
pub struct StandardMaterial {
    pub name: Option<String>,
    pub env_map: Option<Arc<DecodedMedia>>,
    /// Bumped whenever a field changes and the renderer must rebuild.
    pub version: u64,
}

impl StandardMaterial {
    pub fn set_env_map(&mut self, env_map: Option<Arc<DecodedMedia>>) {
        self.env_map = env_map;
        self.version += 1;
    }
}

#[derive(Debug, Clone)]
pub struct PrefabMesh {
    pub geometry: Arc<GeometryDesc>,
    pub material: Option<StandardMaterial>,
}

/// Model node: plain data, children referenced by index.
#[derive(Debug, Clone, Default)]
pub struct PrefabNode {
    pub name: Option<String>,
    pub position: Vec3,
    /// Indices of the children within `Prefab::nodes`
    pub children_indices: Vec<usize>,
    pub mesh: Option<PrefabMesh>,
}

impl PrefabNode {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_mesh(mut self, geometry: GeometryDesc, material: Option<StandardMaterial>) -> Self {
        self.mesh = Some(PrefabMesh {
            geometry: Arc::new(geometry),
            material,
        });
        self
    }
}

/// Loaded model: the intermediate data a model loader produces.
///
/// A `Prefab` contains no scene handles. Shared copies are read-only; a node
/// that wants to attach or mutate a model clones it first, because a model
/// can only have one parent in the scene tree.
#[derive(Debug, Clone, Default)]
pub struct Prefab {
    /// All nodes, flattened
    pub nodes: Vec<PrefabNode>,
    /// Indices of the root nodes in `nodes`
    pub root_indices: Vec<usize>,
}

impl Prefab {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `node` as a root and returns its index.
    pub fn push_root(&mut self, node: PrefabNode) -> usize {
        let index = self.nodes.len();
        self.nodes.push(node);
        self.root_indices.push(index);
        index
    }

    /// Appends `node` under `parent` and returns its index.
    pub fn push_child(&mut self, parent: usize, node: PrefabNode) -> usize {
        let index = self.nodes.len();
        self.nodes.push(node);
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children_indices.push(index);
        }
        index
    }

    /// Geometry of the first mesh reached depth-first from the roots.
    #[must_use]
    pub fn first_geometry(&self) -> Option<Arc<GeometryDesc>> {
        let mut stack: Vec<usize> = self.root_indices.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            let node = self.nodes.get(index)?;
            if let Some(mesh) = &node.mesh {
                return Some(Arc::clone(&mesh.geometry));
            }
            stack.extend(node.children_indices.iter().rev());
        }
        None
    }

    pub fn for_each_material_mut(&mut self, mut f: impl FnMut(&mut StandardMaterial)) {
        for node in &mut self.nodes {
            if let Some(material) = node.mesh.as_mut().and_then(|m| m.material.as_mut()) {
                f(material);
            }
        }
    }

    #[must_use]
    pub fn triangle_count(&self) -> u32 {
        self.nodes
            .iter()
            .filter_map(|node| node.mesh.as_ref())
            .map(|mesh| mesh.geometry.triangle_count)
            .sum()
    }

    #[must_use]
    pub fn material_count(&self) -> u32 {
        let count = self
            .nodes
            .iter()
            .filter(|node| node.mesh.as_ref().is_some_and(|m| m.material.is_some()))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

/// Thread-safe shared model reference
pub type SharedPrefab = Arc<Prefab>;
