//! Asset loading: byte readers, keyed single-flight loading and the shared
//! model cache.

pub mod in_flight;
pub mod io;
pub mod model_cache;
pub mod prefab;

pub use in_flight::InFlightMap;
pub use io::{AssetReader, FileAssetReader, MemoryAssetReader};
pub use model_cache::{ModelKey, ModelLoader, SharedModelCache};
pub use prefab::{GeometryDesc, Prefab, PrefabMesh, PrefabNode, SharedPrefab, StandardMaterial};
