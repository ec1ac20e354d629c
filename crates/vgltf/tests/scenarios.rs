//! End-to-end export, encode, decode and import flows.

use proptest::prelude::*;
use serde_json::Value;
use vgltf::container::{parse_glb, write_glb, CHUNK_JSON, GLB_MAGIC};
use vgltf::export::{ImageData, MaterialData, MeshData, NodeDescription, PrimitiveSource, TextureData};
use vgltf::import::{MaterialTextures, PrimitiveData};
use vgltf::schema::{Material, Mesh, MimeType, Node, Sampler, Texture};
use vgltf::store::{ImageResource, ResourcesStore};
use vgltf::{
    BoxError, ExportOptions, Exporter, GltfContainer, ImportBridge, ImportOptions, Importer, IndexedResource,
    SceneSource, SlicerConfig, VgltfError,
};

/// Object `i` is `objects[i]`: name, children, mesh.
struct Scene {
    objects: Vec<(&'static str, Vec<usize>, Option<u32>)>,
    /// Texture handle used by every material.
    texture: u32,
    /// Whether that texture carries an image.
    textured: bool,
}

impl SceneSource for Scene {
    type Object = usize;
    type Mesh = u32;
    type Material = u32;
    type Texture = u32;
    type Image = u32;

    fn children(&self, object: &usize) -> Vec<usize> {
        self.objects[*object].1.clone()
    }

    fn node(&self, object: &usize) -> NodeDescription {
        NodeDescription {
            name: Some(self.objects[*object].0.to_string()),
            ..Default::default()
        }
    }

    fn mesh(&self, object: &usize) -> Option<u32> {
        self.objects[*object].2
    }

    fn mesh_data(&self, mesh: &u32) -> Result<MeshData<u32>, BoxError> {
        let mut primitive = PrimitiveSource::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        primitive.normals = Some(vec![[0.0, 0.0, 1.0]; 3]);
        primitive.tex_coords = vec![vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]];
        primitive.indices = Some(vec![0, 1, 2]);
        // One material per mesh handle.
        primitive.material = Some(*mesh);
        Ok(MeshData {
            name: None,
            primitives: vec![primitive],
        })
    }

    fn material_data(&self, material: &u32) -> Result<MaterialData<u32>, BoxError> {
        Ok(MaterialData {
            name: Some(format!("material{material}")),
            base_color_texture: Some(self.texture),
            ..Default::default()
        })
    }

    fn texture_data(&self, _texture: &u32) -> Result<TextureData<u32>, BoxError> {
        Ok(TextureData {
            name: Some("shared".into()),
            image: self.textured.then_some(0),
            sampler: None,
        })
    }

    fn image_data(&self, _image: &u32) -> Result<ImageData, BoxError> {
        Ok(ImageData {
            name: None,
            mime_type: MimeType::ImagePng,
            bytes: vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A],
        })
    }
}

fn two_materials(textured: bool) -> Scene {
    Scene {
        objects: vec![("root", vec![1, 2], None), ("left", vec![], Some(0)), ("right", vec![], Some(1))],
        texture: 5,
        textured,
    }
}

/// Records constructor calls; materials keep the texture handles they were
/// given so tests can compare identities.
#[derive(Default)]
struct Engine {
    textures_built: usize,
    images_built: usize,
}

impl ImportBridge for Engine {
    type Node = String;
    type Mesh = usize;
    type Material = Vec<IndexedResource<Option<usize>>>;
    type Texture = Option<usize>;
    type Image = usize;

    fn create_image(&mut self, _index: usize, image: &ImageResource) -> Result<usize, BoxError> {
        self.images_built += 1;
        Ok(image.bytes.as_ref().map_or(0, |b| b.len()))
    }

    fn create_texture(
        &mut self,
        _index: usize,
        _texture: &Texture,
        image: Option<IndexedResource<usize>>,
        _sampler: Option<&Sampler>,
    ) -> Result<Option<usize>, BoxError> {
        self.textures_built += 1;
        Ok(image.map(|i| *i.value))
    }

    fn create_material(
        &mut self,
        _index: usize,
        _material: &Material,
        textures: &MaterialTextures<Option<usize>>,
    ) -> Result<Self::Material, BoxError> {
        Ok(textures.iter().cloned().collect())
    }

    fn create_mesh(&mut self, _index: usize, _mesh: &Mesh, primitives: &[PrimitiveData<Self::Material>]) -> Result<usize, BoxError> {
        let positions = primitives[0].positions().ok_or("no positions")?;
        Ok(positions.read_vec3()?.len())
    }

    fn create_node(&mut self, index: usize, node: &Node, _mesh: Option<IndexedResource<usize>>) -> Result<String, BoxError> {
        Ok(node.name.clone().unwrap_or_else(|| index.to_string()))
    }

    fn attach_child(&mut self, _parent: &IndexedResource<String>, _child: &IndexedResource<String>) -> Result<(), BoxError> {
        Ok(())
    }
}

fn export(source: &Scene, options: ExportOptions) -> GltfContainer {
    let mut exporter = Exporter::new(options);
    exporter.begin(source, 0).unwrap();
    exporter.run(source).unwrap();
    exporter.into_container().unwrap()
}

#[test]
fn test_single_node_encodes_json_chunk_only() {
    let source = Scene {
        objects: vec![("only", vec![], None)],
        texture: 0,
        textured: false,
    };
    let container = export(&source, ExportOptions::new().with_use_children(false));
    let glb = container.to_glb().unwrap();

    let json = serde_json::to_string(&container.gltf).unwrap();
    insta::assert_snapshot!(json, @r###"{"asset":{"version":"2.0","generator":"vgltf"},"scene":0,"scenes":[{"nodes":[0]}],"nodes":[{"name":"only"}]}"###);

    let padded = json.len().next_multiple_of(4);
    assert_eq!(glb.len(), 12 + 8 + padded);
    assert_eq!(u32::from_le_bytes(glb[0..4].try_into().unwrap()), GLB_MAGIC);
    assert_eq!(u32::from_le_bytes(glb[8..12].try_into().unwrap()) as usize, glb.len());
    assert_eq!(u32::from_le_bytes(glb[16..20].try_into().unwrap()), CHUNK_JSON);
    assert!(glb[20 + json.len()..].iter().all(|&b| b == b' '));

    let decoded = GltfContainer::from_glb(&glb).unwrap();
    assert!(decoded.buffer.is_none());
    assert_eq!(decoded, container);
}

#[test]
fn test_shared_texture_is_constructed_once() {
    let source = two_materials(true);
    let container = export(&source, ExportOptions::new());
    assert_eq!(container.gltf.materials.len(), 2);
    assert_eq!(container.gltf.textures.len(), 1);

    let glb = container.to_glb().unwrap();
    let decoded = GltfContainer::from_glb(&glb).unwrap();
    let mut importer = Importer::new(decoded, Engine::default(), ImportOptions::new()).unwrap();
    importer.run().unwrap();
    let scene = importer.finish().unwrap();

    assert_eq!(scene.bridge.textures_built, 1);
    assert_eq!(scene.bridge.images_built, 1);

    let first = scene.cache.materials.get(&0).unwrap();
    let second = scene.cache.materials.get(&1).unwrap();
    assert!(first.value[0].same_value(&second.value[0]));
    assert_eq!(*first.value[0].value, Some(8));

    let roots: Vec<&str> = scene.roots.iter().map(|r| r.value.as_str()).collect();
    assert_eq!(roots, vec!["left", "right"]);
    assert_eq!(*scene.cache.meshes.get(&0).unwrap().value, 3);
}

#[test]
fn test_time_sliced_round_trip_matches_unsliced() {
    let source = two_materials(true);
    let whole = export(&source, ExportOptions::new());
    let sliced = export(&source, ExportOptions::new().with_slicer(SlicerConfig::WorkUnits(1)));
    assert_eq!(whole, sliced);

    let json = whole.to_json(&Default::default()).unwrap();
    let from_json = GltfContainer::from_bytes(&json).unwrap();
    let mut importer = Importer::new(from_json, Engine::default(), ImportOptions::new()).unwrap();
    importer.run().unwrap();
    assert_eq!(importer.finish().unwrap().cache.meshes.len(), 2);
}

#[test]
fn test_view_past_buffer_is_reference_error() {
    let json = br#"{"asset":{"version":"2.0"},"buffers":[{"byteLength":12}],"bufferViews":[{"buffer":0,"byteOffset":10,"byteLength":8}]}"#;
    let glb = write_glb(json, Some(&[0u8; 12])).unwrap();
    let err = GltfContainer::from_glb(&glb).unwrap_err();
    assert!(matches!(err, VgltfError::Reference { ref path, .. } if path == "bufferViews[0]"));
}

#[test]
fn test_texture_without_source_imports_untextured() {
    let source = two_materials(false);
    let container = export(&source, ExportOptions::new());
    assert_eq!(container.gltf.textures[0].source, None);
    assert!(container.gltf.images.is_empty());

    let decoded = GltfContainer::from_glb(&container.to_glb().unwrap()).unwrap();
    let mut importer = Importer::new(decoded, Engine::default(), ImportOptions::new()).unwrap();
    importer.run().unwrap();
    let scene = importer.finish().unwrap();

    assert_eq!(scene.bridge.images_built, 0);
    let material = scene.cache.materials.get(&0).unwrap();
    assert_eq!(*material.value[0].value, None);
}

#[test]
fn test_overflowing_view_offset_is_reference_error() {
    let json = br#"{"asset":{"version":"2.0"},"buffers":[{"byteLength":12}],"bufferViews":[{"buffer":0,"byteOffset":18446744073709551615,"byteLength":2}]}"#;
    let glb = write_glb(json, Some(&[0u8; 12])).unwrap();
    let err = GltfContainer::from_glb(&glb).unwrap_err();
    assert!(matches!(err, VgltfError::Reference { ref path, .. } if path == "bufferViews[0]"));
}

#[test]
fn test_huge_accessor_count_is_schema_error() {
    let json = br#"{"asset":{"version":"2.0"},"buffers":[{"byteLength":12}],"bufferViews":[{"buffer":0,"byteLength":12}],
        "accessors":[{"bufferView":0,"componentType":5126,"type":"VEC3","count":1537228672809129302}]}"#;
    let glb = write_glb(json, Some(&[0u8; 12])).unwrap();
    assert!(matches!(GltfContainer::from_glb(&glb), Err(VgltfError::SchemaViolation { .. })));

    let json = br#"{"asset":{"version":"2.0"},"accessors":[{"componentType":5126,"type":"MAT4","count":4294967296}]}"#;
    assert!(matches!(GltfContainer::from_json(json), Err(VgltfError::SchemaViolation { .. })));
}

#[test]
fn test_ktx2_image_is_read_as_written() {
    let json = br#"{"asset":{"version":"2.0"},"buffers":[{"byteLength":4}],"bufferViews":[{"buffer":0,"byteLength":4}],
        "images":[{"bufferView":0,"mimeType":"image/ktx2"}],"textures":[{"source":0}]}"#;
    let glb = write_glb(json, Some(&[0xAB, 0x4B, 0x54, 0x58])).unwrap();
    let container = GltfContainer::from_glb(&glb).unwrap();

    let mut store = ResourcesStore::new(container);
    let image = store.image(0).unwrap();
    assert_eq!(image.mime_type.as_deref(), Some("image/ktx2"));
    assert_eq!(image.bytes.as_deref(), Some(&[0xAB, 0x4B, 0x54, 0x58][..]));
}

#[test]
fn test_unknown_members_survive_glb_round_trip() {
    let json = r#"{
        "asset": {"version": "2.0", "vendorAsset": true},
        "scene": 0,
        "scenes": [{"nodes": [0], "vendorScene": "s"}],
        "nodes": [{"name": "n", "vendorKey": 42}],
        "textures": [{"extras": {"t": 1}}],
        "materials": [{
            "pbrMetallicRoughness": {
                "baseColorFactor": [1.0, 1.0, 1.0, 1.0],
                "baseColorTexture": {"index": 0, "extras": {"k": 1}, "vendorSlot": [1]},
                "metallicFactor": 1.0,
                "roughnessFactor": 1.0
            },
            "normalTexture": {"index": 0, "scale": 0.5, "extras": {"n": 2}},
            "alphaMode": "OPAQUE",
            "alphaCutoff": 0.5,
            "vendorMaterial": {"shader": "toon"}
        }],
        "animations": [],
        "vendorRoot": null
    }"#;
    let container = GltfContainer::from_json(json.as_bytes()).unwrap();
    assert_eq!(container.gltf.nodes[0].unknown["vendorKey"], 42);

    let decoded = GltfContainer::from_glb(&container.to_glb().unwrap()).unwrap();
    let written: Value = serde_json::to_value(&decoded.gltf).unwrap();
    let mut original: Value = serde_json::from_str(json).unwrap();
    // Empty arrays are omitted on write.
    original.as_object_mut().unwrap().remove("animations");
    assert_eq!(written, original);
}

#[test]
fn test_bin_chunk_ignored_when_buffer_has_uri() {
    let json = br#"{"asset":{"version":"2.0"},"buffers":[{"byteLength":4,"uri":"data:application/octet-stream;base64,AQIDBA=="}]}"#;
    let glb = write_glb(json, Some(&[9u8; 8])).unwrap();
    let container = GltfContainer::from_glb(&glb).unwrap();
    assert!(container.buffer.is_none());
    assert_eq!(&*ResourcesStore::new(container).buffer(0).unwrap(), &[1, 2, 3, 4]);
}

proptest! {
    #[test]
    fn prop_arbitrary_bytes_never_panic(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = parse_glb(&data);
        let _ = GltfContainer::from_bytes(&data);
    }

    #[test]
    fn prop_hostile_sizes_are_errors_not_panics(
        view_offset in any::<u64>(),
        view_length in any::<u64>(),
        accessor_offset in any::<u64>(),
        count in any::<u64>(),
        stride in prop_oneof![Just(None), (1u64..64).prop_map(|s| Some(s * 4))],
        sparse_count in any::<u64>(),
    ) {
        let stride = stride.map_or(String::new(), |s| format!(r#","byteStride":{s}"#));
        let json = format!(
            r#"{{"asset":{{"version":"2.0"}},"buffers":[{{"byteLength":64}}],
                "bufferViews":[{{"buffer":0,"byteOffset":{view_offset},"byteLength":{view_length}{stride}}}],
                "accessors":[{{"bufferView":0,"byteOffset":{accessor_offset},"componentType":5126,"type":"VEC3","count":{count}}},
                    {{"componentType":5121,"type":"MAT3","count":{count},
                      "sparse":{{"count":{sparse_count},"indices":{{"bufferView":0,"componentType":5125}},"values":{{"bufferView":0}}}}}}]}}"#
        );
        let glb = write_glb(json.as_bytes(), Some(&[0u8; 64])).unwrap();
        if let Ok(container) = GltfContainer::from_glb(&glb) {
            let mut store = ResourcesStore::new(container);
            let _ = store.accessor(0);
            let _ = store.accessor(1);
        }
    }
}
