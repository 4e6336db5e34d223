//! `RenderView`: the per-view extraction -> occlusion -> sort -> record
//! pipeline. One `RenderView` exists per camera or shadow view; its `init`,
//! `extract`, and `render` steps are each scheduled on a
//! [`crate::worker::WorkerPool`] job so the main thread can keep submitting
//! the previous frame's command buffers while this one is built.

use std::sync::Arc;

use render_core::ecs::{ComponentTypeMap, EntityQuery, EntityStore};
use render_core::sync::{Fence, FenceId};
use render_gpu::{CommandBuffer, Primitive};

use crate::config::RendererConfig;
use crate::frustum::Frustum;
use crate::lights::{pack_lights, LightRecord, ObjectConstants, SceneConstants};
use crate::math::{Aabb, Mat4, Vec3};
use crate::occlusion::ViewVisibility;
use crate::renderer::{AttachmentFormat, Renderer, RenderTargetConfig, RenderTargetPurpose};
use crate::scene::{Light, Material, Mesh, RenderMesh, RenderObject, SceneComponentIds, Submesh, Transform};
use crate::worker::{Job, WorkerPool};

/// Fixed shader uniform location the forward/deferred programs bind their
/// diffuse sampler to.
const DIFFUSE_SAMPLER_LOCATION: u32 = 0;

/// Fixed shader uniform location each object's constant-buffer offset is
/// pushed to.
const OBJECT_CONSTANTS_LOCATION: u32 = 1;

/// What kind of view this is: `Camera`, `Shadow`, or `Light`.
///
/// Only `Camera` views pack lights and defer visibility-marked meshes to
/// the occlusion pipeline; `Shadow`/`Light` views frustum-cull everything
/// immediately (they have nothing to light or occlude against yet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// The primary camera view: packs lights, honors `Visibility`-managed
    /// occlusion, runs the full forward/deferred pass.
    Camera,
    /// A shadow-casting light's depth view, feeding a moment shadow map.
    Shadow,
    /// A non-shadow-casting light's view, used only to extract its own
    /// packed record (no geometry pass).
    Light,
}

impl ViewKind {
    const fn wants_lights(self) -> bool {
        matches!(self, Self::Camera)
    }
}

/// What the view's single render pass produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    /// Depth values only, no color output.
    DepthOnly,
    /// A single forward-shaded color pass.
    Forward,
    /// A multi-attachment G-buffer pass.
    Deferred,
}

/// A frozen, shareable handle to the scene an extraction job reads. The
/// entity store must not be mutated for the duration of any `extract` job
/// scheduled against it — callers freeze it (e.g. after the simulation
/// thread finishes its tick) before wrapping it in an `Arc` here.
#[derive(Clone)]
pub struct Scene {
    entities: Arc<EntityStore>,
    ids: SceneComponentIds,
}

impl Scene {
    /// Pairs a frozen entity store with the component ids it was
    /// registered under.
    #[must_use]
    pub const fn new(entities: Arc<EntityStore>, ids: SceneComponentIds) -> Self {
        Self { entities, ids }
    }
}

/// Result of an [`RenderView::extract`] job: the collected objects plus the
/// view's occlusion buffer, rasterized with this frame's occluders and
/// handed back so [`RenderView::finish_extraction`] can restore it.
pub struct ExtractionOutput {
    /// Mesh and light records collected for this view, unsorted.
    pub objects: Vec<RenderObject>,
    visibility: ViewVisibility,
}

/// Sorts objects lights-first, then meshes back-to-front by AABB-centre
/// distance from `eye` — cheap overdraw-friendly ordering for the forward
/// pass without a full depth pre-pass.
pub(crate) fn sort_objects(objects: &mut [RenderObject], eye: Vec3) {
    objects.sort_by(|a, b| {
        a.sort_tag().cmp(&b.sort_tag()).then_with(|| match (a, b) {
            (RenderObject::Mesh(ma), RenderObject::Mesh(mb)) => {
                let da = ma.world_bounds.center().distance_squared(eye);
                let db = mb.world_bounds.center().distance_squared(eye);
                db.partial_cmp(&da).unwrap_or(std::cmp::Ordering::Equal)
            }
            _ => std::cmp::Ordering::Equal,
        })
    });
}

/// One camera/shadow/light view: owns the GPU resources it acquires from a
/// [`Renderer`] for one frame's worth of work, plus its own occlusion
/// buffer.
pub struct RenderView {
    kind: ViewKind,
    render_kind: RenderKind,
    width: u32,
    height: u32,
    samples: u32,
    view: Mat4,
    projection: Mat4,
    view_projection: Mat4,
    eye: Vec3,
    frustum: Frustum,
    /// Fences of views this one depends on (e.g. a shadow view feeding the
    /// camera view's moment map read), waited on at the start of `render`.
    input_views: Vec<FenceId>,
    fence: Option<Fence>,
    render_target: Option<u32>,
    scratch_pool: Option<u32>,
    visibility_pool: Option<u32>,
    scene_constant_buffer: Option<u32>,
    object_constant_buffer: Option<u32>,
    visibility: ViewVisibility,
}

impl RenderView {
    /// Builds an uninitialized view. Call [`RenderView::init`] before
    /// scheduling [`RenderView::extract`]/[`RenderView::render`].
    #[must_use]
    pub fn new(
        kind: ViewKind,
        render_kind: RenderKind,
        width: u32,
        height: u32,
        samples: u32,
        view: Mat4,
        projection: Mat4,
        eye: Vec3,
    ) -> Self {
        let view_projection = projection.mul(&view);
        Self {
            kind,
            render_kind,
            width,
            height,
            samples,
            view,
            projection,
            view_projection,
            eye,
            frustum: Frustum::from_view_projection(&view_projection),
            input_views: Vec::new(),
            fence: None,
            render_target: None,
            scratch_pool: None,
            visibility_pool: None,
            scene_constant_buffer: None,
            object_constant_buffer: None,
            visibility: ViewVisibility::new(),
        }
    }

    /// Records that this view's `render` must wait on `fence` before its
    /// command buffer is considered safe to submit (e.g. a shadow view
    /// feeding the camera view's moment map).
    pub fn add_input_view(&mut self, fence: FenceId) {
        self.input_views.push(fence);
    }

    fn target_config(&self) -> RenderTargetConfig {
        let purpose = match (self.kind, self.render_kind) {
            (ViewKind::Shadow, _) => RenderTargetPurpose::MomentShadowMap,
            (_, RenderKind::DepthOnly) => RenderTargetPurpose::DepthPrepass,
            (_, RenderKind::Deferred) => RenderTargetPurpose::DeferredGBuffer,
            (_, RenderKind::Forward) => RenderTargetPurpose::ForwardLinearZ,
        };
        let attachments = match purpose {
            RenderTargetPurpose::MomentShadowMap => vec![AttachmentFormat::R32F],
            RenderTargetPurpose::DepthPrepass => vec![AttachmentFormat::Depth32F],
            RenderTargetPurpose::DeferredGBuffer => {
                vec![AttachmentFormat::Rgba8, AttachmentFormat::Rgba8, AttachmentFormat::Depth32F]
            }
            RenderTargetPurpose::ForwardLinearZ => {
                vec![AttachmentFormat::Rgba8, AttachmentFormat::R32F, AttachmentFormat::Depth32F]
            }
        };
        RenderTargetConfig {
            purpose,
            samples: self.samples,
            width: self.width,
            height: self.height,
            attachments,
        }
    }

    /// Acquires this frame's fence, render target, and scratch/visibility
    /// memory pools from `renderer`. Must be called once per frame before
    /// [`RenderView::extract`].
    pub fn init(&mut self, renderer: &Renderer, config: &RendererConfig, label: &'static str) {
        let fence = renderer.query_fence(label);
        self.render_target = Some(renderer.query_render_target(&self.target_config(), &fence));
        self.scratch_pool = Some(renderer.query_memory_pool(config.scratch_pool_bytes, &fence));
        self.visibility_pool = Some(renderer.query_memory_pool(config.visibility_pool_bytes, &fence));
        self.fence = Some(fence);
        self.visibility.clear();
    }

    /// Schedules the extraction job: walks `scene`'s meshes and (for
    /// camera views) lights, frustum-culling everything except
    /// `Visibility`-marked meshes, which are instead rasterized as
    /// occluders and deferred to an occlusion query at render time.
    ///
    /// The view's occlusion buffer is moved into the job and handed back
    /// in the result; pass it to [`RenderView::finish_extraction`] once the
    /// job completes to restore it and get the final object list.
    pub fn extract(&mut self, scene: &Scene, pool: &WorkerPool) -> Job<ExtractionOutput> {
        let entities = Arc::clone(&scene.entities);
        let ids = scene.ids;
        let wants_lights = self.kind.wants_lights();
        let frustum = self.frustum;
        let view_projection = self.view_projection;
        let mut visibility = std::mem::take(&mut self.visibility);
        pool.schedule(move || {
            visibility.clear();
            let mut objects = Vec::new();

            let mesh_map = ComponentTypeMap::empty().with(ids.transform).with(ids.mesh);
            let mesh_query = EntityQuery::new().all_of(mesh_map);
            for (_, cached) in entities.query_prototypes(&mesh_query) {
                let prototype = cached.prototype();
                let component_map = prototype.component_map();
                let has_visibility = component_map.contains(ids.visibility);
                let has_material = component_map.contains(ids.material);
                for chunk in cached.chunks() {
                    let transforms = chunk.component_slice::<Transform>(prototype, ids.transform);
                    let meshes = chunk.component_slice::<Mesh>(prototype, ids.mesh);
                    let materials = has_material.then(|| chunk.component_slice::<Material>(prototype, ids.material));
                    for row in 0..chunk.len() {
                        let transform = transforms[row];
                        let mesh = meshes[row];
                        let world_bounds = mesh.local_bounds.transformed(&transform.model);
                        let material = materials.map_or_else(Material::default, |m| m[row]);
                        let occlusion_managed = has_visibility && wants_lights;

                        let render_mesh = RenderMesh {
                            entity: chunk.entity_id_at(row),
                            world_bounds,
                            model: transform.model,
                            normal: transform.model,
                            texture: Mat4::IDENTITY,
                            material,
                            submeshes: mesh.submeshes,
                            submesh_count: mesh.submesh_count,
                            occlusion_managed,
                        };

                        if occlusion_managed {
                            for triangle in world_bounds.triangles() {
                                visibility.rasterize_occluder(&view_projection, triangle);
                            }
                            objects.push(RenderObject::Mesh(render_mesh));
                        } else if frustum.intersects_aabb(&world_bounds) {
                            for triangle in world_bounds.triangles() {
                                visibility.rasterize_occluder(&view_projection, triangle);
                            }
                            objects.push(RenderObject::Mesh(render_mesh));
                        }
                    }
                }
            }

            if wants_lights {
                let light_map = ComponentTypeMap::empty().with(ids.transform).with(ids.light);
                let light_query = EntityQuery::new().all_of(light_map);
                for (_, cached) in entities.query_prototypes(&light_query) {
                    let prototype = cached.prototype();
                    for chunk in cached.chunks() {
                        let transforms = chunk.component_slice::<Transform>(prototype, ids.transform);
                        let lights = chunk.component_slice::<Light>(prototype, ids.light);
                        for row in 0..chunk.len() {
                            let transform = transforms[row];
                            let origin = transform.model.transform_point(Vec3::ZERO);
                            let record = match lights[row] {
                                Light::Sphere { color, radius } => LightRecord::sphere(origin, color, radius),
                                Light::Line { p2, color, radius } => {
                                    let p2_world = transform.model.transform_point(p2);
                                    LightRecord::line(origin, p2_world, color, radius)
                                }
                            };
                            objects.push(RenderObject::Light(record));
                        }
                    }
                }
            }

            ExtractionOutput { objects, visibility }
        })
    }

    /// Restores the view's occlusion buffer from a completed extraction
    /// job and returns its collected objects.
    pub fn finish_extraction(&mut self, output: ExtractionOutput) -> Vec<RenderObject> {
        self.visibility = output.visibility;
        output.objects
    }

    /// Schedules the record job: sorts `objects`, runs an occlusion query
    /// against each mesh, writes per-object/scene constants into the
    /// scratch pool, and records a [`CommandBuffer`] against `renderer`'s
    /// cached program/target/buffer ids.
    ///
    /// # Panics
    ///
    /// Panics if [`RenderView::init`] wasn't called first, or if recording
    /// overflows an operand field — both indicate a programmer error in
    /// this view's setup rather than a recoverable condition.
    pub fn render(
        &mut self,
        renderer: Arc<Renderer>,
        config: RendererConfig,
        mut objects: Vec<RenderObject>,
        pool: &WorkerPool,
    ) -> Job<CommandBuffer> {
        let fence = self.fence.clone().expect("RenderView::init must run before render");
        let render_target = self.render_target.expect("RenderView::init must run before render");
        let scratch_pool = self.scratch_pool.expect("RenderView::init must run before render");
        let kind = self.kind;
        let render_kind = self.render_kind;
        let eye = self.eye;
        let view = self.view;
        let projection = self.projection;
        let view_projection = self.view_projection;
        let input_views = self.input_views.clone();
        let visibility = std::mem::take(&mut self.visibility);
        let object_constant_buffer = &mut self.object_constant_buffer;
        let scene_constant_buffer = &mut self.scene_constant_buffer;

        sort_objects(&mut objects, eye);

        let object_count = objects.iter().filter(|o| matches!(o, RenderObject::Mesh(_))).count();
        let object_cb = renderer.query_constant_buffer(object_count.max(1) * config.object_stride(), &fence);
        let scene_cb = renderer.query_constant_buffer(std::mem::size_of::<SceneConstants>(), &fence);
        *object_constant_buffer = Some(object_cb);
        *scene_constant_buffer = Some(scene_cb);

        pool.schedule(move || {
            let mut command = CommandBuffer::new();
            let framebuffer = renderer.render_target_framebuffer(render_target);
            command.begin_render_pass(framebuffer).expect("render_target id overflow");

            let lights: Vec<LightRecord> = objects
                .iter()
                .filter_map(|o| match o {
                    RenderObject::Light(l) => Some(*l),
                    RenderObject::Mesh(_) => None,
                })
                .collect();
            let packed = pack_lights(&lights);
            let scene_constants = SceneConstants::new(view.cols, projection.cols, view_projection.cols, packed);
            let (scene_buffer, _) = renderer.constant_buffer_info(scene_cb);
            let scene_handle = renderer
                .with_memory_pool(scratch_pool, |p| p.alloc::<SceneConstants>(1))
                .expect("scratch pool exhausted staging scene constants");
            renderer.with_memory_pool(scratch_pool, |p| *p.ptr_mut::<SceneConstants>(scene_handle) = scene_constants);
            command
                .buffer_upload(scene_buffer, scene_handle, scene_handle.offset(), scene_handle.len())
                .expect("scene constant upload overflowed an operand field");

            let program = renderer.query_program(program_name(kind, render_kind));
            command.use_program(program).expect("program id overflow");

            let (object_buffer, _) = renderer.constant_buffer_info(object_cb);
            let mut written = 0u32;
            let mut current_subpass = None;
            let mut bound_texture = None;

            for object in &objects {
                let RenderObject::Mesh(mesh) = object else {
                    continue;
                };
                if mesh.occlusion_managed {
                    let result = visibility.query(&view_projection, &mesh.world_bounds);
                    if !result.visible {
                        continue;
                    }
                }

                let block = written / config.objects_per_block;
                if current_subpass != Some(block) {
                    command.begin_subpass(block).expect("subpass id overflow");
                    current_subpass = Some(block);
                }
                if bound_texture != Some(mesh.material.diffuse_texture) {
                    let _sampler = renderer.query_sampler("diffuse");
                    command
                        .push_uniform_sampler(DIFFUSE_SAMPLER_LOCATION, mesh.material.diffuse_texture)
                        .expect("sampler location overflow");
                    bound_texture = Some(mesh.material.diffuse_texture);
                }

                let object_constants = object_constants_for(mesh);
                let handle = renderer
                    .with_memory_pool(scratch_pool, |p| p.alloc::<ObjectConstants>(1))
                    .expect("scratch pool exhausted staging object constants");
                renderer.with_memory_pool(scratch_pool, |p| *p.ptr_mut::<ObjectConstants>(handle) = object_constants);
                command
                    .buffer_upload(object_buffer, handle, handle.offset(), handle.len())
                    .expect("object constant upload overflowed an operand field");
                command
                    .push_uniform_matrix4x4(OBJECT_CONSTANTS_LOCATION, handle.offset())
                    .expect("per-draw uniform offset overflow");

                for submesh in mesh.submeshes() {
                    record_submesh_draw(&mut command, submesh);
                }
                written += 1;
            }

            if kind == ViewKind::Shadow {
                let moment_texture = renderer.render_target_attachment(render_target, 0);
                command
                    .generate_mipmaps(moment_texture, config.shadow_mip_levels)
                    .expect("moment map texture id overflow");
            }

            for input_fence in &input_views {
                command.fence_wait(*input_fence).expect("fence id overflow");
            }
            command.fence_sync(fence.id()).expect("fence id overflow");
            command.end().expect("command buffer already ended");
            command
        })
    }

    /// Releases this frame's acquired resources once the GPU has finished
    /// (or will finish, once `FenceSync` has been executed) consuming
    /// them, readying the view for next frame's `init`.
    pub fn release(&mut self, renderer: &Renderer) {
        if let Some(fence) = self.fence.take() {
            renderer.done_fence(fence.id());
        }
        if let Some(id) = self.render_target.take() {
            renderer.release_render_target(id);
        }
        if let Some(id) = self.scratch_pool.take() {
            renderer.release_memory_pool(id);
        }
        if let Some(id) = self.visibility_pool.take() {
            renderer.release_memory_pool(id);
        }
        if let Some(id) = self.scene_constant_buffer.take() {
            renderer.release_constant_buffer(id);
        }
        if let Some(id) = self.object_constant_buffer.take() {
            renderer.release_constant_buffer(id);
        }
    }
}

fn program_name(kind: ViewKind, render_kind: RenderKind) -> &'static str {
    match (kind, render_kind) {
        (ViewKind::Shadow, _) => "shadow_moment",
        (_, RenderKind::DepthOnly) => "depth_only",
        (_, RenderKind::Deferred) => "deferred_gbuffer",
        (_, RenderKind::Forward) => "forward_opaque",
    }
}

fn object_constants_for(mesh: &RenderMesh) -> ObjectConstants {
    ObjectConstants {
        model: mesh.model.cols,
        normal: mesh.normal.cols,
        texture: mesh.texture.cols,
        diff_color: mesh.material.diffuse_color,
        ior: [mesh.material.ior, 0.0, 0.0, 0.0],
        materialid_metalness_roughness_0: [
            mesh.material.material_id as f32,
            mesh.material.metalness,
            mesh.material.roughness,
            0.0,
        ],
        pad_: [0.0; 4],
    }
}

fn record_submesh_draw(command: &mut CommandBuffer, submesh: &Submesh) {
    if submesh.index_count > 0 {
        command
            .draw_indexed(submesh.vertex_array, Primitive::Triangles, submesh.index_count, submesh.index_offset)
            .expect("submesh draw_indexed operand overflow");
    } else {
        command
            .draw(submesh.vertex_array, Primitive::Triangles, 0)
            .expect("submesh draw operand overflow");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use render_core::ecs::EntityStore;
    use render_gpu::RecordingSink;

    fn make_scene() -> (Scene, SceneComponentIds) {
        let mut store = EntityStore::new(1);
        let ids = SceneComponentIds::register(&mut store).unwrap();
        (Scene::new(Arc::new(store), ids), ids)
    }

    fn camera_view() -> RenderView {
        let eye = Vec3::new(0.0, 0.0, 10.0);
        let view = Mat4::look_at(eye, Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        let projection = Mat4::perspective(std::f32::consts::FRAC_PI_2, 16.0 / 9.0, 0.1, 1000.0);
        RenderView::new(ViewKind::Camera, RenderKind::Forward, 1920, 1080, 1, view, projection, eye)
    }

    #[test]
    fn extraction_over_an_empty_scene_returns_no_objects() {
        let (scene, _ids) = make_scene();
        let renderer = Renderer::new();
        let config = RendererConfig::default();
        let pool = WorkerPool::new(2);
        let mut view = camera_view();
        view.init(&renderer, &config, "test");
        let job = view.extract(&scene, &pool);
        let output = pool.wait(job);
        let objects = view.finish_extraction(output);
        assert!(objects.is_empty());
    }

    #[test]
    fn frustum_culled_mesh_produces_no_draw_commands() {
        let mut store = EntityStore::new(2);
        let ids = SceneComponentIds::register(&mut store).unwrap();
        let proto = store.ensure_prototype(&[ids.transform, ids.mesh]).unwrap();
        let entity = store.spawn(proto);
        let prototype = store.prototype(proto).prototype().clone();
        {
            let chunk = &mut store.prototype_mut(proto).chunks_mut()[0];
            chunk.component_slice_mut::<Transform>(&prototype, ids.transform)[0] =
                Transform::from_translation(Vec3::new(10_000.0, 0.0, 0.0));
            chunk.component_slice_mut::<Mesh>(&prototype, ids.mesh)[0] =
                Mesh::single(Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)), 1, 36);
        }
        let _ = entity;

        let scene = Scene::new(Arc::new(store), ids);
        let renderer = Arc::new(Renderer::new());
        let config = RendererConfig::default();
        let pool = WorkerPool::new(2);
        let mut view = camera_view();
        view.init(&renderer, &config, "test");
        let extract_job = view.extract(&scene, &pool);
        let objects = view.finish_extraction(pool.wait(extract_job));
        assert!(objects.is_empty(), "mesh far outside the frustum must be culled before render");

        let render_job = view.render(Arc::clone(&renderer), config, objects, &pool);
        let command = pool.wait(render_job);
        let buffer = render_core::memory::MemoryPool::new(0);
        let mut sink = RecordingSink::new(None);
        command.execute(&mut sink, &buffer);
        assert!(!sink.calls.iter().any(|c| c.starts_with("draw")));
    }

    #[test]
    fn subpass_count_matches_objects_per_block() {
        let config = RendererConfig { objects_per_block: 4, ..RendererConfig::default() };
        let n = 10u32;
        let expected = (n + config.objects_per_block - 1) / config.objects_per_block;
        assert_eq!(expected, 3);
    }
}
