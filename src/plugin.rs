use bevy::{
    asset::RenderAssetUsages,
    mesh::{Indices, PrimitiveTopology},
    prelude::*,
    tasks::{AsyncComputeTaskPool, Task, block_on, futures_lite::future},
};

use crate::{
    contour::GeneratedContour,
    field::{ScalarField, generate_field_lines},
};

/// System sets for the marching squares pipeline, run in this order each frame.
///
/// Use these to order your own systems relative to contour generation:
///
/// ```rust,ignore
/// // Run after segments are ready but before they're uploaded, e.g. to build 2D colliders:
/// app.add_systems(Update, build_outline.after(MarchingSquaresSet::Generate)
///                                      .before(MarchingSquaresSet::Upload));
/// ```
///
/// ```text
/// Queue  →  Spawn  →  [async compute]  →  Generate  →  [your systems]  →  Upload
/// ```
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarchingSquaresSet {
    /// Queues every added or changed field and discards its stale contour.
    Queue,
    /// Spawns an async compute task for each queued field.
    Spawn,
    /// Polls async tasks and inserts [`GeneratedContour`] on completion.
    Generate,
    /// Uploads [`GeneratedContour`] buffers into a line-list [`Mesh3d`].
    Upload,
}

/// Marker component added to [`ScalarField`] entities whose contour is out of date.
///
/// Removed once the contour for the current samples has been uploaded.
#[derive(Component)]
pub struct QueuedField;

/// Holds the in-flight async compute task for a [`ScalarField`].
#[derive(Component)]
pub struct ComputeTask(Task<GeneratedContour>);

/// Runtime configuration for the marching squares pipeline.
///
/// Inserted as a resource by [`MarchingSquaresPlugin`]. Modify it at any time to change behaviour:
///
/// ```rust,ignore
/// app.add_plugins(MarchingSquaresPlugin { max_tasks_per_frame: 8 });
///
/// fn my_system(mut config: ResMut<MarchingSquaresConfig>) {
///     config.max_tasks_per_frame = 1;
/// }
/// ```
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct MarchingSquaresConfig {
    /// Maximum number of async contour tasks spawned per frame. Default: `4`.
    pub max_tasks_per_frame: usize,
}

impl Default for MarchingSquaresConfig {
    fn default() -> Self {
        Self {
            max_tasks_per_frame: 4,
        }
    }
}

/// Bevy plugin that drives marching squares contour generation.
///
/// When the `auto_queue` feature is enabled, any [`ScalarField`] added to the world,
/// replaced or mutated is (re)processed on Bevy's `AsyncComputeTaskPool`:
///
/// ```text
/// ScalarField added or changed
///   → QueuedField inserted,
///     stale ComputeTask / GeneratedContour removed   (MarchingSquaresSet::Queue)
///   → ComputeTask spawned           (MarchingSquaresSet::Spawn)
///   → [async compute runs]
///   → GeneratedContour inserted     (MarchingSquaresSet::Generate)
///   → [your systems here]
///   → Mesh3d inserted               (MarchingSquaresSet::Upload)
///   → QueuedField removed
/// ```
///
/// The crate never creates cameras, windows or materials; drawing the line mesh is up to the app.
pub struct MarchingSquaresPlugin {
    /// Initial value for [`MarchingSquaresConfig::max_tasks_per_frame`].
    pub max_tasks_per_frame: usize,
}

impl Default for MarchingSquaresPlugin {
    fn default() -> Self {
        Self {
            max_tasks_per_frame: MarchingSquaresConfig::default().max_tasks_per_frame,
        }
    }
}

impl Plugin for MarchingSquaresPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(MarchingSquaresConfig {
            max_tasks_per_frame: self.max_tasks_per_frame,
        });

        #[cfg(feature = "auto_queue")]
        app.configure_sets(
            Update,
            (
                MarchingSquaresSet::Queue,
                MarchingSquaresSet::Spawn,
                MarchingSquaresSet::Generate,
                MarchingSquaresSet::Upload,
            )
                .chain(),
        )
        .add_systems(
            Update,
            (
                queue_changed_fields.in_set(MarchingSquaresSet::Queue),
                spawn_contour_tasks.in_set(MarchingSquaresSet::Spawn),
                poll_contour_tasks.in_set(MarchingSquaresSet::Generate),
                upload_contour.in_set(MarchingSquaresSet::Upload),
            ),
        );
    }
}

/// Queues every [`ScalarField`] that was added, replaced or mutated since the last run.
///
/// An in-flight task for the old samples is dropped, which cancels it, and the old
/// [`GeneratedContour`] is removed so the field is picked up again by the spawn step.
fn queue_changed_fields(mut commands: Commands, query: Query<Entity, Changed<ScalarField>>) {
    for entity in query.iter() {
        commands
            .entity(entity)
            .insert(QueuedField)
            .remove::<(ComputeTask, GeneratedContour)>();
    }
}

/// Spawns async compute tasks for [`QueuedField`]s, up to [`MarchingSquaresConfig::max_tasks_per_frame`] per frame.
fn spawn_contour_tasks(
    mut commands: Commands,
    config: Res<MarchingSquaresConfig>,
    query: Query<
        (Entity, &ScalarField),
        (With<QueuedField>, Without<ComputeTask>, Without<GeneratedContour>),
    >,
) {
    let task_pool = AsyncComputeTaskPool::get();

    for (entity, field) in query.iter().take(config.max_tasks_per_frame) {
        // Cloning the field only bumps the Arc around its samples.
        let field = field.clone();
        tracing::trace!(?entity, width = field.width(), height = field.height(), "spawn contour task");

        let task =
            task_pool.spawn(async move { GeneratedContour::build(generate_field_lines(&field)) });

        commands.entity(entity).insert(ComputeTask(task));
    }
}

/// Polls in-flight [`ComputeTask`]s each frame and inserts [`GeneratedContour`] on completion.
///
/// Non-blocking: tasks that haven't finished are skipped and retried next frame.
fn poll_contour_tasks(mut commands: Commands, mut query: Query<(Entity, &mut ComputeTask)>) {
    for (entity, mut compute_task) in query.iter_mut() {
        if let Some(contour) = block_on(future::poll_once(&mut compute_task.0)) {
            commands
                .entity(entity)
                .insert(contour)
                .remove::<ComputeTask>();
        }
    }
}

/// Uploads a [`GeneratedContour`] into a line-list [`Mesh3d`], then removes [`QueuedField`].
///
/// The [`GeneratedContour`] stays on the entity so segment data remains readable until
/// the field changes again. Re-uploads replace the previous [`Mesh3d`] handle.
fn upload_contour(
    mut commands: Commands,
    query: Query<(Entity, &GeneratedContour), With<QueuedField>>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    for (entity, generated) in query.iter() {
        tracing::debug!(?entity, segments = generated.segment_count(), "upload contour");

        commands
            .entity(entity)
            .insert(Mesh3d(meshes.add(contour_mesh(generated))))
            .remove::<QueuedField>();
    }
}

/// Builds a [`PrimitiveTopology::LineList`] mesh from contour buffers.
pub fn contour_mesh(generated: &GeneratedContour) -> Mesh {
    let mut mesh = Mesh::new(
        PrimitiveTopology::LineList,
        RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, generated.positions.clone());
    mesh.insert_indices(Indices::U32(generated.indices.clone()));
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    #[test]
    fn test_contour_mesh_is_line_list() {
        let generated =
            GeneratedContour::build(vec![[Point::new(0.5, 0.0), Point::new(0.0, 0.5)]]);
        let mesh = contour_mesh(&generated);

        assert_eq!(mesh.primitive_topology(), PrimitiveTopology::LineList);
        assert_eq!(mesh.count_vertices(), 2);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(2));
    }

    #[test]
    fn test_plugin_inserts_config() {
        let mut app = App::new();
        app.add_plugins(MarchingSquaresPlugin {
            max_tasks_per_frame: 7,
        });
        assert_eq!(
            app.world().resource::<MarchingSquaresConfig>(),
            &MarchingSquaresConfig {
                max_tasks_per_frame: 7
            }
        );
    }

    #[cfg(feature = "auto_queue")]
    mod pipeline {
        use std::time::Duration;

        use bevy::app::TaskPoolPlugin;

        use super::*;

        #[rustfmt::skip]
        const BLOCK_4X4: [u8; 16] = [
            0,  0,  0, 0,
            0, 15, 15, 0,
            0, 15, 15, 0,
            0,  0,  0, 0,
        ];

        fn test_app() -> App {
            let mut app = App::new();
            app.add_plugins((TaskPoolPlugin::default(), MarchingSquaresPlugin::default()))
                .init_resource::<Assets<Mesh>>();
            app
        }

        fn block_field() -> ScalarField {
            ScalarField::from_samples(4, 4, &BLOCK_4X4).unwrap()
        }

        /// Updates the app until `entity`'s current contour is uploaded, returning its segment count.
        fn run_until_uploaded(app: &mut App, entity: Entity) -> usize {
            for _ in 0..1000 {
                app.update();
                let e = app.world().entity(entity);
                if !e.contains::<QueuedField>() && e.contains::<Mesh3d>() {
                    if let Some(contour) = e.get::<GeneratedContour>() {
                        return contour.segment_count();
                    }
                }
                std::thread::sleep(Duration::from_millis(1));
            }
            panic!("contour for {entity:?} was never uploaded");
        }

        fn uploaded_vertex_count(app: &App, entity: Entity) -> usize {
            let handle = &app.world().entity(entity).get::<Mesh3d>().unwrap().0;
            app.world()
                .resource::<Assets<Mesh>>()
                .get(handle)
                .unwrap()
                .count_vertices()
        }

        #[test]
        fn test_spawned_field_is_contoured_and_uploaded() {
            let mut app = test_app();
            let entity = app.world_mut().spawn(block_field()).id();

            assert_eq!(run_until_uploaded(&mut app, entity), 8);
            assert!(!app.world().entity(entity).contains::<ComputeTask>());
            assert_eq!(uploaded_vertex_count(&app, entity), 16);
        }

        #[test]
        fn test_mutated_field_is_contoured_again() {
            let mut app = test_app();
            let entity = app.world_mut().spawn(block_field()).id();
            assert_eq!(run_until_uploaded(&mut app, entity), 8);

            app.world_mut()
                .get_mut::<ScalarField>(entity)
                .unwrap()
                .for_each_sample(|_, _, v| *v = 0.);
            assert_eq!(run_until_uploaded(&mut app, entity), 0);
            assert_eq!(uploaded_vertex_count(&app, entity), 0);
        }

        #[test]
        fn test_replaced_field_is_contoured_again() {
            let mut app = test_app();
            let uniform = ScalarField::from_samples(3, 3, &[15; 9]).unwrap();
            let entity = app.world_mut().spawn(uniform).id();
            assert_eq!(run_until_uploaded(&mut app, entity), 0);

            app.world_mut().entity_mut(entity).insert(block_field());
            assert_eq!(run_until_uploaded(&mut app, entity), 8);
            assert_eq!(uploaded_vertex_count(&app, entity), 16);
        }

        #[test]
        fn test_unchanged_field_is_not_requeued() {
            let mut app = test_app();
            let entity = app.world_mut().spawn(block_field()).id();
            run_until_uploaded(&mut app, entity);

            app.update();
            app.update();
            let e = app.world().entity(entity);
            assert!(!e.contains::<QueuedField>());
            assert!(!e.contains::<ComputeTask>());
            assert_eq!(e.get::<GeneratedContour>().map(|c| c.segment_count()), Some(8));
        }
    }
}
