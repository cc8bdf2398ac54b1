use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};
use penumbra_core::scene::{SceneGraph, Transform};
use penumbra_core::shape::{Operation, Shape, ShapeKind};
use penumbra_core::view::LightSource;

/// A named demo scene: geometry, camera placement and light.
pub struct SceneConfig {
    pub name: &'static str,
    pub camera_position: [f32; 3],
    pub camera_target: [f32; 3],
    pub light: Option<LightSource>,
    build: fn() -> SceneGraph,
}

impl SceneConfig {
    pub fn build(&self) -> SceneGraph {
        (self.build)()
    }
}

pub fn standard_scenes() -> Vec<SceneConfig> {
    vec![
        SceneConfig {
            name: "csg-demo",
            camera_position: [0.0, 2.0, 6.0],
            camera_target: [0.0, 0.0, 0.0],
            light: Some(LightSource::Directional {
                forward: Vec3::new(-0.4, -1.0, -0.3).normalize(),
            }),
            build: csg_demo,
        },
        SceneConfig {
            name: "grid",
            camera_position: [0.0, 12.0, 14.0],
            camera_target: [0.0, 0.0, 0.0],
            light: Some(LightSource::Positional {
                position: Vec3::new(0.0, 8.0, 0.0),
            }),
            build: grid,
        },
        SceneConfig {
            name: "empty",
            camera_position: [0.0, 0.0, 5.0],
            camera_target: [0.0, 0.0, 0.0],
            light: Some(LightSource::Directional { forward: Vec3::NEG_Y }),
            build: SceneGraph::new,
        },
    ]
}

pub fn find_scene(name: &str) -> Option<SceneConfig> {
    standard_scenes().into_iter().find(|s| s.name == name)
}

/// Blended sphere with a cube cut out of it, a torus mask and a free-standing cube.
fn csg_demo() -> SceneGraph {
    let mut scene = SceneGraph::new();

    let sphere = scene.spawn_shape(
        "sphere",
        Transform::from_translation(Vec3::new(0.0, 1.0, 0.0)).with_scale(Vec3::splat(1.5)),
        Shape::new(ShapeKind::Sphere, Operation::Blend)
            .with_colour([0.9, 0.3, 0.2])
            .with_blend_strength(0.5),
    );
    // Children hang off the sphere; the flattener groups them with it.
    // The ring stands upright around the sphere's lower half.
    for (name, kind, operation, offset, rotation) in [
        ("cutter", ShapeKind::Cube, Operation::Cut, Vec3::new(0.5, 0.5, 0.5), Quat::IDENTITY),
        (
            "ring",
            ShapeKind::Torus,
            Operation::Mask,
            Vec3::new(0.0, -0.5, 0.0),
            Quat::from_rotation_x(FRAC_PI_2),
        ),
    ] {
        let spawned = scene.spawn_child_shape(
            sphere,
            name,
            Transform::from_translation(offset).with_rotation(rotation),
            Shape::new(kind, operation).with_colour([0.2, 0.6, 0.9]),
        );
        if let Err(err) = spawned {
            log::warn!("csg-demo: {err}");
        }
    }

    scene.spawn_shape(
        "plinth",
        Transform::from_translation(Vec3::new(2.5, 0.0, 0.0)),
        Shape::new(ShapeKind::Cube, Operation::None).with_colour([0.8, 0.8, 0.8]),
    );
    scene
}

/// 8x8 field of alternating spheres and tori, all top-level.
fn grid() -> SceneGraph {
    let mut scene = SceneGraph::new();
    for z in 0..8 {
        for x in 0..8 {
            let kind = if (x + z) % 2 == 0 {
                ShapeKind::Sphere
            } else {
                ShapeKind::Torus
            };
            let position = Vec3::new(x as f32 * 1.5 - 5.25, 0.0, z as f32 * 1.5 - 5.25);
            scene.spawn_shape(
                format!("cell-{x}-{z}"),
                Transform::from_translation(position).with_scale(Vec3::splat(0.5)),
                Shape::new(kind, Operation::Blend).with_colour([x as f32 / 7.0, 0.5, z as f32 / 7.0]),
            );
        }
    }
    scene
}

#[cfg(test)]
mod tests {
    use super::*;
    use penumbra_core::flatten::flatten_scene;

    #[test]
    fn test_scene_names_unique() {
        let scenes = standard_scenes();
        for (i, a) in scenes.iter().enumerate() {
            for b in &scenes[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn test_find_scene() {
        assert!(find_scene("grid").is_some());
        assert!(find_scene("nope").is_none());
    }

    #[test]
    fn test_csg_demo_flattens_grouped() {
        let scene = find_scene("csg-demo").expect("scene").build();
        let flat = flatten_scene(&scene);
        // plinth (None) first, then sphere (Blend) followed by its two children.
        assert_eq!(flat.len(), 4);
        assert_eq!(flat[0].kind, ShapeKind::Cube);
        assert_eq!(flat[1].kind, ShapeKind::Sphere);
        assert_eq!(flat[1].child_count, 2);
        assert_eq!(flat[2].operation, Operation::Cut);
        assert_eq!(flat[3].operation, Operation::Mask);
    }

    #[test]
    fn test_csg_demo_ring_stands_upright() {
        let scene = find_scene("csg-demo").expect("scene").build();
        let ring = scene.find("ring").expect("ring exists");
        let transform = scene.transform(ring).expect("ring exists");
        // Torus axis turned from +Y onto +Z.
        let axis = transform.rotation * Vec3::Y;
        assert!((axis - Vec3::Z).length() < 1e-5, "got {axis}");
        let cutter = scene.find("cutter").expect("cutter exists");
        assert_eq!(scene.transform(cutter).map(|t| t.rotation), Ok(Quat::IDENTITY));
    }

    #[test]
    fn test_grid_has_sixty_four_shapes() {
        let scene = find_scene("grid").expect("scene").build();
        assert_eq!(flatten_scene(&scene).len(), 64);
    }

    #[test]
    fn test_empty_scene() {
        let scene = find_scene("empty").expect("scene").build();
        assert!(flatten_scene(&scene).is_empty());
    }
}
