use super::camera::Camera;
use super::core::{raycast, Light, LightKind, RaycastResult, Scene, EPSILON};
use super::{Ray, Vec3};

/// Counters collected while tracing, used for the render summary and in tests.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct TraceStats {
    /// every ray cast into the scene: primary, shadow and reflection rays
    pub rays: u64,
    /// deepest reflection bounce reached, 0 when no reflection ray was spawned
    pub deepest_bounce: u32,
}

impl TraceStats {
    pub fn merge(&mut self, other: TraceStats) {
        self.rays += other.rays;
        self.deepest_bounce = self.deepest_bounce.max(other.deepest_bounce);
    }
}

/// Phong terms produced by a single light at a single surface point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightContribution {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    /// false when the shadow ray found an occluder before the light
    pub lit: bool,
}

/// Traces `ray` into the scene and returns its (unclamped) color.
///
/// `depth` is the number of reflection bounces still allowed: 0 shades the hit
/// locally without spawning any reflection ray. Rays that miss every object
/// return `background`.
pub fn trace(
    scene: &Scene,
    camera: &Camera,
    ray: &Ray,
    depth: u32,
    background: Vec3,
    stats: &mut TraceStats,
) -> Vec3 {
    trace_bounce(scene, camera, ray, depth, background, 0, stats)
}

fn trace_bounce(
    scene: &Scene,
    camera: &Camera,
    ray: &Ray,
    depth: u32,
    background: Vec3,
    bounce: u32,
    stats: &mut TraceStats,
) -> Vec3 {
    stats.rays += 1;
    stats.deepest_bounce = stats.deepest_bounce.max(bounce);

    let Some(hit) = raycast(scene, ray) else {
        return background;
    };
    // nothing illuminates the surface
    if scene.lights.is_empty() {
        return Vec3::zero();
    }

    let material = hit.hitted_object.material;
    let mut ambient = Vec3::zero();
    let mut color = Vec3::zero();
    for light in &scene.lights {
        let contribution = shade(scene, camera, &hit, light, stats);
        ambient += contribution.ambient;
        color += contribution.diffuse + contribution.specular;

        // every light that reaches the point spawns its own mirror ray
        if contribution.lit && depth > 0 {
            let reflected = Ray::towards(
                hit.hit_point + hit.normal * EPSILON,
                hit.incoming_ray.direction.reflect(hit.normal),
            );
            let mirrored =
                trace_bounce(scene, camera, &reflected, depth - 1, background, bounce + 1, stats);
            color += mirrored * material.reflectivity();
        }
    }

    // ambient is averaged over the lights, the other terms are summed
    color + ambient / scene.lights.len() as f64
}

/// Evaluates the Phong model of `light` at the hit point, casting a shadow ray to
/// decide whether the diffuse and specular terms apply.
pub fn shade(
    scene: &Scene,
    camera: &Camera,
    hit: &RaycastResult,
    light: &Light,
    stats: &mut TraceStats,
) -> LightContribution {
    let point = hit.hit_point;
    let normal = hit.normal;
    let material = &hit.hitted_object.material;

    let (to_light, light_distance) = match light.kind {
        LightKind::Point { position } => ((position - point).normalize(), Some(point.distance(position))),
        LightKind::Directional { direction } => (-direction, None),
    };

    let shadow_ray = Ray::new(point + normal * EPSILON, to_light);
    stats.rays += 1;
    let occluded = match raycast(scene, &shadow_ray) {
        None => false,
        // an object behind a point light does not cast a shadow
        Some(blocker) => light_distance.map_or(true, |distance| blocker.t <= distance),
    };

    let attenuation = light.attenuation(light_distance.unwrap_or(0.0));
    let ambient = material.ambient * light.ambient * attenuation;
    if occluded {
        return LightContribution {
            ambient,
            diffuse: Vec3::zero(),
            specular: Vec3::zero(),
            lit: false,
        };
    }

    let diffuse_factor = normal.dot(to_light).max(0.0);
    let diffuse = material.diffuse * light.diffuse * (diffuse_factor * attenuation);

    // point lights mirror the vector towards the light, directional ones their travel direction
    let light_dir = match light.kind {
        LightKind::Point { .. } => to_light,
        LightKind::Directional { direction } => direction,
    };
    let view = (camera.position - point).normalize();
    let reflected_light = light_dir.reflect(normal);
    let specular_factor = reflected_light.dot(view).max(0.0).powf(material.shininess);
    let specular = material.specular * light.specular * (specular_factor * attenuation);

    LightContribution {
        ambient,
        diffuse,
        specular,
        lit: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raytracing::core::{Material, SceneObject};
    use crate::raytracing::solid::{Sphere, Triangle};

    fn camera_at(position: Vec3, target: Vec3) -> Camera {
        Camera::look_at(position, target, Vec3::y_axis(), 60f64.to_radians(), 1.0, 16, 12)
    }

    fn floor(material: Material) -> SceneObject {
        // wound so that the face normal points up
        let triangle = Triangle::new(
            Vec3::new(-10.0, 0.0, 10.0),
            Vec3::new(10.0, 0.0, 10.0),
            Vec3::new(0.0, 0.0, -10.0),
        );
        SceneObject::new(triangle, material)
    }

    fn matte() -> Material {
        Material::new(Vec3::splat(0.2), Vec3::splat(0.5), Vec3::zero(), 0.0)
    }

    fn white_point_light(position: Vec3) -> Light {
        let [x, y, z] = position.into();
        Light::new([x, y, z, 1.0], Vec3::one(), Vec3::one(), Vec3::one())
    }

    fn color_of(scene: &Scene, camera: &Camera, ray: &Ray, depth: u32, background: Vec3) -> Vec3 {
        trace(scene, camera, ray, depth, background, &mut TraceStats::default())
    }

    fn white_sun() -> Light {
        Light::new([0.0, -1.0, 0.0, 0.0], Vec3::one(), Vec3::one(), Vec3::one())
    }

    #[test]
    fn miss_returns_background() {
        let scene = Scene::new(vec![], vec![white_sun()]);
        let camera = camera_at(Vec3::new(0.0, 5.0, 5.0), Vec3::zero());
        let ray = Ray::towards(Vec3::zero(), Vec3::y_axis());
        let sky = Vec3::new(0.33, 0.6, 0.75);
        assert_eq!(color_of(&scene, &camera, &ray, 3, sky), sky);
    }

    #[test]
    fn hit_without_lights_is_black() {
        let scene = Scene::new(vec![floor(matte())], vec![]);
        let camera = camera_at(Vec3::new(0.0, 5.0, 5.0), Vec3::zero());
        let ray = Ray::towards(camera.position, -camera.position);
        let color = color_of(&scene, &camera, &ray, 3, Vec3::one());
        assert_eq!(color, Vec3::zero());
    }

    #[test]
    fn occluded_point_is_ambient_only() {
        let material = Material::new(Vec3::splat(0.2), Vec3::splat(0.5), Vec3::splat(0.5), 8.0);
        let blocker = SceneObject::new(Sphere::new(Vec3::new(0.0, 2.0, 0.0), 0.5), material);
        let light = white_point_light(Vec3::new(0.0, 4.0, 0.0));
        let camera = camera_at(Vec3::new(0.0, 5.0, 5.0), Vec3::zero());
        let ray = Ray::towards(camera.position, -camera.position);

        let shadowed = Scene::new(vec![floor(material), blocker], vec![light]);
        let hit = raycast(&shadowed, &ray).expect("primary ray should reach the floor");
        assert!(std::ptr::eq(hit.hitted_object, &shadowed.objects[0]));
        let contribution = shade(&shadowed, &camera, &hit, &light, &mut TraceStats::default());
        assert!(!contribution.lit);
        assert!(contribution.ambient.approx_eq(Vec3::splat(0.2), 1e-9));
        assert_eq!(contribution.diffuse, Vec3::zero());
        assert_eq!(contribution.specular, Vec3::zero());

        let open = Scene::new(vec![floor(material)], vec![light]);
        let hit = raycast(&open, &ray).unwrap();
        let contribution = shade(&open, &camera, &hit, &light, &mut TraceStats::default());
        assert!(contribution.lit);
        // the light is straight above the hit point
        assert!(contribution.diffuse.approx_eq(Vec3::splat(0.5), 1e-6));
        // the mirrored light vector points into the floor, away from the camera
        assert_eq!(contribution.specular, Vec3::zero());
    }

    #[test]
    fn object_beyond_the_light_casts_no_shadow() {
        let beyond = SceneObject::new(Sphere::new(Vec3::new(0.0, 8.0, 0.0), 1.0), matte());
        let light = white_point_light(Vec3::new(0.0, 4.0, 0.0));
        let scene = Scene::new(vec![floor(matte()), beyond], vec![light]);
        let camera = camera_at(Vec3::new(0.0, 5.0, 5.0), Vec3::zero());
        let ray = Ray::towards(camera.position, -camera.position);

        let hit = raycast(&scene, &ray).unwrap();
        let contribution = shade(&scene, &camera, &hit, &light, &mut TraceStats::default());
        assert!(contribution.lit);
    }

    #[test]
    fn sun_is_blocked_by_an_object_above() {
        let blocker = SceneObject::new(Sphere::new(Vec3::new(0.0, 2.0, 0.0), 0.5), matte());
        let sun = white_sun();
        let scene = Scene::new(vec![floor(matte()), blocker], vec![sun]);
        let camera = camera_at(Vec3::new(0.0, 5.0, 5.0), Vec3::zero());
        let ray = Ray::towards(camera.position, -camera.position);

        let hit = raycast(&scene, &ray).unwrap();
        assert!(std::ptr::eq(hit.hitted_object, &scene.objects[0]));
        let contribution = shade(&scene, &camera, &hit, &sun, &mut TraceStats::default());
        assert!(!contribution.lit);
        assert!(contribution.ambient.approx_eq(Vec3::splat(0.2), 1e-9));
        assert_eq!(contribution.diffuse, Vec3::zero());
        assert_eq!(contribution.specular, Vec3::zero());
    }

    #[test]
    fn point_light_specular_mirrors_the_light_vector() {
        let shiny = Material::new(Vec3::splat(0.2), Vec3::splat(0.5), Vec3::one(), 1.0);
        let light = white_point_light(Vec3::new(-4.0, 4.0, 0.0));
        let scene = Scene::new(vec![floor(shiny)], vec![light]);

        // camera on the opposite side of the light: no highlight
        let camera = camera_at(Vec3::new(4.0, 4.0, 0.0), Vec3::zero());
        let ray = Ray::towards(camera.position, -camera.position);
        let hit = raycast(&scene, &ray).unwrap();
        assert!(hit.hit_point.approx_eq(Vec3::zero(), 1e-9));
        let contribution = shade(&scene, &camera, &hit, &light, &mut TraceStats::default());
        assert!(contribution.lit);
        assert_eq!(contribution.specular, Vec3::zero());

        // camera on the same side as the light, low over the floor
        let camera = camera_at(Vec3::new(-4.0, 1.0, 0.0), Vec3::zero());
        let ray = Ray::towards(camera.position, -camera.position);
        let hit = raycast(&scene, &ray).unwrap();
        assert!(hit.hit_point.approx_eq(Vec3::zero(), 1e-9));
        let contribution = shade(&scene, &camera, &hit, &light, &mut TraceStats::default());
        // reflect((-1, 1, 0) / √2, +y) · (-4, 1, 0) / √17
        let expected = 3.0 / 34f64.sqrt();
        assert!(contribution.specular.approx_eq(Vec3::splat(expected), 1e-9));
    }

    #[test]
    fn point_light_is_attenuated() {
        let light = white_point_light(Vec3::new(0.0, 4.0, 0.0)).with_attenuation(1.0, 0.0, 1.0);
        let scene = Scene::new(vec![floor(matte())], vec![light]);
        let camera = camera_at(Vec3::new(0.0, 5.0, 5.0), Vec3::zero());
        let ray = Ray::towards(camera.position, -camera.position);

        let hit = raycast(&scene, &ray).unwrap();
        let contribution = shade(&scene, &camera, &hit, &light, &mut TraceStats::default());
        let attenuation = 1.0 / 17.0;
        assert!(contribution.ambient.approx_eq(Vec3::splat(0.2 * attenuation), 1e-6));
        assert!(contribution.diffuse.approx_eq(Vec3::splat(0.5 * attenuation), 1e-6));
    }

    #[test]
    fn ambient_is_averaged_while_diffuse_is_summed() {
        let scene = Scene::new(vec![floor(matte())], vec![white_sun(), white_sun()]);
        let camera = camera_at(Vec3::new(0.0, 5.0, 5.0), Vec3::zero());
        let ray = Ray::towards(camera.position, -camera.position);

        let color = color_of(&scene, &camera, &ray, 0, Vec3::zero());
        // (0.2 + 0.2) / 2 ambient + 0.5 + 0.5 diffuse, the material has no specular
        assert!(color.approx_eq(Vec3::splat(1.2), 1e-6));
    }

    fn mirror_box() -> Scene {
        let mirror = Material::new(Vec3::splat(0.1), Vec3::splat(0.3), Vec3::splat(0.3), 64.0);
        let back = Triangle::new(
            Vec3::new(-10.0, -10.0, -5.0),
            Vec3::new(10.0, -10.0, -5.0),
            Vec3::new(0.0, 10.0, -5.0),
        );
        let front = Triangle::new(
            Vec3::new(-10.0, -10.0, 5.0),
            Vec3::new(0.0, 10.0, 5.0),
            Vec3::new(10.0, -10.0, 5.0),
        );
        Scene::new(
            vec![SceneObject::new(back, mirror), SceneObject::new(front, mirror)],
            vec![white_point_light(Vec3::zero())],
        )
    }

    #[test]
    fn depth_zero_spawns_no_reflection() {
        let scene = mirror_box();
        let camera = camera_at(Vec3::zero(), Vec3::new(0.0, 0.0, -1.0));
        let ray = Ray::towards(Vec3::zero(), Vec3::new(0.0, 0.0, -1.0));

        let mut stats = TraceStats::default();
        let color = trace(&scene, &camera, &ray, 0, Vec3::zero(), &mut stats);
        // one primary ray and one shadow ray
        assert_eq!(stats, TraceStats { rays: 2, deepest_bounce: 0 });

        let hit = raycast(&scene, &ray).unwrap();
        let local = shade(&scene, &camera, &hit, &scene.lights[0], &mut TraceStats::default());
        assert!(color.approx_eq(local.ambient + local.diffuse + local.specular, 1e-12));
    }

    #[test]
    fn mirror_box_recursion_is_bounded_by_depth() {
        let scene = mirror_box();
        let camera = camera_at(Vec3::zero(), Vec3::new(0.0, 0.0, -1.0));
        let ray = Ray::towards(Vec3::zero(), Vec3::new(0.0, 0.0, -1.0));

        for depth in 1..=5 {
            let mut stats = TraceStats::default();
            trace(&scene, &camera, &ray, depth, Vec3::zero(), &mut stats);
            assert_eq!(stats.deepest_bounce, depth);
            // each nested call casts its own ray plus one shadow ray
            assert_eq!(stats.rays, 2 * (depth as u64 + 1));
        }
    }

    #[test]
    fn reflection_adds_light() {
        let scene = mirror_box();
        let camera = camera_at(Vec3::zero(), Vec3::new(0.0, 0.0, -1.0));
        let ray = Ray::towards(Vec3::zero(), Vec3::new(0.0, 0.0, -1.0));

        let local = color_of(&scene, &camera, &ray, 0, Vec3::zero());
        let mirrored = color_of(&scene, &camera, &ray, 2, Vec3::zero());
        assert!(mirrored.x > local.x);
    }
}
