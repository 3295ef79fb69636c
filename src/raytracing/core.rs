use super::solid::{Intersect, Solid};
use super::{Ray, Vec3};

/// Offset applied along the surface normal before casting secondary rays (shadow acne).
pub const EPSILON: f64 = 1e-3;

pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub lights: Vec<Light>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Point { position: Vec3 },
    /// The light travels along `direction` (unit length).
    Directional { direction: Vec3 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    // attenuation coefficients, only meaningful for point lights
    pub constant: f64,
    pub linear: f64,
    pub quadratic: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: f64,
}

#[derive(Debug)]
pub struct SceneObject {
    pub solid: Solid,
    pub material: Material,
}

pub struct RaycastResult<'a> {
    pub incoming_ray: Ray,
    pub t: f64,
    pub hitted_object: &'a SceneObject,
    pub hit_point: Vec3,
    pub normal: Vec3,
}

impl Light {
    /// Builds a light from a homogeneous position: `w == 0` is a directional light
    /// travelling along `(x, y, z)`, anything else a point light at `(x, y, z)`.
    pub fn new(position: [f64; 4], ambient: Vec3, diffuse: Vec3, specular: Vec3) -> Light {
        let [x, y, z, w] = position;
        let kind = if w == 0.0 {
            LightKind::Directional {
                direction: Vec3::new(x, y, z).normalize(),
            }
        } else {
            LightKind::Point {
                position: Vec3::new(x, y, z),
            }
        };
        Light {
            kind,
            ambient,
            diffuse,
            specular,
            constant: 1.0,
            linear: 0.0,
            quadratic: 0.0,
        }
    }

    pub fn with_attenuation(mut self, constant: f64, linear: f64, quadratic: f64) -> Light {
        self.constant = constant;
        self.linear = linear;
        self.quadratic = quadratic;
        self
    }

    /// Distance falloff for a point at `distance` from a point light.
    pub fn attenuation(&self, distance: f64) -> f64 {
        match self.kind {
            LightKind::Point { .. } => {
                1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
            }
            LightKind::Directional { .. } => 1.0,
        }
    }
}

impl Material {
    pub fn new(ambient: Vec3, diffuse: Vec3, specular: Vec3, shininess: f64) -> Material {
        Material {
            ambient,
            diffuse,
            specular,
            shininess,
        }
    }

    /// Weight of the mirror contribution.
    pub fn reflectivity(&self) -> f64 {
        self.shininess / 128.0
    }
}

impl SceneObject {
    pub fn new(solid: impl Into<Solid>, material: Material) -> SceneObject {
        SceneObject {
            solid: solid.into(),
            material,
        }
    }
}

impl Scene {
    pub fn new(objects: Vec<SceneObject>, lights: Vec<Light>) -> Scene {
        Scene { objects, lights }
    }
}

/// Finds the nearest object in front of the ray, scanning every object of the scene.
pub fn raycast<'a>(scene: &'a Scene, ray: &Ray) -> Option<RaycastResult<'a>> {
    let mut closest: Option<RaycastResult<'a>> = None;
    for object in &scene.objects {
        let Some(hit) = object.solid.intersect(ray) else {
            continue;
        };
        if closest.as_ref().map_or(true, |current| hit.t < current.t) {
            closest = Some(RaycastResult {
                incoming_ray: *ray,
                t: hit.t,
                hitted_object: object,
                hit_point: hit.point,
                normal: hit.normal,
            });
        }
    }
    closest
}
