use super::{Ray, Vec3};

/// Below this magnitude the ray is considered parallel to the triangle plane.
const PARALLEL_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub t: f64,
    pub point: Vec3,
    pub normal: Vec3,
}

pub trait Intersect {
    /// Returns the closest intersection strictly in front of the ray origin (`t > 0`).
    fn intersect(&self, ray: &Ray) -> Option<Hit>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Solid {
    Sphere(Sphere),
    Triangle(Triangle),
}

impl Sphere {
    pub fn new(center: Vec3, radius: f64) -> Sphere {
        Sphere { center, radius }
    }

    fn hit_at(&self, ray: &Ray, t: f64) -> Hit {
        let point = ray.at(t);
        Hit {
            t,
            point,
            normal: (point - self.center).normalize(),
        }
    }
}

impl Intersect for Sphere {
    fn intersect(&self, ray: &Ray) -> Option<Hit> {
        // the direction is unit length, so the quadratic simplifies to t² + 2bt + c = 0
        let m = ray.origin - self.center;
        let b = m.dot(ray.direction);
        let c = m.dot(m) - self.radius * self.radius;
        let discriminant = b * b - c;

        if discriminant < 0.0 {
            return None;
        }

        if discriminant == 0.0 {
            let t = -b;
            return (t > 0.0).then(|| self.hit_at(ray, t));
        }

        let root = discriminant.sqrt();
        let t1 = -b + root;
        let t2 = -b - root;
        let t = match (t1 > 0.0, t2 > 0.0) {
            (false, false) => return None,
            // the origin is inside the sphere, only the exit point is in front of us
            (true, false) => t1,
            (false, true) => t2,
            (true, true) => t1.min(t2),
        };
        Some(self.hit_at(ray, t))
    }
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Triangle {
        Triangle { a, b, c }
    }

    /// True when the three vertices are (nearly) collinear.
    pub fn is_degenerate(&self) -> bool {
        (self.b - self.a).cross(self.c - self.a).squared_len() < PARALLEL_EPSILON
    }
}

impl Intersect for Triangle {
    fn intersect(&self, ray: &Ray) -> Option<Hit> {
        // Cramer's rule on P + t·d = A + u·(B - A) + v·(C - A)
        let ab = self.b - self.a;
        let ac = self.c - self.a;
        let ap = ray.origin - self.a;
        let n = ab.cross(ac);
        let e = (-ray.direction).cross(ap);
        let f = (-ray.direction).dot(n);

        // f <= 0 covers both rays parallel to the plane and back faces:
        // triangles are one-sided and only visible from the side their winding faces
        if f <= PARALLEL_EPSILON {
            return None;
        }

        let t = ap.dot(n) / f;
        if t <= 0.0 {
            return None;
        }
        let u = ac.dot(e) / f;
        let v = (-ab).dot(e) / f;
        if u <= 0.0 || v <= 0.0 || u + v > 1.0 {
            return None;
        }

        Some(Hit {
            t,
            point: ray.at(t),
            normal: n.normalize(),
        })
    }
}

impl Intersect for Solid {
    fn intersect(&self, ray: &Ray) -> Option<Hit> {
        match self {
            Solid::Sphere(sphere) => sphere.intersect(ray),
            Solid::Triangle(triangle) => triangle.intersect(ray),
        }
    }
}

impl From<Sphere> for Solid {
    fn from(value: Sphere) -> Self {
        Solid::Sphere(value)
    }
}

impl From<Triangle> for Solid {
    fn from(value: Triangle) -> Self {
        Solid::Triangle(value)
    }
}
