//! Renderable objects and their materials

use glam::Vec3;

/// Geometry of a scene object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum ObjectKind {
    /// Placeholder slot, skipped by the raytracer
    #[default]
    None = 0,
    Sphere = 1,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 2] = [ObjectKind::None, ObjectKind::Sphere];

    pub fn label(&self) -> &'static str {
        match self {
            ObjectKind::None => "None",
            ObjectKind::Sphere => "Sphere",
        }
    }

    /// Tag understood by the raytracing shader
    pub fn gpu_tag(&self) -> u32 {
        *self as u32
    }
}

/// Surface response of a scene object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum MaterialKind {
    /// Absorbs every ray that hits it
    #[default]
    None = 0,
    /// Diffuse
    Lambertian = 1,
    /// Specular reflector with optional fuzz
    Metal = 2,
    /// Refractive, e.g. glass
    Dielectric = 3,
}

impl MaterialKind {
    pub const ALL: [MaterialKind; 4] = [
        MaterialKind::None,
        MaterialKind::Lambertian,
        MaterialKind::Metal,
        MaterialKind::Dielectric,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MaterialKind::None => "None",
            MaterialKind::Lambertian => "Lambertian",
            MaterialKind::Metal => "Metal",
            MaterialKind::Dielectric => "Dielectric",
        }
    }

    pub fn gpu_tag(&self) -> u32 {
        *self as u32
    }

    /// Whether `albedo` affects the shading of this material
    pub fn uses_albedo(&self) -> bool {
        matches!(self, MaterialKind::Lambertian | MaterialKind::Metal)
    }
}

/// Material parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub kind: MaterialKind,
    /// RGB reflectance in [0, 1]
    pub albedo: Vec3,
    /// Metal roughness in [0, 1]
    pub fuzz: f32,
    /// Dielectric index of refraction
    pub refraction_index: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            kind: MaterialKind::None,
            albedo: Vec3::splat(0.5),
            fuzz: 0.0,
            refraction_index: 1.5,
        }
    }
}

impl Material {
    pub fn lambertian(albedo: Vec3) -> Self {
        Self {
            kind: MaterialKind::Lambertian,
            albedo,
            ..Default::default()
        }
    }

    pub fn metal(albedo: Vec3, fuzz: f32) -> Self {
        Self {
            kind: MaterialKind::Metal,
            albedo,
            fuzz: fuzz.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    pub fn dielectric(refraction_index: f32) -> Self {
        Self {
            kind: MaterialKind::Dielectric,
            albedo: Vec3::ONE,
            refraction_index,
            ..Default::default()
        }
    }
}

/// A single object of the scene.
///
/// A negative `radius` turns the surface normals inward, which the
/// raytracer uses for hollow glass shells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneObject {
    pub kind: ObjectKind,
    pub position: Vec3,
    pub radius: f32,
    pub material: Material,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            kind: ObjectKind::None,
            position: Vec3::ZERO,
            radius: 0.5,
            material: Material::default(),
        }
    }
}

impl SceneObject {
    pub fn sphere(position: Vec3, radius: f32, material: Material) -> Self {
        Self {
            kind: ObjectKind::Sphere,
            position,
            radius,
            material,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_tags_are_stable() {
        assert_eq!(ObjectKind::None.gpu_tag(), 0);
        assert_eq!(ObjectKind::Sphere.gpu_tag(), 1);
        assert_eq!(MaterialKind::None.gpu_tag(), 0);
        assert_eq!(MaterialKind::Lambertian.gpu_tag(), 1);
        assert_eq!(MaterialKind::Metal.gpu_tag(), 2);
        assert_eq!(MaterialKind::Dielectric.gpu_tag(), 3);
    }

    #[test]
    fn metal_fuzz_is_clamped() {
        assert_eq!(Material::metal(Vec3::ONE, 3.0).fuzz, 1.0);
        assert_eq!(Material::metal(Vec3::ONE, -1.0).fuzz, 0.0);
    }

    #[test]
    fn default_object_is_an_empty_slot() {
        let object = SceneObject::default();
        assert_eq!(object.kind, ObjectKind::None);
        assert_eq!(object.material.kind, MaterialKind::None);
        assert!(object.radius > 0.0);
    }
}
