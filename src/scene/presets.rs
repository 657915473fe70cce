//! Built-in scenes
//!
//! Each preset replaces the whole object list and aims the camera at it.

use glam::Vec3;
use rand::Rng;

use super::object::{Material, SceneObject};

/// Built-in scene selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    /// Five spheres on a large ground sphere: diffuse, glass shell and metal
    A,
    /// Randomized field of small spheres around three large ones
    B,
}

impl Preset {
    pub const ALL: [Preset; 2] = [Preset::A, Preset::B];

    pub fn label(&self) -> &'static str {
        match self {
            Preset::A => "Preset 1",
            Preset::B => "Preset 2",
        }
    }
}

/// Camera placement that comes with a preset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetView {
    pub look_from: Vec3,
    pub look_at: Vec3,
    pub vfov: f32,
}

/// Objects and camera placement of a preset
#[derive(Debug, Clone)]
pub struct PresetScene {
    pub objects: Vec<SceneObject>,
    pub view: PresetView,
}

/// Center of the large metal sphere in preset B; small spheres keep clear of it
const PRESET_B_EXCLUSION_CENTER: Vec3 = Vec3::new(4.0, 0.2, 0.0);
const PRESET_B_EXCLUSION_RADIUS: f32 = 0.9;

pub fn build(preset: Preset, rng: &mut impl Rng) -> PresetScene {
    match preset {
        Preset::A => preset_a(),
        Preset::B => preset_b(rng),
    }
}

fn preset_a() -> PresetScene {
    let objects = vec![
        // ground
        SceneObject::sphere(
            Vec3::new(0.0, -100.5, -1.0),
            100.0,
            Material::lambertian(Vec3::new(0.8, 0.8, 0.0)),
        ),
        SceneObject::sphere(
            Vec3::new(0.0, 0.0, -1.0),
            0.5,
            Material::lambertian(Vec3::new(0.1, 0.2, 0.5)),
        ),
        SceneObject::sphere(Vec3::new(-1.0, 0.0, -1.0), 0.5, Material::dielectric(1.5)),
        // air bubble inside the glass sphere
        SceneObject::sphere(Vec3::new(-1.0, 0.0, -1.0), -0.4, Material::dielectric(1.5)),
        SceneObject::sphere(
            Vec3::new(1.0, 0.0, -1.0),
            0.5,
            Material::metal(Vec3::new(0.8, 0.6, 0.2), 0.2),
        ),
    ];

    PresetScene {
        objects,
        view: PresetView {
            look_from: Vec3::new(0.0, 0.0, 1.0),
            look_at: Vec3::ZERO,
            vfov: 90.0,
        },
    }
}

fn preset_b(rng: &mut impl Rng) -> PresetScene {
    let mut objects = vec![SceneObject::sphere(
        Vec3::new(0.0, -1000.0, 0.0),
        1000.0,
        Material::lambertian(Vec3::splat(0.5)),
    )];

    for a in -4..4 {
        for b in -4..4 {
            let choose_material: f32 = rng.gen();
            let center = Vec3::new(
                a as f32 + 0.9 * rng.gen::<f32>(),
                0.2,
                b as f32 + 0.9 * rng.gen::<f32>(),
            );

            if (center - PRESET_B_EXCLUSION_CENTER).length() <= PRESET_B_EXCLUSION_RADIUS {
                continue;
            }

            let material = if choose_material < 0.8 {
                Material::lambertian(random_color(rng, 0.0, 1.0))
            } else if choose_material < 0.95 {
                let albedo = random_color(rng, 0.5, 1.0);
                Material::metal(albedo, rng.gen_range(0.0..0.5))
            } else {
                Material::dielectric(1.5)
            };

            objects.push(SceneObject::sphere(center, 0.2, material));
        }
    }

    objects.push(SceneObject::sphere(
        Vec3::new(0.0, 1.0, 0.0),
        1.0,
        Material::dielectric(1.5),
    ));
    objects.push(SceneObject::sphere(
        Vec3::new(-4.0, 1.0, 0.0),
        1.0,
        Material::lambertian(Vec3::new(0.4, 0.2, 0.1)),
    ));
    objects.push(SceneObject::sphere(
        Vec3::new(4.0, 1.0, 0.0),
        1.0,
        Material::metal(Vec3::new(0.7, 0.6, 0.5), 0.0),
    ));

    PresetScene {
        objects,
        view: PresetView {
            look_from: Vec3::new(13.0, 2.0, 3.0),
            look_at: Vec3::ZERO,
            vfov: 20.0,
        },
    }
}

fn random_color(rng: &mut impl Rng, min: f32, max: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(min..max),
        rng.gen_range(min..max),
        rng.gen_range(min..max),
    )
}
