//! Overlay UI
//!
//! Scene, camera, preset and object panels plus a controls reference. The UI
//! edits copies of the values and writes back through the [`Scene`] only on
//! change, so an untouched panel never marks the scene dirty.

use glam::Vec3;

use crate::engine::{
    RenderSettings, LIGHT_BOUNCES_RANGE, RESOLUTION_FACTOR_RANGE, SAMPLES_PER_PIXEL_RANGE,
};
use crate::scene::{
    MaterialKind, ObjectKind, Preset, Scene, SceneObject, MAX_OBJECTS, MAX_VFOV, MIN_VFOV,
};

const MIN_RADIUS: f32 = 0.1;
const MAX_RADIUS: f32 = 100.0;

/// Requests from the UI that the session has to carry out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiActions {
    pub toggle_play: bool,
    pub preset: Option<Preset>,
}

/// Keep the sign so hollow spheres stay hollow
fn clamp_radius(radius: f32) -> f32 {
    let magnitude = radius.abs().clamp(MIN_RADIUS, MAX_RADIUS);
    if radius.is_sign_negative() {
        -magnitude
    } else {
        magnitude
    }
}

fn vec3_row(ui: &mut egui::Ui, label: &str, value: &mut Vec3) -> bool {
    ui.horizontal(|ui| {
        ui.label(label);
        let mut changed = false;
        for component in [&mut value.x, &mut value.y, &mut value.z] {
            changed |= ui
                .add(egui::DragValue::new(component).speed(0.05))
                .changed();
        }
        changed
    })
    .inner
}

/// The overlay
pub struct ViewerUi {
    pub show_tooltip: bool,
}

impl ViewerUi {
    pub fn new(show_tooltip: bool) -> Self {
        Self { show_tooltip }
    }

    /// Draw the UI for one frame
    pub fn show(
        &mut self,
        ctx: &egui::Context,
        scene: &mut Scene,
        settings: &mut RenderSettings,
    ) -> UiActions {
        let mut actions = UiActions::default();

        egui::Window::new("Raytracer")
            .default_pos([10.0, 10.0])
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    egui::CollapsingHeader::new("Scene")
                        .default_open(true)
                        .show(ui, |ui| self.scene_panel(ui, settings, &mut actions));

                    egui::CollapsingHeader::new("Camera")
                        .default_open(true)
                        .show(ui, |ui| camera_panel(ui, scene));

                    egui::CollapsingHeader::new("Presets")
                        .default_open(true)
                        .show(ui, |ui| {
                            ui.horizontal(|ui| {
                                for preset in Preset::ALL {
                                    if ui.button(preset.label()).clicked() {
                                        actions.preset = Some(preset);
                                    }
                                }
                            });
                        });

                    egui::CollapsingHeader::new("Objects")
                        .default_open(false)
                        .show(ui, |ui| objects_panel(ui, scene));
                });
            });

        if self.show_tooltip {
            controls_window(ctx, &mut self.show_tooltip);
        }

        actions
    }

    fn scene_panel(
        &mut self,
        ui: &mut egui::Ui,
        settings: &mut RenderSettings,
        actions: &mut UiActions,
    ) {
        ui.add(
            egui::Slider::new(&mut settings.light_bounces, LIGHT_BOUNCES_RANGE)
                .text("Light bounces"),
        );
        ui.add(
            egui::Slider::new(&mut settings.samples_per_pixel, SAMPLES_PER_PIXEL_RANGE)
                .text("Samples per pixel"),
        );
        ui.add(
            egui::Slider::new(&mut settings.resolution_factor, RESOLUTION_FACTOR_RANGE)
                .text("Resolution"),
        );
        ui.checkbox(&mut self.show_tooltip, "Show controls");

        if ui.button("Toggle Play Mode").clicked() {
            actions.toggle_play = true;
        }
    }
}

fn camera_panel(ui: &mut egui::Ui, scene: &mut Scene) {
    let camera = scene.camera();
    let mut move_speed = camera.move_speed();
    let mut turn_speed = camera.turn_speed();
    let mut zoom_speed = camera.zoom_speed();
    let mut look_from = camera.look_from();
    let mut look_at = camera.look_at();
    let mut vfov = camera.vfov();

    if ui
        .add(egui::Slider::new(&mut move_speed, 0.0..=0.5).text("Move speed"))
        .changed()
    {
        scene.camera_mut().set_move_speed(move_speed);
    }
    if ui
        .add(egui::Slider::new(&mut turn_speed, 0.0..=0.1).text("Mouse sensitivity"))
        .changed()
    {
        scene.camera_mut().set_turn_speed(turn_speed);
    }
    if ui
        .add(egui::Slider::new(&mut zoom_speed, 0.0..=10.0).text("Zoom sensitivity"))
        .changed()
    {
        scene.camera_mut().set_zoom_speed(zoom_speed);
    }

    if vec3_row(ui, "Position", &mut look_from) {
        scene.camera_mut().set_look_from(look_from);
    }
    if vec3_row(ui, "Target", &mut look_at) {
        scene.camera_mut().set_look_at(look_at);
    }
    if ui
        .add(egui::Slider::new(&mut vfov, MIN_VFOV..=MAX_VFOV).text("FOV"))
        .changed()
    {
        scene.camera_mut().set_vfov(vfov);
    }

    if ui.button("Reset Camera").clicked() {
        scene.camera_mut().reset();
    }
}

fn objects_panel(ui: &mut egui::Ui, scene: &mut Scene) {
    ui.label(format!("{} / {} objects", scene.len(), MAX_OBJECTS));

    let mut remove = None;
    for index in 0..scene.len() {
        let mut object = scene.objects()[index];

        ui.push_id(index, |ui| {
            ui.separator();
            ui.horizontal(|ui| {
                ui.label(format!("#{}", index));
                if ui.button("Remove").clicked() {
                    remove = Some(index);
                }
            });
            object_editor(ui, &mut object);
        });

        scene.set_object(index, object);
    }

    if let Some(index) = remove {
        scene.remove_object(index);
    }

    ui.separator();
    if ui
        .add_enabled(!scene.is_full(), egui::Button::new("Add Object"))
        .clicked()
    {
        scene.add_object();
    }
}

fn object_editor(ui: &mut egui::Ui, object: &mut SceneObject) {
    egui::ComboBox::from_id_source("kind")
        .selected_text(object.kind.label())
        .show_ui(ui, |ui| {
            for kind in ObjectKind::ALL {
                ui.selectable_value(&mut object.kind, kind, kind.label());
            }
        });

    if object.kind == ObjectKind::None {
        return;
    }

    vec3_row(ui, "Position", &mut object.position);

    let mut radius = object.radius;
    if ui
        .add(egui::DragValue::new(&mut radius).speed(0.01).prefix("Radius: "))
        .changed()
    {
        object.radius = clamp_radius(radius);
    }

    let material = &mut object.material;
    egui::ComboBox::from_id_source("material")
        .selected_text(material.kind.label())
        .show_ui(ui, |ui| {
            for kind in MaterialKind::ALL {
                ui.selectable_value(&mut material.kind, kind, kind.label());
            }
        });

    if material.kind.uses_albedo() {
        let mut albedo = material.albedo.to_array();
        ui.horizontal(|ui| {
            ui.label("Albedo");
            if ui.color_edit_button_rgb(&mut albedo).changed() {
                material.albedo = Vec3::from_array(albedo);
            }
        });
    }

    match material.kind {
        MaterialKind::Metal => {
            ui.add(egui::Slider::new(&mut material.fuzz, 0.0..=1.0).text("Fuzz"));
        }
        MaterialKind::Dielectric => {
            ui.add(
                egui::Slider::new(&mut material.refraction_index, 1.0..=3.0)
                    .text("Refraction index"),
            );
        }
        MaterialKind::None | MaterialKind::Lambertian => {}
    }
}

fn controls_window(ctx: &egui::Context, open: &mut bool) {
    egui::Window::new("Controls")
        .open(open)
        .default_pos([ctx.screen_rect().width() - 240.0, 10.0])
        .resizable(false)
        .show(ctx, |ui| {
            egui::Grid::new("controls_grid").striped(true).show(ui, |ui| {
                for (keys, action) in [
                    ("Enter", "Toggle play mode"),
                    ("Escape", "Back to edit mode"),
                    ("W / S", "Forward / backward"),
                    ("A / D", "Left / right"),
                    ("Space / LCtrl", "Up / down"),
                    ("Mouse", "Look around"),
                    ("Wheel", "Zoom"),
                    ("F", "Fullscreen"),
                    ("F5", "Reload shaders"),
                ] {
                    ui.label(keys);
                    ui.label(action);
                    ui.end_row();
                }
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_clamp_keeps_sign() {
        assert_eq!(clamp_radius(0.0), MIN_RADIUS);
        assert_eq!(clamp_radius(500.0), MAX_RADIUS);
        assert_eq!(clamp_radius(-0.4), -0.4);
        assert_eq!(clamp_radius(-0.01), -MIN_RADIUS);
        assert_eq!(clamp_radius(2.5), 2.5);
    }

    #[test]
    fn untouched_ui_leaves_scene_clean() {
        let mut rng = rand::rngs::mock::StepRng::new(0, 1);
        let mut scene = Scene::with_preset(Preset::A, &mut rng);
        scene.take_dirty();
        let mut settings = RenderSettings::default();
        let mut ui = ViewerUi::new(true);

        let ctx = egui::Context::default();
        let mut actions = UiActions::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            actions = ui.show(ctx, &mut scene, &mut settings);
        });

        assert_eq!(actions, UiActions::default());
        assert_eq!(settings, RenderSettings::default());
        assert!(!scene.is_dirty());
    }

    #[test]
    fn editor_leaves_far_ground_in_place() {
        let original = SceneObject::sphere(
            Vec3::new(0.0, -1000.0, 0.0),
            1000.0,
            crate::scene::Material::lambertian(Vec3::splat(0.5)),
        );
        let mut ground = original;

        let ctx = egui::Context::default();
        for _ in 0..2 {
            let _ = ctx.run(egui::RawInput::default(), |ctx| {
                egui::CentralPanel::default().show(ctx, |ui| object_editor(ui, &mut ground));
            });
        }

        assert_eq!(ground, original);
    }
}
