//! Inspector windows: camera transform, scene graph, simulation status.

use glam::Vec3;

use crate::scene::node::NodeKind;
use crate::scene::SandboxScene;

/// Draw the inspector windows for one frame.
pub fn show(ctx: &egui::Context, scene: &mut SandboxScene) {
    show_camera_window(ctx, scene);
    show_scene_graph_window(ctx, scene);
    show_simulation_window(ctx, scene);
}

fn show_camera_window(ctx: &egui::Context, scene: &mut SandboxScene) {
    egui::Window::new("Camera")
        .default_width(220.0)
        .show(ctx, |ui| {
            let mut position = scene.camera.position();
            let mut changed = false;

            egui::Grid::new("camera_position_grid")
                .num_columns(2)
                .show(ui, |ui| {
                    for (label, value) in [
                        ("X", &mut position.x),
                        ("Y", &mut position.y),
                        ("Z", &mut position.z),
                    ] {
                        ui.label(label);
                        changed |= ui
                            .add(egui::DragValue::new(value).speed(0.1))
                            .changed();
                        ui.end_row();
                    }
                });

            if changed {
                scene.camera.set_position(position);
            }

            ui.separator();
            if ui.button("Reset view").clicked() {
                scene.camera.set_position(Vec3::new(0.7, -35.0, 7.4));
            }
        });
}

fn show_scene_graph_window(ctx: &egui::Context, scene: &SandboxScene) {
    egui::Window::new("Scene Graph")
        .default_width(200.0)
        .show(ctx, |ui| {
            if scene.tree().roots().is_empty() {
                ui.label("(empty)");
                return;
            }
            for (depth, node) in scene.tree().iter() {
                let icon = match node.kind {
                    NodeKind::Mesh => "\u{25a3}",
                    NodeKind::ParticleSystem => "\u{2234}",
                    NodeKind::Group => "\u{25b8}",
                };
                ui.label(format!(
                    "{}{} {}",
                    "    ".repeat(depth),
                    icon,
                    node.name
                ));
            }
        });
}

fn show_simulation_window(ctx: &egui::Context, scene: &mut SandboxScene) {
    egui::Window::new("Simulation")
        .default_width(220.0)
        .show(ctx, |ui| {
            ui.label(format!("Particles: {}", scene.particle_count()));
            ui.label(format!("Time: {:.2} s", scene.current_time()));

            let mut paused = scene.is_paused();
            if ui.checkbox(&mut paused, "Paused").changed() {
                scene.set_paused(paused);
            }

            let mut radius = scene.particles_mut().radius;
            if ui
                .add(
                    egui::Slider::new(&mut radius, 0.02..=0.5)
                        .text("Particle radius"),
                )
                .changed()
            {
                scene.particles_mut().radius = radius;
            }
        });
}
