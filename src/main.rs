//! Binary entry point. All setup, event handling, and rendering is managed
//! by [`particle_lab::app`].

fn main() {
    particle_lab::app::run();
}
