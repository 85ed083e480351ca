// geodrift — movement and navigation for agents on a sphere's surface.
//
// The simulation loop drives this crate synchronously every frame: register
// obstacles, ask for paths or steering targets, step positions, read them
// back. Rendering, audio, UI and the game's own scripts live elsewhere and
// only ever see positions and waypoints.

pub mod engine;

pub use engine::components::{
    AgentBehavior, AgentPath, Lifetime, Projectile, ProjectileMotion, SurfaceAgent, Transform,
};
pub use engine::coords::{cartesian_to_uv, sanitize_uv, uv_to_cartesian};
pub use engine::events::EventQueue;
pub use engine::mesh::GeodesicMesh;
pub use engine::motion::{compute_tangent_direction, move_towards};
pub use engine::navigation::{NavConfig, Navigator, ObstacleRegistry};
pub use engine::projectile::{steer_homing, step_flat};
pub use engine::systems::{agent_seek_system, lifetime_system, projectile_system};
