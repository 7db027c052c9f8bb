pub mod common;
pub mod forces;
pub mod formation;
pub mod goal;
pub mod sim_provider;
pub mod traits;
pub mod voronoi;

pub use common::{AgentId, ClampPolicy, Vec2, VelocityCommand};
pub use formation::FormationPattern;
pub use sim_provider::KinematicProvider;
pub use traits::{IStateProvider, ProviderError};
