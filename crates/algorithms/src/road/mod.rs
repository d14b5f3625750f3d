//! Road-network generalization passes and the shared working-set types.

mod crossroads;
mod culdesacs;
mod dual_carriageway;
mod merge;
mod network;
mod roundabouts;

pub use crossroads::{remove_crossroads, RemoveCrossroads, RemoveCrossroadsParams};
pub use culdesacs::{remove_culdesacs, RemoveCuldesacs, RemoveCuldesacsParams};
pub use dual_carriageway::{
    collapse_dual_carriageways, CollapseDualCarriageways, CollapseDualCarriagewaysParams,
};
pub use merge::merge_lines;
pub use network::{IndexEntry, Road, RoadNetwork};
pub use roundabouts::{remove_roundabouts, RemoveRoundabouts, RemoveRoundaboutsParams};
