//! # Roadgen Algorithms
//!
//! Road-network generalization passes for roadgen.
//!
//! ## Available Pass Categories
//!
//! - **road**: Roundabout, cul-de-sac and cross-road removal,
//!   dual-carriageway collapse
//! - **lines**: Averaging of line collections

pub mod lines;
pub mod road;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::lines::{average_linestrings, AverageLines, AverageLinesParams};
    pub use crate::road::{
        collapse_dual_carriageways, merge_lines, remove_crossroads, remove_culdesacs,
        remove_roundabouts, CollapseDualCarriageways, CollapseDualCarriagewaysParams,
        RemoveCrossroads, RemoveCrossroadsParams, RemoveCuldesacs, RemoveCuldesacsParams,
        RemoveRoundabouts, RemoveRoundaboutsParams, Road, RoadNetwork,
    };
    pub use roadgen_core::prelude::*;
}
