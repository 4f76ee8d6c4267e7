//! Core model types shared by every view: the canonical cuboid and the
//! store that owns the collection, the selection and the copy buffer.

mod model;
mod store;

pub use model::{BoxError, BoxId, Footprint, OrientedBox3D, Point2, Point3, ZRange};
pub use store::{BoxStore, Selection, StoreError};
