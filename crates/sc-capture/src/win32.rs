mod d3d11;
mod duplication;
mod monitor;

pub use duplication::{DxgiBackend, DxgiSession};
