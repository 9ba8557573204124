//! Fixtures shared by the unit tests.

mod image;

pub(crate) use image::{ImageBuilder, TypeSpec};
