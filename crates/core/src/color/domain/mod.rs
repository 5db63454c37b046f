pub mod color_transform;
