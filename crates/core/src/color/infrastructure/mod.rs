pub mod colorspace_transform;
