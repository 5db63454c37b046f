/// Host timeline the writer is rendered against.
pub trait Timeline: Send + Sync {
    /// First and last frame of the project timeline, inclusive.
    fn bounds(&self) -> (f64, f64);
}
